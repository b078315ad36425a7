//! Duplicate requests replay the cached result instead of re-executing.

use guarded_rust::cache::{CacheStore, InMemoryCache};
use guarded_rust::microsvc::Session;
use guarded_rust::procedure::{Guard, GuardConfig};
use serde_json::json;

use crate::support::{bank_service, zero_wait_locks, Bank, ReadOnlyCache};

fn deposit(request_id: Option<&str>) -> serde_json::Value {
    let mut input = json!({ "account": "acc-1", "amount": 10 });
    if let Some(id) = request_id {
        input["request_id"] = json!(id);
    }
    input
}

#[test]
fn duplicate_request_applies_once() {
    let service = bank_service(Bank::new(), Guard::in_memory());

    let first = service.dispatch("account.deposit", deposit(Some("r-1")), Session::new()).unwrap();
    let second = service.dispatch("account.deposit", deposit(Some("r-1")), Session::new()).unwrap();

    assert_eq!(first, json!({ "account": "acc-1", "balance": 10 }));
    assert_eq!(second, first);
    assert_eq!(service.state().balance("acc-1"), 10);
    assert_eq!(service.state().executions(), 1);
}

#[test]
fn distinct_requests_apply_separately() {
    let service = bank_service(Bank::new(), Guard::in_memory());

    service.dispatch("account.deposit", deposit(Some("r-1")), Session::new()).unwrap();
    let second = service.dispatch("account.deposit", deposit(Some("r-2")), Session::new()).unwrap();

    assert_eq!(second, json!({ "account": "acc-1", "balance": 20 }));
    assert_eq!(service.state().executions(), 2);
}

#[test]
fn requests_without_key_always_execute() {
    let service = bank_service(Bank::new(), Guard::in_memory());

    service.dispatch("account.deposit", deposit(None), Session::new()).unwrap();
    service.dispatch("account.deposit", deposit(None), Session::new()).unwrap();

    assert_eq!(service.state().balance("acc-1"), 20);
}

#[test]
fn keys_are_scoped_per_command() {
    let service = bank_service(Bank::new(), Guard::in_memory());

    service.dispatch("account.deposit", deposit(Some("r-1")), Session::new()).unwrap();
    let withdrawn = service
        .dispatch(
            "account.withdraw",
            json!({ "account": "acc-1", "amount": 4, "request_id": "r-1" }),
            Session::new(),
        )
        .unwrap();

    assert_eq!(withdrawn, json!({ "account": "acc-1", "balance": 6 }));
}

#[test]
fn failed_requests_are_not_cached() {
    let service = bank_service(Bank::new(), Guard::in_memory());
    let overdraw = json!({ "account": "acc-1", "amount": 5, "request_id": "w-1" });

    assert!(service.dispatch("account.withdraw", overdraw.clone(), Session::new()).is_err());
    service.dispatch("account.deposit", deposit(None), Session::new()).unwrap();

    let result = service.dispatch("account.withdraw", overdraw, Session::new()).unwrap();
    assert_eq!(result, json!({ "account": "acc-1", "balance": 5 }));
}

#[test]
fn result_written_by_another_node_is_replayed() {
    let cache = InMemoryCache::new();
    let service = bank_service(Bank::new(), Guard::new(zero_wait_locks(), cache.clone()));
    cache
        .set("account.deposit:r-9", json!({ "account": "acc-1", "balance": 99 }), guarded_rust::cache::DEFAULT_TTL)
        .unwrap();

    let result = service.dispatch("account.deposit", deposit(Some("r-9")), Session::new()).unwrap();
    assert_eq!(result, json!({ "account": "acc-1", "balance": 99 }));
    assert_eq!(service.state().executions(), 0);
}

#[test]
fn expired_results_execute_again() {
    let guard = Guard::in_memory();
    let service = guarded_rust::register_procedures!(
        guarded_rust::microsvc::Service::new(Bank::new()).with_guard(guard.config(GuardConfig {
            cache_ttl_secs: 0,
            ..GuardConfig::default()
        })),
        crate::handlers::account_deposit,
    );

    service.dispatch("account.deposit", deposit(Some("r-1")), Session::new()).unwrap();
    service.dispatch("account.deposit", deposit(Some("r-1")), Session::new()).unwrap();
    assert_eq!(service.state().balance("acc-1"), 20);
}

#[test]
fn cache_write_failure_still_answers() {
    let service = bank_service(Bank::new(), Guard::new(zero_wait_locks(), ReadOnlyCache::default()));

    let first = service.dispatch("account.deposit", deposit(Some("r-1")), Session::new()).unwrap();
    assert_eq!(first, json!({ "account": "acc-1", "balance": 10 }));

    // nothing was stored, so the duplicate runs again
    service.dispatch("account.deposit", deposit(Some("r-1")), Session::new()).unwrap();
    assert_eq!(service.state().balance("acc-1"), 20);
}
