//! Default lock policy: the caller, or the procedure name when anonymous.

use guarded_rust::cache::InMemoryCache;
use guarded_rust::lock::LockService;
use guarded_rust::microsvc::{Context, HandlerError, Session};
use guarded_rust::procedure::{AnonymousPrincipal, Guard, LockableProcedure};
use serde_json::json;

use crate::handlers::audit_record::AuditRecord;
use crate::support::{bank_service, bank_service_with, names, zero_wait_locks, Bank};

#[test]
fn procedure_name_is_the_canonical_type_path() {
    let name = LockableProcedure::<Bank>::procedure_name(&AuditRecord);
    assert!(name.ends_with("handlers_audit_record_AuditRecord"), "{name}");
    assert!(!name.contains("::"));
}

#[test]
fn authenticated_calls_lock_on_the_user() {
    let locks = zero_wait_locks();
    let service = bank_service_with(Bank::new(), &locks);
    let _held = locks.acquire(&names(&["user-1"])).unwrap();

    let blocked = service.dispatch("audit.record", json!({ "entry": "a" }), Session::for_user("user-1"));
    assert!(matches!(blocked, Err(HandlerError::TryAgain { .. })));

    let other = service
        .dispatch("audit.record", json!({ "entry": "b" }), Session::for_user("user-2"))
        .unwrap();
    assert_eq!(other, json!({ "recorded": "b" }));
    assert_eq!(service.state().audit_log(), vec!["b"]);
}

#[test]
fn anonymous_calls_lock_on_the_procedure() {
    let locks = zero_wait_locks();
    let service = bank_service_with(Bank::new(), &locks);
    let name = LockableProcedure::<Bank>::procedure_name(&AuditRecord);
    let _held = locks.acquire(&[name]).unwrap();

    let blocked = service.dispatch("audit.record", json!({ "entry": "a" }), Session::new());
    assert!(matches!(blocked, Err(HandlerError::TryAgain { .. })));

    let authenticated = service.dispatch("audit.record", json!({ "entry": "b" }), Session::for_user("user-1"));
    assert!(authenticated.is_ok());
}

#[test]
fn blank_user_id_counts_as_anonymous() {
    let guard = Guard::in_memory();
    let bank = Bank::new();
    let ctx = Context::new("audit.record", json!({ "entry": "a" }), Session::for_user(""), &bank);

    let resources = guard.resolve(&AuditRecord, &ctx);
    assert_eq!(resources, vec![LockableProcedure::<Bank>::procedure_name(&AuditRecord)]);
}

#[test]
fn resolver_can_ignore_the_session() {
    let locks = zero_wait_locks();
    let service = bank_service(
        Bank::new(),
        Guard::new(locks.clone(), InMemoryCache::new()).principal(AnonymousPrincipal),
    );
    let name = LockableProcedure::<Bank>::procedure_name(&AuditRecord);
    let _held = locks.acquire(&[name]).unwrap();

    let blocked = service.dispatch("audit.record", json!({ "entry": "a" }), Session::for_user("user-1"));
    assert!(matches!(blocked, Err(HandlerError::TryAgain { .. })));
}

#[test]
fn deposit_locks_account_and_caller() {
    let guard = Guard::in_memory();
    let bank = Bank::new();
    let ctx = Context::new(
        "account.deposit",
        json!({ "account": "acc-1", "amount": 1 }),
        Session::for_user("user-1"),
        &bank,
    );

    let resources = guard.resolve(&crate::handlers::account_deposit::Deposit, &ctx);
    assert_eq!(resources, vec!["acc-1", "user-1"]);

    let anonymous = Context::new("account.deposit", json!({ "account": "acc-1" }), Session::new(), &bank);
    assert_eq!(guard.resolve(&crate::handlers::account_deposit::Deposit, &anonymous), vec!["acc-1"]);
}
