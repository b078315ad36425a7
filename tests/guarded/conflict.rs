//! Lock contention between concurrent requests.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use guarded_rust::lock::LockService;
use guarded_rust::microsvc::{HandlerError, Session};
use guarded_rust::LockError;
use serde_json::json;

use crate::support::{bank_service_with, blocking_locks, names, zero_wait_locks, Bank};

#[test]
fn concurrent_deposits_to_one_account_serialize() {
    let locks = blocking_locks();
    let service = Arc::new(bank_service_with(Bank::with_delay(Duration::from_millis(5)), &locks));

    let workers: Vec<_> = (0..8)
        .map(|_| {
            let service = service.clone();
            thread::spawn(move || {
                service
                    .dispatch("account.deposit", json!({ "account": "acc-1", "amount": 1 }), Session::new())
                    .unwrap();
            })
        })
        .collect();
    for worker in workers {
        worker.join().unwrap();
    }

    assert_eq!(service.state().balance("acc-1"), 8);
    assert_eq!(service.state().max_in_flight(), 1);
}

#[test]
fn held_resource_asks_caller_to_try_again() {
    let locks = zero_wait_locks();
    let service = bank_service_with(Bank::new(), &locks);
    let _held = locks.acquire(&names(&["acc-1"])).unwrap();

    let result = service.dispatch("account.withdraw", json!({ "account": "acc-1", "amount": 1 }), Session::new());

    let err = result.unwrap_err();
    assert_eq!(err.to_string(), "account busy, retry");
    assert_eq!(err.status_code(), 429);
    assert!(matches!(
        err,
        HandlerError::TryAgain { source: LockError::Conflicted { .. }, .. }
    ));
    assert_eq!(service.state().executions(), 0);
}

#[test]
fn any_held_resource_blocks_the_whole_set() {
    let locks = zero_wait_locks();
    let service = bank_service_with(Bank::new(), &locks);
    // deposit locks on the account and the caller
    let _held = locks.acquire(&names(&["user-1"])).unwrap();

    let result = service.dispatch(
        "account.deposit",
        json!({ "account": "acc-2", "amount": 1 }),
        Session::for_user("user-1"),
    );
    assert!(matches!(result, Err(HandlerError::TryAgain { .. })));

    // the account lock taken before the conflict was rolled back
    let account = locks.acquire(&names(&["acc-2"]));
    assert!(account.is_ok());
}

#[test]
fn different_accounts_do_not_contend() {
    let locks = zero_wait_locks();
    let service = bank_service_with(Bank::new(), &locks);
    let _held = locks.acquire(&names(&["acc-1"])).unwrap();

    let result = service
        .dispatch("account.deposit", json!({ "account": "acc-2", "amount": 3 }), Session::new())
        .unwrap();
    assert_eq!(result, json!({ "account": "acc-2", "balance": 3 }));
}

#[test]
fn duplicate_in_flight_is_refused_then_replayed() {
    let locks = zero_wait_locks();
    let service = Arc::new(bank_service_with(Bank::with_delay(Duration::from_millis(200)), &locks));
    let input = json!({ "account": "acc-1", "amount": 10, "request_id": "r-1" });

    let first = {
        let service = service.clone();
        let input = input.clone();
        thread::spawn(move || service.dispatch("account.deposit", input, Session::new()))
    };

    // let the first request take the lock
    thread::sleep(Duration::from_millis(50));
    let duplicate = service.dispatch("account.deposit", input.clone(), Session::new());
    assert!(matches!(duplicate, Err(HandlerError::TryAgain { .. })));

    let first = first.join().unwrap().unwrap();
    let retried = service.dispatch("account.deposit", input, Session::new()).unwrap();
    assert_eq!(retried, first);
    assert_eq!(service.state().executions(), 1);
}

#[test]
fn lock_is_released_after_rejection() {
    let locks = zero_wait_locks();
    let service = bank_service_with(Bank::new(), &locks);

    let result = service.dispatch("account.withdraw", json!({ "account": "acc-1", "amount": 1 }), Session::new());
    assert!(matches!(result, Err(HandlerError::Rejected(_))));

    assert!(locks.acquire(&names(&["acc-1"])).is_ok());
}
