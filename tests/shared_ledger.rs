mod common;

use std::thread;

use common::memory_ledger;
use credit_ledger::{ledger::TransactionKind, SharedLedger};

#[test]
fn concurrent_debits_never_overdraw() {
    let (mut ledger, store) = memory_ledger();
    ledger
        .record_transaction(TransactionKind::Charge, 10_000.0, "충전", None, None)
        .unwrap();
    let shared = SharedLedger::new(ledger);

    let workers: Vec<_> = (0..8)
        .map(|worker| {
            let shared = shared.clone();
            thread::spawn(move || {
                let mut accepted: i64 = 0;
                for _ in 0..10 {
                    let result = shared.record_transaction(
                        TransactionKind::Usage,
                        300.0,
                        format!("worker {worker}"),
                        None,
                        None,
                    );
                    match result {
                        Ok(_) => accepted += 1,
                        Err(err) => assert!(err.is_insufficient_balance()),
                    }
                }
                accepted
            })
        })
        .collect();

    let accepted: i64 = workers
        .into_iter()
        .map(|handle| handle.join().expect("worker panicked"))
        .sum();

    // 10_000 / 300 = 33 debits fit.
    assert_eq!(accepted, 33);
    let balance = shared.current_balance().unwrap();
    assert_eq!(balance, 10_000 - 33 * 300);
    assert!(balance >= 0);

    let history = shared.history().unwrap();
    assert_eq!(history.len(), 34);
    assert_eq!(history.iter().map(|txn| txn.amount).sum::<i64>(), balance);
    assert_eq!(store.save_count(), 34);
}

#[test]
fn with_gives_exclusive_access() {
    let (ledger, _store) = memory_ledger();
    let shared = SharedLedger::from(ledger);
    let count = shared
        .with(|ledger| {
            ledger
                .record_transaction(TransactionKind::Refund, 1_500.0, "환불", None, None)
                .map(|_| ledger.len())
        })
        .unwrap()
        .unwrap();
    assert_eq!(count, 1);

    let page = shared.history_page(5, 0).unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.transactions[0].amount, 1_500);
}
