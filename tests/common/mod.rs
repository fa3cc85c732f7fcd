#![allow(dead_code)]

use chrono::{DateTime, Duration, TimeZone, Utc};
use credit_ledger::{
    ledger::{LedgerOptions, SteppingClock, TransactionKind, TransactionLedger},
    storage::{LedgerStore, MemoryStore},
};

/// First timestamp handed out by the test clock.
pub fn epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 5, 9, 30, 0).unwrap()
}

/// Options with a clock that advances one second per transaction.
pub fn stepping_options() -> LedgerOptions {
    LedgerOptions::default().with_clock(SteppingClock::new(epoch(), Duration::seconds(1)))
}

pub fn open_ledger(store: impl LedgerStore + 'static) -> TransactionLedger {
    let (ledger, _report) =
        TransactionLedger::open_with(Box::new(store), stepping_options()).expect("open ledger");
    ledger
}

/// Ledger over a fresh in-memory store, plus a handle to that store.
pub fn memory_ledger() -> (TransactionLedger, MemoryStore) {
    let store = MemoryStore::new();
    (open_ledger(store.clone()), store)
}

pub fn record(ledger: &mut TransactionLedger, kind: TransactionKind, amount: f64) {
    ledger
        .record_transaction(kind, amount, kind.as_str(), None, None)
        .expect("record transaction");
}
