mod common;

use std::fs;
use std::path::{Path, PathBuf};

use common::{open_ledger, record};
use credit_ledger::{
    ledger::{LoadSource, TransactionKind, TransactionLedger},
    storage::{JsonFileStore, LedgerStore},
    LedgerError,
};
use serde_json::Value;
use tempfile::tempdir;

fn tmp_path_for(path: &Path) -> PathBuf {
    let mut tmp = path.to_path_buf();
    tmp.set_extension("json.tmp");
    tmp
}

#[test]
fn file_store_survives_reopen() {
    let temp = tempdir().unwrap();
    let path = temp.path().join("ledger.json");

    let mut ledger = open_ledger(JsonFileStore::new(&path));
    record(&mut ledger, TransactionKind::Charge, 50_000.0);
    record(&mut ledger, TransactionKind::Usage, 2_000.0);
    let history = ledger.history();
    drop(ledger);

    let (reopened, report) = TransactionLedger::open(Box::new(JsonFileStore::new(&path))).unwrap();
    assert_eq!(report.source, LoadSource::Store);
    assert_eq!(reopened.history(), history);
    assert_eq!(reopened.current_balance(), 48_000);
}

#[test]
fn persisted_json_uses_the_documented_layout() {
    let temp = tempdir().unwrap();
    let path = temp.path().join("ledger.json");
    let mut ledger = open_ledger(JsonFileStore::new(&path));
    ledger
        .record_transaction(
            TransactionKind::Charge,
            50_000.0,
            "충전",
            Some("pay_123".into()),
            None,
        )
        .unwrap();

    let json: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(json["balance"], 50_000);
    assert_eq!(json["lastChargeAmount"], 50_000);
    assert_eq!(json["lastChargeDate"], "2025-01-05T09:30:00.000Z");
    assert_eq!(json["paymentMethod"], "card");
    let txn = &json["transactions"][0];
    assert_eq!(txn["type"], "charge");
    assert_eq!(txn["amount"], 50_000);
    assert_eq!(txn["balance"], 50_000);
    assert_eq!(txn["referenceId"], "pay_123");
    assert!(txn.get("metadata").is_none());
}

#[test]
fn failed_write_keeps_previous_file_and_memory_in_sync() {
    let temp = tempdir().unwrap();
    let path = temp.path().join("ledger.json");
    let mut ledger = open_ledger(JsonFileStore::new(&path));
    record(&mut ledger, TransactionKind::Charge, 1_000.0);
    let original = fs::read_to_string(&path).unwrap();

    // A directory at the staging path makes File::create fail.
    fs::create_dir_all(tmp_path_for(&path)).unwrap();
    let err = ledger
        .record_transaction(TransactionKind::Charge, 500.0, "blocked", None, None)
        .unwrap_err();

    assert!(matches!(err, LedgerError::PersistenceFailure(_)));
    assert_eq!(fs::read_to_string(&path).unwrap(), original);
    assert_eq!(ledger.len(), 1);
    assert_eq!(ledger.current_balance(), 1_000);
}

#[test]
fn legacy_file_is_repaired_on_load() {
    let temp = tempdir().unwrap();
    let path = temp.path().join("ledger.json");
    fs::write(
        &path,
        r#"{
            "balance": 9999,
            "lastChargeDate": "",
            "lastChargeAmount": 0,
            "paymentMethod": "card",
            "transactions": [
                { "id": "1736069400000_a1b2c3", "type": "usage", "amount": 2000,
                  "timestamp": "2025-01-05T10:00:00.000Z", "description": "사용" },
                { "id": "1736066000000_d4e5f6", "type": "charge", "amount": 50000,
                  "timestamp": "2025-01-05T09:00:00.000Z", "description": "충전",
                  "metadata": { "paymentMethod": "bank", "isReward": false } }
            ]
        }"#,
    )
    .unwrap();

    let (ledger, report) = TransactionLedger::open(Box::new(JsonFileStore::new(&path))).unwrap();

    assert_eq!(ledger.current_balance(), 48_000);
    let history = ledger.history();
    assert_eq!(history[0].amount, -2_000);
    assert_eq!(history[0].balance, 48_000);
    assert_eq!(history[1].balance, 50_000);
    assert_eq!(ledger.payment_method(), "bank");
    assert_eq!(ledger.last_charge().map(|c| c.amount), Some(50_000));
    assert!(report
        .warnings
        .iter()
        .any(|warning| warning.contains("normalized to -2000")));
}

#[test]
fn malformed_file_is_a_persistence_failure() {
    let temp = tempdir().unwrap();
    let path = temp.path().join("ledger.json");
    fs::write(&path, "{ \"transactions\": [ { \"type\": \"reserve\" } ] }").unwrap();

    let result = TransactionLedger::open(Box::new(JsonFileStore::new(&path)));
    assert!(matches!(result, Err(LedgerError::PersistenceFailure(_))));
}

#[test]
fn reset_removes_the_file() {
    let temp = tempdir().unwrap();
    let path = temp.path().join("ledger.json");
    let store = JsonFileStore::new(&path);
    let mut ledger = open_ledger(store.clone());
    record(&mut ledger, TransactionKind::Charge, 1_000.0);
    assert!(path.exists());

    ledger.reset().unwrap();
    assert!(!path.exists());
    assert!(store.load().unwrap().is_none());
}
