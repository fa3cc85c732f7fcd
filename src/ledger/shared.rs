use std::sync::{Arc, Mutex, MutexGuard};

use super::{
    ledger::{HistoryPage, TransactionLedger},
    transaction::{Metadata, Transaction, TransactionKind},
};
use crate::errors::{LedgerError, Result};

/// Cloneable handle that serializes every ledger operation behind one mutex.
///
/// The balance check and the append of `record_transaction` run under a single
/// lock acquisition, so concurrent debits cannot both observe the same balance.
#[derive(Clone)]
pub struct SharedLedger {
    inner: Arc<Mutex<TransactionLedger>>,
}

impl SharedLedger {
    pub fn new(ledger: TransactionLedger) -> Self {
        Self {
            inner: Arc::new(Mutex::new(ledger)),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, TransactionLedger>> {
        self.inner
            .lock()
            .map_err(|_| LedgerError::PersistenceFailure("ledger lock poisoned".to_string()))
    }

    pub fn record_transaction(
        &self,
        kind: TransactionKind,
        amount: f64,
        description: impl Into<String>,
        reference_id: Option<String>,
        metadata: Option<Metadata>,
    ) -> Result<Transaction> {
        self.lock()?
            .record_transaction(kind, amount, description, reference_id, metadata)
    }

    pub fn current_balance(&self) -> Result<i64> {
        Ok(self.lock()?.current_balance())
    }

    pub fn history(&self) -> Result<Vec<Transaction>> {
        Ok(self.lock()?.history())
    }

    pub fn history_page(&self, limit: usize, offset: usize) -> Result<HistoryPage> {
        Ok(self.lock()?.history_page(limit, offset))
    }

    /// Runs `f` with exclusive access to the ledger.
    pub fn with<R>(&self, f: impl FnOnce(&mut TransactionLedger) -> R) -> Result<R> {
        let mut guard = self.lock()?;
        Ok(f(&mut guard))
    }
}

impl From<TransactionLedger> for SharedLedger {
    fn from(ledger: TransactionLedger) -> Self {
        Self::new(ledger)
    }
}
