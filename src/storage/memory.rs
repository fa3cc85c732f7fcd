use std::sync::{Arc, Mutex, MutexGuard};

use super::LedgerStore;
use crate::{
    errors::{LedgerError, Result},
    ledger::LedgerState,
};

#[derive(Debug, Default)]
struct MemoryInner {
    json: Option<String>,
    fail_saves: bool,
    saves: usize,
}

/// In-process store holding the serialized ledger as a JSON string.
///
/// Clones share the same slot, so a test can keep a handle while the ledger
/// owns another.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<MemoryInner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store pre-populated with raw JSON, as a legacy client would have left it.
    pub fn with_json(json: impl Into<String>) -> Self {
        let store = Self::new();
        if let Ok(mut inner) = store.inner.lock() {
            inner.json = Some(json.into());
        }
        store
    }

    fn inner(&self) -> Result<MutexGuard<'_, MemoryInner>> {
        self.inner
            .lock()
            .map_err(|_| LedgerError::PersistenceFailure("memory store lock poisoned".into()))
    }

    /// When enabled, every `save` fails with a persistence error.
    pub fn set_fail_saves(&self, fail: bool) {
        if let Ok(mut inner) = self.inner() {
            inner.fail_saves = fail;
        }
    }

    pub fn raw_json(&self) -> Option<String> {
        self.inner().ok().and_then(|inner| inner.json.clone())
    }

    pub fn save_count(&self) -> usize {
        self.inner().map(|inner| inner.saves).unwrap_or(0)
    }
}

impl LedgerStore for MemoryStore {
    fn load(&self) -> Result<Option<LedgerState>> {
        let inner = self.inner()?;
        match inner.json.as_deref() {
            Some(json) => Ok(Some(serde_json::from_str(json)?)),
            None => Ok(None),
        }
    }

    fn save(&self, state: &LedgerState) -> Result<()> {
        let mut inner = self.inner()?;
        if inner.fail_saves {
            return Err(LedgerError::PersistenceFailure(
                "storage quota exceeded".to_string(),
            ));
        }
        inner.json = Some(serde_json::to_string(state)?);
        inner.saves += 1;
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        self.inner()?.json = None;
        Ok(())
    }
}
