use std::{
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use tracing::debug;

use super::LedgerStore;
use crate::{errors::Result, ledger::LedgerState, utils::persistence::write_atomic};

/// Stores the ledger as pretty-printed JSON in a single file.
///
/// Writes are staged to `<file>.tmp` and renamed over the target, so a failed
/// save leaves the previous file intact.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LedgerStore for JsonFileStore {
    fn load(&self) -> Result<Option<LedgerState>> {
        let data = match fs::read_to_string(&self.path) {
            Ok(data) => data,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no persisted ledger");
                return Ok(None);
            }
            Err(err) => return Err(err.into()),
        };
        let state: LedgerState = serde_json::from_str(&data)?;
        debug!(
            path = %self.path.display(),
            transactions = state.transactions.len(),
            "ledger loaded"
        );
        Ok(Some(state))
    }

    fn save(&self, state: &LedgerState) -> Result<()> {
        let json = serde_json::to_string_pretty(state)?;
        write_atomic(&self.path, &json)?;
        debug!(path = %self.path.display(), bytes = json.len(), "ledger saved");
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}
