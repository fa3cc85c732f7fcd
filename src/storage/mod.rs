pub mod json_backend;
pub mod memory;

use crate::{errors::Result, ledger::LedgerState};

/// Persistence port owned exclusively by one ledger.
///
/// `save` is a full overwrite of the serialized ledger. `load` returns `None`
/// when nothing has been persisted yet.
pub trait LedgerStore: Send + Sync {
    fn load(&self) -> Result<Option<LedgerState>>;
    fn save(&self, state: &LedgerState) -> Result<()>;
    fn clear(&self) -> Result<()>;
}

pub use json_backend::JsonFileStore;
pub use memory::MemoryStore;
