use thiserror::Error;

/// Error type that captures every way a ledger operation can fail.
///
/// The first three variants are local validation failures; the ledger is left
/// untouched when any of them is returned. `PersistenceFailure` comes from the
/// backing store and is returned only after the in-memory append was rolled back.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Amount must not be zero")]
    ZeroAmount,
    #[error("Insufficient balance: current {balance}, requested {requested}")]
    InsufficientBalance { balance: i64, requested: i64 },
    #[error("Persistence error: {0}")]
    PersistenceFailure(String),
}

impl LedgerError {
    /// True when the caller should be prompted to add funds.
    pub fn is_insufficient_balance(&self) -> bool {
        matches!(self, LedgerError::InsufficientBalance { .. })
    }
}

impl From<std::io::Error> for LedgerError {
    fn from(err: std::io::Error) -> Self {
        LedgerError::PersistenceFailure(err.to_string())
    }
}

impl From<serde_json::Error> for LedgerError {
    fn from(err: serde_json::Error) -> Self {
        LedgerError::PersistenceFailure(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, LedgerError>;
