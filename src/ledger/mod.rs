//! Transaction ledger: the append-only log, its serializable state, and the
//! shared handle used by multi-threaded hosts.

#[allow(clippy::module_inception)]
pub mod ledger;
pub mod shared;
pub mod time;
pub mod transaction;

pub use ledger::{
    HistoryPage, LastCharge, LedgerOptions, LedgerState, LoadReport, LoadSource,
    TransactionLedger, DEFAULT_PAYMENT_METHOD, MAX_AMOUNT,
};
pub use shared::SharedLedger;
pub use time::{Clock, SteppingClock, SystemClock};
pub use transaction::{
    generate_id, Metadata, MetadataValue, Transaction, TransactionKind, PAYMENT_METHOD_KEY,
};
