#![doc(test(attr(deny(warnings))))]

//! Credit Ledger keeps an advertiser's prepaid balance as an append-only log of
//! charges, usages, refunds and penalties. The balance is never stored on its
//! own; it is always the sum of the log.
//!
//! ```
//! use credit_ledger::{
//!     ledger::{TransactionKind, TransactionLedger},
//!     storage::MemoryStore,
//! };
//!
//! let (mut ledger, _report) = TransactionLedger::open(Box::new(MemoryStore::new())).unwrap();
//! ledger
//!     .record_transaction(TransactionKind::Charge, 50_000.0, "충전", None, None)
//!     .unwrap();
//! ledger
//!     .record_transaction(TransactionKind::Usage, 2_000.0, "사용", None, None)
//!     .unwrap();
//! assert_eq!(ledger.current_balance(), 48_000);
//! ```

pub mod cli;
pub mod config;
pub mod currency;
pub mod errors;
pub mod ledger;
pub mod storage;
pub mod utils;

pub use errors::{LedgerError, Result};
pub use ledger::{SharedLedger, Transaction, TransactionKind, TransactionLedger};

/// Initializes global tracing with the default filter and emits a startup log.
pub fn init() {
    init_with_filter(utils::DEFAULT_LOG_FILTER);
}

/// Like [`init`], with a caller-supplied default filter (`RUST_LOG` still wins).
pub fn init_with_filter(filter: &str) {
    utils::init_tracing(filter);
}
