use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::{
    time::{Clock, SystemClock},
    transaction::{timestamp, Metadata, Transaction, TransactionKind},
};
use crate::{
    errors::{LedgerError, Result},
    storage::LedgerStore,
};

pub const DEFAULT_PAYMENT_METHOD: &str = "card";

/// Largest magnitude accepted for a single transaction (2^53 - 1).
pub const MAX_AMOUNT: i64 = 9_007_199_254_740_991;

/// Serialized form of the ledger, written in full on every append.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LedgerState {
    #[serde(default)]
    pub balance: i64,
    #[serde(default, with = "timestamp::lenient")]
    pub last_charge_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_charge_amount: i64,
    #[serde(default = "LedgerState::default_payment_method")]
    pub payment_method: String,
    #[serde(default)]
    pub transactions: Vec<Transaction>,
}

impl Default for LedgerState {
    fn default() -> Self {
        Self::empty(DEFAULT_PAYMENT_METHOD)
    }
}

impl LedgerState {
    pub fn empty(payment_method: impl Into<String>) -> Self {
        Self {
            balance: 0,
            last_charge_date: None,
            last_charge_amount: 0,
            payment_method: payment_method.into(),
            transactions: Vec::new(),
        }
    }

    pub fn default_payment_method() -> String {
        DEFAULT_PAYMENT_METHOD.to_string()
    }

    /// Re-derives every cached field from the transaction log.
    ///
    /// Debit amounts stored with the wrong sign are normalized. Returns one
    /// warning per repaired discrepancy.
    fn rebuild(&mut self, default_payment_method: &str) -> Result<Vec<String>> {
        let mut warnings = Vec::new();
        self.transactions
            .sort_by(|a, b| a.timestamp.cmp(&b.timestamp));

        let mut last_charge: Option<(DateTime<Utc>, i64, Option<String>)> = None;
        for txn in &mut self.transactions {
            if txn.amount.unsigned_abs() > MAX_AMOUNT as u64 {
                return Err(LedgerError::PersistenceFailure(format!(
                    "transaction {} amount {} is out of range",
                    txn.id, txn.amount
                )));
            }
            let normalized = txn.kind.normalize(txn.amount);
            if normalized != txn.amount {
                warnings.push(format!(
                    "transaction {} ({}) stored amount {} normalized to {}",
                    txn.id, txn.kind, txn.amount, normalized
                ));
                txn.amount = normalized;
            }
            if txn.kind == TransactionKind::Charge {
                last_charge = Some((
                    txn.timestamp,
                    txn.amount,
                    txn.payment_method().map(str::to_string),
                ));
            }
        }

        let totals = running_totals(0, self.transactions.iter().map(|txn| txn.amount))
            .ok_or_else(|| LedgerError::PersistenceFailure("ledger total overflows".to_string()))?;
        for (txn, total) in self.transactions.iter_mut().zip(&totals) {
            if txn.balance != *total {
                warnings.push(format!(
                    "transaction {} running balance {} rebuilt as {}",
                    txn.id, txn.balance, total
                ));
                txn.balance = *total;
            }
        }
        let running = totals.last().copied().unwrap_or(0);

        if self.balance != running {
            warnings.push(format!(
                "stored balance {} disagrees with transaction log total {}",
                self.balance, running
            ));
            self.balance = running;
        }

        match last_charge {
            Some((date, amount, method)) => {
                self.last_charge_date = Some(date);
                self.last_charge_amount = amount;
                self.payment_method =
                    method.unwrap_or_else(|| default_payment_method.to_string());
            }
            None => {
                self.last_charge_date = None;
                self.last_charge_amount = 0;
                if self.payment_method.trim().is_empty() {
                    self.payment_method = default_payment_method.to_string();
                }
            }
        }
        Ok(warnings)
    }
}

/// Most recent charge, as cached on the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LastCharge {
    pub date: DateTime<Utc>,
    pub amount: i64,
}

/// One window of the newest-first history.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryPage {
    pub transactions: Vec<Transaction>,
    pub total: usize,
    pub limit: usize,
    pub offset: usize,
}

impl HistoryPage {
    pub fn has_more(&self) -> bool {
        self.offset + self.transactions.len() < self.total
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadSource {
    Store,
    Seed,
}

/// Outcome of opening a ledger.
#[derive(Debug, Clone)]
pub struct LoadReport {
    pub source: LoadSource,
    pub warnings: Vec<String>,
}

/// Construction options for [`TransactionLedger::open_with`].
pub struct LedgerOptions {
    pub seed: Vec<Transaction>,
    pub clock: Box<dyn Clock>,
    pub default_payment_method: String,
}

impl Default for LedgerOptions {
    fn default() -> Self {
        Self {
            seed: Vec::new(),
            clock: Box::new(SystemClock),
            default_payment_method: DEFAULT_PAYMENT_METHOD.to_string(),
        }
    }
}

impl LedgerOptions {
    pub fn with_seed(mut self, seed: Vec<Transaction>) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn with_payment_method(mut self, method: impl Into<String>) -> Self {
        self.default_payment_method = method.into();
        self
    }
}

/// Append-only log of balance-affecting transactions backed by a [`LedgerStore`].
///
/// The balance is always the sum of the logged amounts. Every successful
/// [`record_transaction`](Self::record_transaction) is persisted before it
/// becomes visible; a failed save rolls the append back.
pub struct TransactionLedger {
    state: LedgerState,
    store: Box<dyn LedgerStore>,
    clock: Box<dyn Clock>,
    default_payment_method: String,
}

impl TransactionLedger {
    pub fn open(store: Box<dyn LedgerStore>) -> Result<(Self, LoadReport)> {
        Self::open_with(store, LedgerOptions::default())
    }

    /// Loads the persisted ledger, or starts from `options.seed` when the store
    /// is empty or holds a ledger without transactions.
    pub fn open_with(
        store: Box<dyn LedgerStore>,
        options: LedgerOptions,
    ) -> Result<(Self, LoadReport)> {
        let LedgerOptions {
            seed,
            clock,
            default_payment_method,
        } = options;

        let (mut state, source) = match store.load()? {
            Some(mut loaded) => {
                if loaded.transactions.is_empty() && !seed.is_empty() {
                    debug!("persisted ledger has no transactions; applying seed");
                    loaded.transactions = seed;
                    (loaded, LoadSource::Seed)
                } else {
                    (loaded, LoadSource::Store)
                }
            }
            None => {
                let mut fresh = LedgerState::empty(default_payment_method.clone());
                fresh.transactions = seed;
                (fresh, LoadSource::Seed)
            }
        };

        let warnings = state.rebuild(&default_payment_method)?;
        for warning in &warnings {
            warn!("{warning}");
        }
        if source == LoadSource::Store && !warnings.is_empty() {
            match store.save(&state) {
                Ok(()) => info!(repairs = warnings.len(), "repaired ledger saved"),
                Err(err) => warn!(error = %err, "repaired ledger could not be saved"),
            }
        }
        info!(
            source = ?source,
            transactions = state.transactions.len(),
            balance = state.balance,
            "ledger opened"
        );

        let ledger = Self {
            state,
            store,
            clock,
            default_payment_method,
        };
        Ok((ledger, LoadReport { source, warnings }))
    }

    /// Validates, appends and persists one transaction.
    ///
    /// `amount` is a whole number of minor units; its sign is replaced by the
    /// sign rule of `kind`. Debits that would take the balance below zero are
    /// rejected with [`LedgerError::InsufficientBalance`].
    pub fn record_transaction(
        &mut self,
        kind: TransactionKind,
        amount: f64,
        description: impl Into<String>,
        reference_id: Option<String>,
        metadata: Option<Metadata>,
    ) -> Result<Transaction> {
        let magnitude = validate_amount(amount)?;
        let normalized = kind.normalize(magnitude);
        let current = self.current_balance();
        let projected = current.checked_add(normalized).ok_or_else(|| {
            LedgerError::InvalidAmount(format!("balance would overflow adding {normalized}"))
        })?;

        if kind.is_debit() && projected < 0 {
            warn!(
                kind = %kind,
                balance = current,
                requested = magnitude,
                "debit rejected for insufficient balance"
            );
            return Err(LedgerError::InsufficientBalance {
                balance: current,
                requested: magnitude,
            });
        }

        let mut txn = Transaction::new(kind, magnitude, description, self.clock.now());
        txn.reference_id = reference_id;
        txn.metadata = metadata;

        // After every entry at or before the new timestamp, so equal
        // timestamps keep insertion order.
        let position = self
            .state
            .transactions
            .partition_point(|entry| entry.timestamp <= txn.timestamp);
        let opening = position
            .checked_sub(1)
            .map_or(0, |prev| self.state.transactions[prev].balance);
        let later = self.state.transactions[position..].iter().map(|entry| entry.amount);
        let restated = running_totals(opening, std::iter::once(txn.amount).chain(later))
            .ok_or_else(|| {
                LedgerError::InvalidAmount(format!(
                    "running balance would overflow adding {normalized}"
                ))
            })?;
        txn.balance = restated[0];
        if position < self.state.transactions.len() {
            debug!(
                id = %txn.id,
                restated = restated.len() - 1,
                "back-dated transaction; later running balances restated"
            );
        }

        let previous = (
            self.state.balance,
            self.state.last_charge_date,
            self.state.last_charge_amount,
            self.state.payment_method.clone(),
        );
        let displaced: Vec<i64> = self.state.transactions[position..]
            .iter()
            .map(|entry| entry.balance)
            .collect();

        self.state.transactions.insert(position, txn.clone());
        self.restate_from(position, &restated);
        self.state.balance = projected;
        let newest_charge = !self.state.transactions[position + 1..]
            .iter()
            .any(|entry| entry.kind == TransactionKind::Charge);
        if kind == TransactionKind::Charge && newest_charge {
            self.state.last_charge_date = Some(txn.timestamp);
            self.state.last_charge_amount = txn.amount;
            self.state.payment_method = txn
                .payment_method()
                .unwrap_or(self.default_payment_method.as_str())
                .to_string();
        }

        if let Err(err) = self.store.save(&self.state) {
            self.state.transactions.remove(position);
            self.restate_from(position, &displaced);
            let (balance, last_charge_date, last_charge_amount, payment_method) = previous;
            self.state.balance = balance;
            self.state.last_charge_date = last_charge_date;
            self.state.last_charge_amount = last_charge_amount;
            self.state.payment_method = payment_method;
            warn!(id = %txn.id, error = %err, "save failed; append rolled back");
            return Err(match err {
                LedgerError::PersistenceFailure(_) => err,
                other => LedgerError::PersistenceFailure(other.to_string()),
            });
        }

        info!(
            id = %txn.id,
            kind = %kind,
            amount = txn.amount,
            balance = txn.balance,
            "transaction recorded"
        );
        Ok(txn)
    }

    /// Sum of every logged amount.
    pub fn current_balance(&self) -> i64 {
        let total: i64 = self.state.transactions.iter().map(|txn| txn.amount).sum();
        if total != self.state.balance {
            warn!(
                cached = self.state.balance,
                derived = total,
                "cached balance is stale"
            );
        }
        total
    }

    /// All transactions, newest first.
    pub fn history(&self) -> Vec<Transaction> {
        self.state.transactions.iter().rev().cloned().collect()
    }

    pub fn history_page(&self, limit: usize, offset: usize) -> HistoryPage {
        self.history_page_of(None, limit, offset)
    }

    /// Like [`history_page`](Self::history_page), restricted to one kind when
    /// `kind` is set. `total` counts the matching transactions only.
    pub fn history_page_of(
        &self,
        kind: Option<TransactionKind>,
        limit: usize,
        offset: usize,
    ) -> HistoryPage {
        let matching: Vec<&Transaction> = self
            .state
            .transactions
            .iter()
            .rev()
            .filter(|txn| kind.map_or(true, |kind| txn.kind == kind))
            .collect();
        let transactions = matching
            .iter()
            .skip(offset)
            .take(limit)
            .map(|txn| (*txn).clone())
            .collect();
        HistoryPage {
            transactions,
            total: matching.len(),
            limit,
            offset,
        }
    }

    pub fn last_charge(&self) -> Option<LastCharge> {
        self.state.last_charge_date.map(|date| LastCharge {
            date,
            amount: self.state.last_charge_amount,
        })
    }

    pub fn payment_method(&self) -> &str {
        &self.state.payment_method
    }

    pub fn len(&self) -> usize {
        self.state.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.transactions.is_empty()
    }

    /// Serializable view of the ledger, as handed to the store on each append.
    pub fn state(&self) -> &LedgerState {
        &self.state
    }

    /// Clears the backing store and empties the ledger.
    pub fn reset(&mut self) -> Result<()> {
        self.store.clear()?;
        let discarded = self.state.transactions.len();
        self.state = LedgerState::empty(self.default_payment_method.clone());
        info!(discarded, "ledger reset");
        Ok(())
    }

    /// Overwrites the running balances from `position` onward.
    fn restate_from(&mut self, position: usize, balances: &[i64]) {
        for (entry, balance) in self.state.transactions[position..].iter_mut().zip(balances) {
            entry.balance = *balance;
        }
    }
}

/// Running balance after each amount, starting from `opening`. `None` on overflow.
fn running_totals(opening: i64, amounts: impl IntoIterator<Item = i64>) -> Option<Vec<i64>> {
    let mut running = opening;
    amounts
        .into_iter()
        .map(|amount| {
            running = running.checked_add(amount)?;
            Some(running)
        })
        .collect()
}

fn validate_amount(amount: f64) -> Result<i64> {
    if !amount.is_finite() {
        return Err(LedgerError::InvalidAmount(format!(
            "amount must be a finite number, got {amount}"
        )));
    }
    if amount == 0.0 {
        return Err(LedgerError::ZeroAmount);
    }
    if amount.fract() != 0.0 {
        return Err(LedgerError::InvalidAmount(format!(
            "amount must be a whole number of minor units, got {amount}"
        )));
    }
    let magnitude = amount.abs();
    if magnitude > MAX_AMOUNT as f64 {
        return Err(LedgerError::InvalidAmount(format!(
            "amount {amount} exceeds the maximum of {MAX_AMOUNT}"
        )));
    }
    Ok(magnitude as i64)
}
