//! Ledger projections for operator-facing adapters.

use std::path::Path;

use crate::domain::ledger::{Balance, Buckets, Transaction};
use crate::error::Result;

/// A balance with its most recent entries, newest first.
#[derive(Debug, Clone)]
pub struct BalanceView {
    pub balance: Balance,
    pub recent: Vec<Transaction>,
}

/// Read-only ledger use-cases.
pub trait LedgerOperator {
    /// # Errors
    /// Returns an error if the account does not exist.
    fn balance(&self, path: &Path, user: &str, limit: usize) -> Result<BalanceView>;

    /// Replay the user's transactions and compare with the live balance.
    ///
    /// # Errors
    /// Returns a replay mismatch if they diverge.
    fn audit(&self, path: &Path, user: &str) -> Result<Buckets>;
}
