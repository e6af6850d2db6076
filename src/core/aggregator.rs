//! Point-in-time totals over an account store
//!
//! # Snapshot
//!
//! [`Aggregator::snapshot_total`] acquires every account lock in ascending
//! index order (the same order transfers use), sums the balances, then drops
//! every guard. While all locks are held no transfer can be half-applied, so
//! the result always equals the store's expected total.
//!
//! Acquisition is a loop that pushes guards into a heap-allocated `Vec`, so
//! the number of accounts has no effect on stack depth. Guards are released by
//! dropping the `Vec`, which also happens if summation returns early.
//!
//! # Approximation
//!
//! [`Aggregator::approximate_total`] locks one account at a time. A transfer
//! between an already-visited and a not-yet-visited account lands between two
//! reads, so the result drifts from the true total while transfers run.

use super::AccountStore;
use crate::types::{Balance, LedgerError};
use parking_lot::MutexGuard;
use std::sync::Arc;

/// Totals over one account store
#[derive(Debug, Clone)]
pub struct Aggregator {
    store: Arc<AccountStore>,
}

impl Aggregator {
    pub fn new(store: Arc<AccountStore>) -> Self {
        Aggregator { store }
    }

    /// Exact total of all balances, taken with every lock held
    ///
    /// # Errors
    ///
    /// Returns `BalanceOverflow` if the sum does not fit a `Balance`; a store
    /// created through [`AccountStore::new`] never reaches it.
    pub fn snapshot_total(&self) -> Result<Balance, LedgerError> {
        let guards = self.lock_all();
        sum_balances(guards.iter().map(|guard| **guard), "snapshot_total")
    }

    /// Every balance, in index order, taken with every lock held
    pub fn snapshot_balances(&self) -> Vec<Balance> {
        let guards = self.lock_all();
        guards.iter().map(|guard| **guard).collect()
    }

    /// Sum of balances locking one account at a time
    ///
    /// Not atomic across accounts: while transfers are running the result may
    /// differ from the true total.
    pub fn approximate_total(&self) -> Result<Balance, LedgerError> {
        sum_balances(
            self.store.iter().map(|account| *account.lock()),
            "approximate_total",
        )
    }

    /// Acquire every account lock in canonical order
    fn lock_all(&self) -> Vec<MutexGuard<'_, Balance>> {
        let mut guards = Vec::with_capacity(self.store.len());
        for account in self.store.iter() {
            guards.push(account.lock());
        }
        guards
    }
}

fn sum_balances(
    mut balances: impl Iterator<Item = Balance>,
    operation: &str,
) -> Result<Balance, LedgerError> {
    balances.try_fold(0, |sum: Balance, balance| {
        sum.checked_add(balance)
            .ok_or_else(|| LedgerError::balance_overflow(operation))
    })
}
