//! Locking strategy module for two-account transfers
//!
//! This module defines the Strategy pattern for acquiring the pair of account
//! locks a transfer needs. The strategy is selected at runtime so tests can
//! deliberately pick the deadlock-prone variant and bound it with a timeout.
//!
//! - [`OrderedLocking`]: lower index first, then higher index. Every
//!   multi-lock path in the crate follows this order, which rules out circular
//!   wait.
//! - [`NaiveLocking`]: debit first, then credit. Two opposite transfers can each
//!   hold one lock while waiting for the other. Kept as a negative fixture.

use crate::cli::StrategyType;
use crate::core::AccountStore;
use crate::types::{AccountId, Balance, LedgerError};
use parking_lot::MutexGuard;

pub mod naive;
pub mod ordered;

pub use naive::NaiveLocking;
pub use ordered::OrderedLocking;

/// Both locks of a transfer, held for the lifetime of the guard
///
/// Fields drop in declaration order, so the second-acquired lock is released
/// first.
#[derive(Debug)]
pub struct TransferGuard<'a> {
    second: MutexGuard<'a, Balance>,
    first: MutexGuard<'a, Balance>,
    debit_acquired_first: bool,
}

impl<'a> TransferGuard<'a> {
    /// Wrap two already-acquired guards
    ///
    /// `debit_acquired_first` records which of the two belongs to the debit
    /// account.
    pub(crate) fn new(
        first: MutexGuard<'a, Balance>,
        second: MutexGuard<'a, Balance>,
        debit_acquired_first: bool,
    ) -> Self {
        TransferGuard {
            second,
            first,
            debit_acquired_first,
        }
    }

    /// Mutable access to `(debit, credit)` balances
    pub fn balances(&mut self) -> (&mut Balance, &mut Balance) {
        if self.debit_acquired_first {
            (&mut *self.first, &mut *self.second)
        } else {
            (&mut *self.second, &mut *self.first)
        }
    }

    /// Current debit balance
    pub fn debit(&self) -> Balance {
        if self.debit_acquired_first {
            *self.first
        } else {
            *self.second
        }
    }

    /// Current credit balance
    pub fn credit(&self) -> Balance {
        if self.debit_acquired_first {
            *self.second
        } else {
            *self.first
        }
    }
}

/// Strategy for acquiring the two locks of a transfer
pub trait LockingStrategy: Send + Sync + std::fmt::Debug {
    /// Lock the `debit` and `credit` accounts of `store`
    ///
    /// Blocks until both locks are held. Both indices are validated before
    /// any lock is taken.
    ///
    /// # Errors
    ///
    /// - `IndexOutOfRange` if either index is outside the store
    /// - `SameAccount` if `debit == credit`
    fn lock_pair<'a>(
        &self,
        store: &'a AccountStore,
        debit: AccountId,
        credit: AccountId,
    ) -> Result<TransferGuard<'a>, LedgerError>;

    /// Strategy name for logs
    fn name(&self) -> &'static str;
}

/// Shared argument checks for every strategy
pub(crate) fn validate_pair(
    store: &AccountStore,
    debit: AccountId,
    credit: AccountId,
) -> Result<(), LedgerError> {
    store.get(debit)?;
    store.get(credit)?;
    if debit == credit {
        return Err(LedgerError::same_account(debit));
    }
    Ok(())
}

/// Create a locking strategy based on the specified strategy type
pub fn create_strategy(strategy_type: StrategyType) -> Box<dyn LockingStrategy> {
    match strategy_type {
        StrategyType::Ordered => Box::new(OrderedLocking),
        StrategyType::Naive => Box::new(NaiveLocking),
    }
}
