//! Deadlock-prone lock acquisition
//!
//! Locks the debit account first and the credit account second, ignoring the
//! canonical order. A transfer from `a` to `b` racing a transfer from `b` to
//! `a` can leave each holding one lock and waiting forever for the other.
//!
//! Do not use this outside tests and demonstrations. Anything running it must
//! bound its wait (see `Simulation::shutdown`).

use super::{validate_pair, LockingStrategy, TransferGuard};
use crate::core::AccountStore;
use crate::types::{AccountId, LedgerError};

/// Debit-then-credit locking
#[derive(Debug, Clone, Copy, Default)]
pub struct NaiveLocking;

impl LockingStrategy for NaiveLocking {
    fn lock_pair<'a>(
        &self,
        store: &'a AccountStore,
        debit: AccountId,
        credit: AccountId,
    ) -> Result<TransferGuard<'a>, LedgerError> {
        validate_pair(store, debit, credit)?;

        let first = store.get(debit)?.lock();
        let second = store.get(credit)?.lock();

        Ok(TransferGuard::new(first, second, true))
    }

    fn name(&self) -> &'static str {
        "naive"
    }
}
