//! Account-related types for the ledger
//!
//! An `Account` is a single balance cell guarded by its own exclusive lock.
//! The balance lives inside the mutex, so the type system enforces that it is
//! only ever read or written while the lock is held.

use parking_lot::{Mutex, MutexGuard};
use std::time::Duration;

/// Signed account balance
pub type Balance = i64;

/// Index of an account within its store
///
/// The index doubles as the account's position in the canonical lock order.
pub type AccountId = usize;

/// A single mutable balance cell with its own lock
#[derive(Debug)]
pub struct Account {
    /// Position of this account in the store (and in the lock order)
    id: AccountId,

    /// The balance, only reachable through the lock
    balance: Mutex<Balance>,
}

impl Account {
    /// Create a new account holding `balance`
    pub fn new(id: AccountId, balance: Balance) -> Self {
        Account {
            id,
            balance: Mutex::new(balance),
        }
    }

    /// The account's index in its store
    pub fn id(&self) -> AccountId {
        self.id
    }

    /// Acquire the account lock, blocking until it is available
    ///
    /// The returned guard releases the lock when dropped, on every exit path
    /// including unwinding.
    pub fn lock(&self) -> MutexGuard<'_, Balance> {
        self.balance.lock()
    }

    /// Try to acquire the account lock within `timeout`
    ///
    /// Transfer and aggregation paths never use this; it exists for
    /// diagnostics such as detecting a circular wait in tests.
    pub fn try_lock_for(&self, timeout: Duration) -> Option<MutexGuard<'_, Balance>> {
        self.balance.try_lock_for(timeout)
    }

    /// Whether some thread currently holds the lock
    ///
    /// Inherently racy; only useful as a hint.
    pub fn is_locked(&self) -> bool {
        self.balance.is_locked()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_account_holds_initial_balance() {
        let account = Account::new(3, 1000);

        assert_eq!(account.id(), 3);
        assert_eq!(*account.lock(), 1000);
    }

    #[test]
    fn test_guard_release_on_drop() {
        let account = Account::new(0, 10);

        {
            let mut balance = account.lock();
            *balance -= 4;
            assert!(account.is_locked());
        }

        assert!(!account.is_locked());
        assert_eq!(*account.lock(), 6);
    }

    #[test]
    fn test_try_lock_for_times_out_while_held() {
        let account = Account::new(0, 10);
        let _held = account.lock();

        std::thread::scope(|scope| {
            let attempt = scope
                .spawn(|| account.try_lock_for(Duration::from_millis(20)).is_some())
                .join()
                .unwrap();
            assert!(!attempt);
        });
    }
}
