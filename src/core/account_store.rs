//! Fixed-size account storage
//!
//! This module provides the `AccountStore` struct, an ordered, fixed-length
//! sequence of accounts addressable by index.
//!
//! # Lock Order
//!
//! Index order is the canonical lock-acquisition order for the whole crate.
//! Every code path that holds more than one account lock at a time must take
//! them in ascending index order. The store itself never holds more than one
//! lock; it only hands out accounts.
//!
//! # Conservation
//!
//! The store is created with `accounts * initial_balance` in total. Transfers
//! only move balance between accounts, so that sum is constant whenever no
//! transfer is half-applied. Creation rejects stores whose total would not fit
//! a `Balance`, which makes every later sum overflow-free.

use crate::types::{Account, AccountId, Balance, LedgerError};

/// Ordered, fixed-identity collection of accounts
#[derive(Debug)]
pub struct AccountStore {
    /// Accounts indexed `0..len`; `accounts[i].id() == i`
    accounts: Box<[Account]>,

    /// `len * initial_balance`, validated at construction
    expected_total: Balance,
}

impl AccountStore {
    /// Create a store of `account_count` accounts, each holding `initial_balance`
    ///
    /// # Errors
    ///
    /// - `InvalidConfig` if `account_count` is zero or `initial_balance` is negative
    /// - `BalanceOverflow` if the store total would not fit a `Balance`
    pub fn new(account_count: usize, initial_balance: Balance) -> Result<Self, LedgerError> {
        if account_count == 0 {
            return Err(LedgerError::invalid_config(
                "accounts",
                "a store needs at least one account",
            ));
        }
        if initial_balance < 0 {
            return Err(LedgerError::invalid_config(
                "initial_balance",
                format!("balance must not be negative, got {}", initial_balance),
            ));
        }

        let expected_total = Balance::try_from(account_count)
            .ok()
            .and_then(|count| count.checked_mul(initial_balance))
            .ok_or_else(|| LedgerError::balance_overflow("store creation"))?;

        let accounts = (0..account_count)
            .map(|id| Account::new(id, initial_balance))
            .collect();

        Ok(AccountStore {
            accounts,
            expected_total,
        })
    }

    /// Get the account at `index`
    ///
    /// # Errors
    ///
    /// Returns `IndexOutOfRange` if `index >= len()`.
    pub fn get(&self, index: AccountId) -> Result<&Account, LedgerError> {
        self.accounts
            .get(index)
            .ok_or_else(|| LedgerError::index_out_of_range(index, self.accounts.len()))
    }

    /// Number of accounts
    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    /// Always false for a successfully constructed store
    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    /// Iterate accounts in canonical lock order
    pub fn iter(&self) -> impl Iterator<Item = &Account> {
        self.accounts.iter()
    }

    /// The constant sum of all balances
    pub fn expected_total(&self) -> Balance {
        self.expected_total
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_new_store_initializes_every_account() {
        let store = AccountStore::new(100, 1000).unwrap();

        assert_eq!(store.len(), 100);
        assert!(!store.is_empty());
        assert_eq!(store.expected_total(), 100_000);
        for (index, account) in store.iter().enumerate() {
            assert_eq!(account.id(), index);
            assert_eq!(*account.lock(), 1000);
        }
    }

    #[rstest]
    #[case::first(0)]
    #[case::middle(4)]
    #[case::last(9)]
    fn test_get_in_range(#[case] index: usize) {
        let store = AccountStore::new(10, 5).unwrap();

        let account = store.get(index).unwrap();
        assert_eq!(account.id(), index);
    }

    #[rstest]
    #[case::one_past_end(10)]
    #[case::far_out(usize::MAX)]
    fn test_get_out_of_range(#[case] index: usize) {
        let store = AccountStore::new(10, 5).unwrap();

        let result = store.get(index);
        assert_eq!(
            result.unwrap_err(),
            LedgerError::index_out_of_range(index, 10)
        );
    }

    #[rstest]
    #[case::zero_accounts(0, 1000, "accounts")]
    #[case::negative_balance(10, -1, "initial_balance")]
    fn test_invalid_config(#[case] count: usize, #[case] balance: Balance, #[case] field: &str) {
        let result = AccountStore::new(count, balance);

        match result {
            Err(LedgerError::InvalidConfig { field: actual, .. }) => assert_eq!(actual, field),
            other => panic!("Expected InvalidConfig for {}, got {:?}", field, other),
        }
    }

    #[test]
    fn test_total_overflow_rejected() {
        let result = AccountStore::new(4, Balance::MAX / 2);

        assert!(matches!(result, Err(LedgerError::BalanceOverflow { .. })));
    }

    #[test]
    fn test_zero_balance_store_is_valid() {
        let store = AccountStore::new(3, 0).unwrap();

        assert_eq!(store.expected_total(), 0);
    }
}
