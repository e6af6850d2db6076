//! Randomized transfer workers
//!
//! This module provides the `TransferEngine`, which repeatedly picks two
//! distinct accounts at random and moves a random positive amount from one to
//! the other.
//!
//! # Iteration
//!
//! 1. Draw distinct `debit` and `credit` indices uniformly from `[0, len)`.
//! 2. Acquire both locks through the configured [`LockingStrategy`].
//! 3. If the debit balance is positive, move a random amount in `[1, balance]`.
//! 4. Release both locks (guard drop).
//! 5. Count the attempt, whether or not anything moved.
//!
//! Cancellation is checked only at the top of an iteration, where no lock is
//! held, so a stopping worker never leaves a transfer half-applied.

use super::traits::Counter;
use super::AccountStore;
use crate::strategy::LockingStrategy;
use crate::types::{AccountId, Balance, LedgerError};
use rand::Rng;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Result of a single transfer attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferOutcome {
    /// `amount` moved from `debit` to `credit`
    Moved {
        debit: AccountId,
        credit: AccountId,
        amount: Balance,
    },
    /// The debit account was empty; nothing moved
    Skipped { debit: AccountId, credit: AccountId },
}

/// Transfer worker bound to one store, counter and locking strategy
///
/// Cheap to clone; clones share the store, counter and strategy, so one engine
/// can be handed to each worker thread.
#[derive(Debug, Clone)]
pub struct TransferEngine {
    store: Arc<AccountStore>,
    counter: Arc<dyn Counter>,
    strategy: Arc<dyn LockingStrategy>,
}

impl TransferEngine {
    /// Create an engine over `store`
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if the store has fewer than two accounts, since
    /// no distinct pair could ever be drawn.
    pub fn new(
        store: Arc<AccountStore>,
        counter: Arc<dyn Counter>,
        strategy: Arc<dyn LockingStrategy>,
    ) -> Result<Self, LedgerError> {
        if store.len() < 2 {
            return Err(LedgerError::invalid_config(
                "accounts",
                format!("transfers need at least 2 accounts, got {}", store.len()),
            ));
        }
        Ok(TransferEngine {
            store,
            counter,
            strategy,
        })
    }

    /// The store this engine mutates
    pub fn store(&self) -> &Arc<AccountStore> {
        &self.store
    }

    /// The counter this engine increments
    pub fn counter(&self) -> &Arc<dyn Counter> {
        &self.counter
    }

    /// Run transfers until `cancel` is observed
    ///
    /// Returns the number of attempts this call made.
    ///
    /// # Errors
    ///
    /// Propagates errors from [`transfer`](Self::transfer); none are expected
    /// in steady state.
    pub fn run_transfer_loop(&self, cancel: &CancellationToken) -> Result<u64, LedgerError> {
        let mut rng = rand::thread_rng();
        let mut attempts = 0u64;

        tracing::debug!(strategy = self.strategy.name(), "transfer loop started");
        while !cancel.is_cancelled() {
            self.transfer_once(&mut rng)?;
            attempts += 1;
        }
        tracing::debug!(attempts, "transfer loop cancelled");

        Ok(attempts)
    }

    /// Perform one randomized transfer attempt
    pub fn transfer_once<R: Rng>(&self, rng: &mut R) -> Result<TransferOutcome, LedgerError> {
        let (debit, credit) = self.draw_pair(rng);
        self.transfer(debit, credit, rng)
    }

    /// Attempt a transfer of a random amount from `debit` to `credit`
    ///
    /// The attempt is counted once the locks are released, including when the
    /// debit account was empty.
    ///
    /// # Errors
    ///
    /// - `IndexOutOfRange` or `SameAccount` for an invalid pair (not counted)
    /// - `BalanceOverflow` if the credit would overflow, which a store created
    ///   through [`AccountStore::new`] rules out
    pub fn transfer<R: Rng>(
        &self,
        debit: AccountId,
        credit: AccountId,
        rng: &mut R,
    ) -> Result<TransferOutcome, LedgerError> {
        let outcome = {
            let mut guard = self.strategy.lock_pair(&self.store, debit, credit)?;
            let (debit_balance, credit_balance) = guard.balances();

            if *debit_balance > 0 {
                let amount = rng.gen_range(1..=*debit_balance);
                *credit_balance = credit_balance
                    .checked_add(amount)
                    .ok_or_else(|| LedgerError::balance_overflow("transfer credit"))?;
                *debit_balance -= amount;
                TransferOutcome::Moved {
                    debit,
                    credit,
                    amount,
                }
            } else {
                TransferOutcome::Skipped { debit, credit }
            }
        };

        self.counter.increment();
        Ok(outcome)
    }

    /// Draw two distinct indices uniformly
    fn draw_pair<R: Rng>(&self, rng: &mut R) -> (AccountId, AccountId) {
        let len = self.store.len();
        let debit = rng.gen_range(0..len);
        // Draw from the remaining len - 1 slots and skip over `debit`
        let mut credit = rng.gen_range(0..len - 1);
        if credit >= debit {
            credit += 1;
        }
        (debit, credit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::StrategyType;
    use crate::core::{create_counter, AtomicCounter, CounterKind};
    use crate::strategy::{create_strategy, OrderedLocking};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use rstest::rstest;
    use std::thread;
    use std::time::Duration;

    fn engine(accounts: usize, balance: Balance) -> TransferEngine {
        let store = Arc::new(AccountStore::new(accounts, balance).unwrap());
        TransferEngine::new(store, Arc::new(AtomicCounter::new()), Arc::new(OrderedLocking))
            .unwrap()
    }

    fn balances(store: &AccountStore) -> Vec<Balance> {
        store.iter().map(|account| *account.lock()).collect()
    }

    #[test]
    fn test_single_account_store_rejected() {
        let store = Arc::new(AccountStore::new(1, 10).unwrap());

        let result = TransferEngine::new(
            store,
            Arc::new(AtomicCounter::new()),
            Arc::new(OrderedLocking),
        );
        assert!(matches!(result, Err(LedgerError::InvalidConfig { .. })));
    }

    #[test]
    fn test_transfer_moves_amount_within_balance() {
        let engine = engine(2, 100);
        let mut rng = StdRng::seed_from_u64(7);

        let outcome = engine.transfer(0, 1, &mut rng).unwrap();

        let TransferOutcome::Moved { amount, .. } = outcome else {
            panic!("Expected a move, got {:?}", outcome);
        };
        assert!((1..=100).contains(&amount));
        assert_eq!(balances(engine.store()), vec![100 - amount, 100 + amount]);
        assert_eq!(engine.counter().total(), 1);
    }

    #[test]
    fn test_empty_debit_skipped_but_counted() {
        let engine = engine(3, 0);
        let mut rng = StdRng::seed_from_u64(1);

        let outcome = engine.transfer(2, 0, &mut rng).unwrap();

        assert_eq!(outcome, TransferOutcome::Skipped { debit: 2, credit: 0 });
        assert_eq!(balances(engine.store()), vec![0, 0, 0]);
        assert_eq!(engine.counter().total(), 1);
    }

    #[rstest]
    #[case::same_account(1, 1, LedgerError::same_account(1))]
    #[case::out_of_range(0, 5, LedgerError::index_out_of_range(5, 3))]
    fn test_invalid_transfer_not_counted(
        #[case] debit: usize,
        #[case] credit: usize,
        #[case] expected: LedgerError,
    ) {
        let engine = engine(3, 10);
        let mut rng = StdRng::seed_from_u64(3);

        let result = engine.transfer(debit, credit, &mut rng);

        assert_eq!(result.unwrap_err(), expected);
        assert_eq!(engine.counter().total(), 0);
    }

    #[test]
    fn test_draw_pair_always_distinct_and_in_range() {
        let engine = engine(2, 10);
        let mut rng = StdRng::seed_from_u64(42);

        for _ in 0..1000 {
            let (debit, credit) = engine.draw_pair(&mut rng);
            assert_ne!(debit, credit);
            assert!(debit < 2 && credit < 2);
        }
    }

    #[test]
    fn test_single_thread_conservation_and_non_negativity() {
        let engine = engine(10, 50);
        let mut rng = StdRng::seed_from_u64(99);

        for _ in 0..10_000 {
            engine.transfer_once(&mut rng).unwrap();
        }

        let balances = balances(engine.store());
        assert_eq!(balances.iter().sum::<Balance>(), 500);
        assert!(balances.iter().all(|balance| *balance >= 0));
        assert_eq!(engine.counter().total(), 10_000);
    }

    #[test]
    fn test_loop_returns_immediately_when_already_cancelled() {
        let engine = engine(4, 10);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let attempts = engine.run_transfer_loop(&cancel).unwrap();

        assert_eq!(attempts, 0);
        assert_eq!(engine.counter().total(), 0);
    }

    #[rstest]
    fn test_concurrent_loops_conserve_total(
        #[values(CounterKind::Atomic, CounterKind::Sharded)] counter: CounterKind,
    ) {
        let store = Arc::new(AccountStore::new(20, 1000).unwrap());
        let engine = TransferEngine::new(
            Arc::clone(&store),
            create_counter(counter),
            Arc::from(create_strategy(StrategyType::Ordered)),
        )
        .unwrap();
        let cancel = CancellationToken::new();

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let engine = engine.clone();
                let cancel = cancel.clone();
                thread::spawn(move || engine.run_transfer_loop(&cancel))
            })
            .collect();

        thread::sleep(Duration::from_millis(100));
        cancel.cancel();

        let attempts: u64 = handles
            .into_iter()
            .map(|handle| handle.join().unwrap().unwrap())
            .sum();

        assert_eq!(engine.counter().total(), attempts);
        let balances = balances(&store);
        assert_eq!(balances.iter().sum::<Balance>(), 20_000);
        assert!(balances.iter().all(|balance| *balance >= 0));
    }
}
