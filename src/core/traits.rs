//! Core traits for counters and contended maps
//!
//! These traits let the transfer engine, the simulation driver and the
//! contention harness work against interchangeable implementations, so the
//! single-atomic and sharded variants can be compared under the same workload.

use std::hash::Hash;

/// Trait for monotonically increasing counters
///
/// Only the aggregate is a contract. A total read after every increment has
/// happened-before the read (for example after joining the incrementing
/// threads) equals the number of increments exactly.
pub trait Counter: Send + Sync + std::fmt::Debug {
    /// Add `n` to the counter
    fn add(&self, n: u64);

    /// Add one to the counter
    fn increment(&self) {
        self.add(1);
    }

    /// Combine all partial counts
    fn total(&self) -> u64;
}

/// Trait for maps of per-key counts populated concurrently
///
/// Implementations that are correct make the "create if absent, then
/// increment" step atomic per key. [`SplitLookupMap`](super::SplitLookupMap)
/// and [`LockedSplitLookupMap`](super::LockedSplitLookupMap) intentionally do
/// not, and exist to demonstrate the lost-update race.
pub trait CountingMap<K>: Send + Sync
where
    K: Eq + Hash,
{
    /// Create the accumulator for `key` if absent, then increment it
    fn get_or_create_and_increment(&self, key: K);

    /// Current count for `key` (zero if absent)
    fn count(&self, key: &K) -> u64;

    /// Sum of all counts
    fn total(&self) -> u64;

    /// Number of distinct keys
    fn key_count(&self) -> usize;

    /// Short name for reports
    fn name(&self) -> &'static str;
}
