//! Report rows emitted by the simulation driver and the contention harness

use serde::Serialize;

/// One periodic observation of a running simulation
///
/// `sum` is taken under the whole-set lock, so it always equals the
/// store's expected total. `transfers` is read from the shared counter
/// without any lock and may lag in-flight workers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatsReport {
    /// Exact total of all balances
    pub sum: i64,
    /// Transfer attempts completed so far
    pub transfers: u64,
    /// Time spent holding every account lock, in microseconds
    pub snapshot_micros: u64,
}

/// Outcome of one contended-map population run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PopulateReport {
    /// Map variant name
    pub variant: String,
    /// Wall time between releasing the tasks and the last task finishing
    pub elapsed_ns: u64,
    /// Sum of all per-key counts after the run
    pub total: u64,
    /// Number of increments issued
    pub expected: u64,
}

/// Final balance of one account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BalanceRow {
    pub account: usize,
    pub balance: i64,
}
