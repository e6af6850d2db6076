//! Benchmark suite for contended counters, maps and snapshots
//!
//! Compares the coordination primitives under the same workload using the
//! divan benchmarking framework. Correctness of every variant is covered by
//! the test suite; these only measure cost.
//!
//! # Running Benchmarks
//!
//! ```bash
//! # Run all benchmarks
//! cargo bench
//! ```

use ledger_contention::core::{
    create_counter, populate, AccountStore, Aggregator, CounterKind, MapKind,
};
use std::sync::Arc;

fn main() {
    divan::main();
}

/// Single increments from 1, 4 and all-core threads sharing one counter
#[divan::bench(args = [CounterKind::Atomic, CounterKind::Sharded], threads = [1, 4, 0])]
fn counter_increment(bencher: divan::Bencher, kind: CounterKind) {
    let counter = create_counter(kind);

    bencher.bench(|| counter.increment());
}

/// One populate run of 4 tasks x 10,000 increments over 1,000 keys
#[divan::bench(args = MapKind::ALL, sample_count = 20)]
fn map_populate(kind: MapKind) {
    populate(kind, 4, 10_000, 1000).expect("Populate failed");
}

/// Whole-set lock and sum over stores of increasing size
#[divan::bench(args = [100, 1_000, 15_000])]
fn snapshot_total(bencher: divan::Bencher, accounts: usize) {
    let store = Arc::new(AccountStore::new(accounts, 1000).expect("Failed to create store"));
    let aggregator = Aggregator::new(store);

    bencher.bench(|| aggregator.snapshot_total());
}

/// One-lock-at-a-time sum over the same stores
#[divan::bench(args = [100, 1_000, 15_000])]
fn approximate_total(bencher: divan::Bencher, accounts: usize) {
    let store = Arc::new(AccountStore::new(accounts, 1000).expect("Failed to create store"));
    let aggregator = Aggregator::new(store);

    bencher.bench(|| aggregator.approximate_total());
}
