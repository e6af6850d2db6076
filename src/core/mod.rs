//! Core concurrency module
//!
//! This module contains the shared-state components:
//! - `traits` - `Counter` and `CountingMap` abstractions
//! - `account_store` - Fixed-size store of lock-guarded accounts
//! - `transfer_engine` - Randomized two-account transfers
//! - `aggregator` - Exact (whole-set lock) and approximate totals
//! - `counter` - Single-atomic and sharded counters
//! - `contended_map` - Per-key accumulator maps, atomic and not
//! - `contention` - Timed harness for contended operations
//! - `simulation` - Worker and reporter threads with bounded shutdown

pub mod account_store;
pub mod aggregator;
pub mod contended_map;
pub mod contention;
pub mod counter;
pub mod simulation;
pub mod traits;
pub mod transfer_engine;

pub use account_store::AccountStore;
pub use aggregator::Aggregator;
pub use contended_map::{
    create_map, ConcurrentAccumulatorMap, LockedAccumulatorMap, LockedSplitLookupMap, MapKind,
    MergeCountMap, SplitLookupMap,
};
pub use contention::{populate, run_contended};
pub use counter::{create_counter, AtomicCounter, CounterKind, ShardedCounter};
pub use simulation::{Simulation, SimulationConfig, SimulationSummary};
pub use traits::{Counter, CountingMap};
pub use transfer_engine::{TransferEngine, TransferOutcome};
