//! Ledger Contention Library
//! # Overview
//!
//! This library simulates a ledger of accounts mutated by many concurrent
//! worker threads performing randomized transfers, and provides the machinery
//! that keeps it correct under contention.
//!
//! # Architecture
//!
//! The system is organized into several key components:
//!
//! - [`types`] - Core data types (Account, LedgerError, report rows)
//! - [`cli`] - CLI arguments parsing
//! - [`core`] - Shared-state components:
//!   - [`core::account_store`] - Fixed-size, index-addressed accounts
//!   - [`core::transfer_engine`] - Randomized transfers between two accounts
//!   - [`core::aggregator`] - Exact and approximate totals
//!   - [`core::counter`] - Single-atomic and sharded counters
//!   - [`core::contended_map`] - Populate-or-increment maps
//!   - [`core::simulation`] - Worker and reporter threads with bounded shutdown
//! - [`strategy`] - Pluggable lock acquisition for transfers
//! - [`io`] - CSV output
//!
//! # Lock Order
//!
//! Account index order is the single lock-ordering discipline. Every path that
//! holds more than one account lock (ordered transfers, the snapshot
//! aggregator) acquires in ascending index order, which rules out circular
//! wait. Naive locking breaks the rule on purpose and can deadlock.
//!
//! # Conservation
//!
//! A store of `N` accounts created with balance `B` always sums to `N * B`
//! when observed under every lock at once. No balance ever goes negative.

// Module declarations
pub mod cli;
pub mod core;
pub mod io;
pub mod strategy;
pub mod types;

pub use core::{
    AccountStore, Aggregator, Counter, CountingMap, ShardedCounter, Simulation, TransferEngine,
};
pub use io::{write_balances_csv, StatsWriter};
pub use types::{Account, AccountId, Balance, LedgerError, StatsReport};
