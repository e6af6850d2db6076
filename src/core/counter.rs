//! Counters for completed-transfer counts
//!
//! Two implementations of [`Counter`]:
//!
//! - [`AtomicCounter`]: one shared `AtomicU64`. Every increment contends on the
//!   same cache line.
//! - [`ShardedCounter`]: a fixed array of cache-padded slots. Each thread is
//!   assigned a slot once, so concurrent increments from different threads
//!   usually touch different cache lines. Slots are combined only on read.
//!
//! Both use `Ordering::Relaxed`. A counter does not publish other memory, and
//! readers that need an exact total synchronize with the writers through some
//! other edge (a thread join, a lock, a channel).

use super::traits::Counter;
use clap::ValueEnum;
use crossbeam::utils::CachePadded;
use std::cell::Cell;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

/// Default number of slots in a sharded counter
pub const DEFAULT_SHARDS: usize = 64;

/// Available counter implementations
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum CounterKind {
    Atomic,
    Sharded,
}

/// Create a counter of the requested kind
pub fn create_counter(kind: CounterKind) -> Arc<dyn Counter> {
    match kind {
        CounterKind::Atomic => Arc::new(AtomicCounter::new()),
        CounterKind::Sharded => Arc::new(ShardedCounter::new()),
    }
}

/// Single shared atomic counter
#[derive(Debug, Default)]
pub struct AtomicCounter {
    value: AtomicU64,
}

impl AtomicCounter {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Counter for AtomicCounter {
    fn add(&self, n: u64) {
        self.value.fetch_add(n, Ordering::Relaxed);
    }

    fn total(&self) -> u64 {
        self.value.load(Ordering::Relaxed)
    }
}

// Round-robin source of per-thread slot numbers, shared by all sharded counters.
static NEXT_SLOT: AtomicUsize = AtomicUsize::new(0);

thread_local! {
    static THREAD_SLOT: Cell<Option<usize>> = const { Cell::new(None) };
}

fn thread_slot() -> usize {
    THREAD_SLOT.with(|slot| match slot.get() {
        Some(index) => index,
        None => {
            let index = NEXT_SLOT.fetch_add(1, Ordering::Relaxed);
            slot.set(Some(index));
            index
        }
    })
}

/// Multi-slot counter combined on read
///
/// No individual slot value is meaningful.
#[derive(Debug)]
pub struct ShardedCounter {
    slots: Box<[CachePadded<AtomicU64>]>,
}

impl ShardedCounter {
    /// Create a counter with [`DEFAULT_SHARDS`] slots
    pub fn new() -> Self {
        Self::with_shards(DEFAULT_SHARDS)
    }

    /// Create a counter with `shards` slots (at least one)
    pub fn with_shards(shards: usize) -> Self {
        let slots = (0..shards.max(1))
            .map(|_| CachePadded::new(AtomicU64::new(0)))
            .collect();
        ShardedCounter { slots }
    }

    /// Number of slots
    pub fn shards(&self) -> usize {
        self.slots.len()
    }
}

impl Default for ShardedCounter {
    fn default() -> Self {
        Self::new()
    }
}

impl Counter for ShardedCounter {
    fn add(&self, n: u64) {
        let index = thread_slot() % self.slots.len();
        self.slots[index].fetch_add(n, Ordering::Relaxed);
    }

    fn total(&self) -> u64 {
        self.slots
            .iter()
            .map(|slot| slot.load(Ordering::Relaxed))
            .sum()
    }
}
