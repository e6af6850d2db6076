//! Timed harness for running the same operation on many threads at once
//!
//! Tasks are spawned first and parked on a start barrier, so thread creation
//! is excluded from the measurement. The clock starts when the barrier
//! releases and stops once every task has been joined.

use super::contended_map::{create_map, MapKind};
use crate::types::{LedgerError, PopulateReport};
use rand::Rng;
use std::sync::Barrier;
use std::thread;
use std::time::{Duration, Instant};

/// Run `op(task_index)` on `tasks` threads released together
///
/// # Errors
///
/// - `InvalidConfig` if `tasks` is zero
/// - `WorkerPanicked` if any task panicked
pub fn run_contended<F>(tasks: usize, op: F) -> Result<Duration, LedgerError>
where
    F: Fn(usize) + Sync,
{
    if tasks == 0 {
        return Err(LedgerError::invalid_config("tasks", "must be at least 1"));
    }

    let go = Barrier::new(tasks + 1);
    thread::scope(|scope| {
        let handles: Vec<_> = (0..tasks)
            .map(|task| {
                let (go, op) = (&go, &op);
                scope.spawn(move || {
                    go.wait();
                    op(task);
                })
            })
            .collect();

        go.wait();
        let started = Instant::now();
        for (task, handle) in handles.into_iter().enumerate() {
            handle
                .join()
                .map_err(|_| LedgerError::worker_panicked(task))?;
        }
        Ok(started.elapsed())
    })
}

/// Populate a fresh map of `kind` from `tasks` threads
///
/// Each task performs `iterations` increments on keys drawn uniformly from
/// `[0, keys)`. The report carries the observed total next to the number of
/// increments issued, so lost updates show up as `total < expected`.
pub fn populate(
    kind: MapKind,
    tasks: usize,
    iterations: usize,
    keys: u32,
) -> Result<PopulateReport, LedgerError> {
    if keys == 0 {
        return Err(LedgerError::invalid_config("keys", "must be at least 1"));
    }

    let map = create_map::<u32>(kind);
    let elapsed = run_contended(tasks, |_| {
        let mut rng = rand::thread_rng();
        for _ in 0..iterations {
            map.get_or_create_and_increment(rng.gen_range(0..keys));
        }
    })?;

    let report = PopulateReport {
        variant: map.name().to_string(),
        elapsed_ns: u64::try_from(elapsed.as_nanos()).unwrap_or(u64::MAX),
        total: map.total(),
        expected: (tasks as u64).saturating_mul(iterations as u64),
    };
    tracing::debug!(
        variant = %report.variant,
        elapsed_ns = report.elapsed_ns,
        total = report.total,
        expected = report.expected,
        "populate run finished"
    );
    Ok(report)
}
