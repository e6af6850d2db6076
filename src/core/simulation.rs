//! Multi-threaded transfer simulation with periodic reporting
//!
//! This module provides the `Simulation` driver: it builds an account store,
//! starts one transfer worker per configured thread, and starts a reporter
//! thread that takes an exact snapshot on a fixed interval.
//!
//! # Architecture
//!
//! ```text
//! Simulation
//!     ├── Arc<AccountStore>            (shared balances)
//!     ├── Arc<dyn Counter>             (completed-attempt count)
//!     ├── N × TransferEngine thread    (run_transfer_loop until cancelled)
//!     ├── reporter thread              (Aggregator::snapshot_total every interval)
//!     └── CancellationToken            (cooperative stop signal)
//! ```
//!
//! # Shutdown
//!
//! Every thread sends its index on a completion channel as it exits, whether
//! it returns or unwinds.
//! [`Simulation::shutdown`] cancels the token and waits on that channel with a
//! deadline. With ordered locking all threads finish promptly. With naive
//! locking, workers may be stuck in a circular wait; shutdown then reports
//! `LivenessFailure` and detaches them instead of hanging.

use super::{create_counter, AccountStore, Aggregator, Counter, CounterKind, TransferEngine};
use crate::cli::StrategyType;
use crate::strategy::create_strategy;
use crate::types::{Balance, LedgerError, StatsReport};
use crossbeam::channel::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

/// Configuration for a simulation run
#[derive(Clone, Debug)]
pub struct SimulationConfig {
    /// Number of accounts in the store
    pub accounts: usize,
    /// Starting balance of every account
    pub initial_balance: Balance,
    /// Number of transfer worker threads
    pub workers: usize,
    /// Time between reports
    pub report_interval: Duration,
    /// Locking strategy used by every worker
    pub strategy: StrategyType,
    /// Counter implementation for completed attempts
    pub counter: CounterKind,
    /// How long shutdown waits for threads to stop
    pub shutdown_timeout: Duration,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            accounts: 100,
            initial_balance: 1000,
            workers: num_cpus::get(),
            report_interval: Duration::from_secs(1),
            strategy: StrategyType::Ordered,
            counter: CounterKind::Sharded,
            shutdown_timeout: Duration::from_secs(2),
        }
    }
}

impl SimulationConfig {
    /// Create a config, substituting defaults for zero workers or durations
    pub fn new(
        accounts: usize,
        initial_balance: Balance,
        workers: usize,
        report_interval: Duration,
        strategy: StrategyType,
        counter: CounterKind,
        shutdown_timeout: Duration,
    ) -> Self {
        let default = Self::default();

        let workers = if workers == 0 {
            tracing::warn!(
                "Invalid workers ({}), using default ({})",
                workers,
                default.workers
            );
            default.workers
        } else {
            workers
        };

        let report_interval = if report_interval.is_zero() {
            tracing::warn!(
                "Invalid report_interval ({:?}), using default ({:?})",
                report_interval,
                default.report_interval
            );
            default.report_interval
        } else {
            report_interval
        };

        let shutdown_timeout = if shutdown_timeout.is_zero() {
            tracing::warn!(
                "Invalid shutdown_timeout ({:?}), using default ({:?})",
                shutdown_timeout,
                default.shutdown_timeout
            );
            default.shutdown_timeout
        } else {
            shutdown_timeout
        };

        Self {
            accounts,
            initial_balance,
            workers,
            report_interval,
            strategy,
            counter,
            shutdown_timeout,
        }
    }
}

/// Totals of a cleanly stopped simulation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimulationSummary {
    /// Attempts reported by the workers themselves
    pub attempts: u64,
    /// Counter total after every worker stopped
    pub counted: u64,
    /// Exact total after every worker stopped
    pub final_total: Balance,
}

/// A running simulation
#[derive(Debug)]
pub struct Simulation {
    store: Arc<AccountStore>,
    counter: Arc<dyn Counter>,
    aggregator: Aggregator,
    cancel: CancellationToken,
    workers: Vec<JoinHandle<Result<u64, LedgerError>>>,
    reporter: Option<JoinHandle<()>>,
    finished: Receiver<usize>,
    shutdown_timeout: Duration,
}

impl Simulation {
    /// Build the store and start every worker and the reporter
    ///
    /// Reports are sent to `reports`; the reporter stops quietly once the
    /// receiving side is dropped.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` or `BalanceOverflow` if the store or engine
    /// cannot be built.
    pub fn start(
        config: &SimulationConfig,
        reports: Sender<StatsReport>,
    ) -> Result<Self, LedgerError> {
        if config.workers == 0 {
            return Err(LedgerError::invalid_config("workers", "must be at least 1"));
        }
        let store = Arc::new(AccountStore::new(config.accounts, config.initial_balance)?);
        let counter = create_counter(config.counter);
        let engine = TransferEngine::new(
            Arc::clone(&store),
            Arc::clone(&counter),
            Arc::from(create_strategy(config.strategy)),
        )?;
        let aggregator = Aggregator::new(Arc::clone(&store));
        let cancel = CancellationToken::new();
        let (finished_tx, finished) = channel::unbounded();

        tracing::info!(
            accounts = config.accounts,
            initial_balance = config.initial_balance,
            workers = config.workers,
            strategy = ?config.strategy,
            counter = ?config.counter,
            "starting simulation"
        );

        let workers = (0..config.workers)
            .map(|worker| {
                let engine = engine.clone();
                let cancel = cancel.clone();
                let finished = FinishedSignal::new(worker, finished_tx.clone());
                thread::spawn(move || {
                    let _finished = finished;
                    let result = engine.run_transfer_loop(&cancel);
                    if let Err(e) = &result {
                        tracing::error!(worker, error = %e, "transfer worker failed");
                    }
                    result
                })
            })
            .collect();

        let reporter = {
            let aggregator = aggregator.clone();
            let counter = Arc::clone(&counter);
            let cancel = cancel.clone();
            let interval = config.report_interval;
            let finished = FinishedSignal::new(config.workers, finished_tx);
            thread::spawn(move || {
                let _finished = finished;
                run_reporter(&aggregator, counter.as_ref(), &cancel, interval, &reports);
            })
        };

        Ok(Simulation {
            store,
            counter,
            aggregator,
            cancel,
            workers,
            reporter: Some(reporter),
            finished,
            shutdown_timeout: config.shutdown_timeout,
        })
    }

    /// The shared store
    pub fn store(&self) -> &Arc<AccountStore> {
        &self.store
    }

    /// The shared counter
    pub fn counter(&self) -> &Arc<dyn Counter> {
        &self.counter
    }

    /// Aggregator over the shared store
    pub fn aggregator(&self) -> &Aggregator {
        &self.aggregator
    }

    /// Take one report on the calling thread
    pub fn report(&self) -> Result<StatsReport, LedgerError> {
        take_report(&self.aggregator, self.counter.as_ref())
    }

    /// Cancel every thread and wait for them within the shutdown timeout
    ///
    /// # Errors
    ///
    /// - `LivenessFailure` if any thread is still running at the deadline;
    ///   the stuck threads are detached
    /// - `WorkerPanicked` if a worker panicked
    /// - Any error a worker returned
    pub fn shutdown(mut self) -> Result<SimulationSummary, LedgerError> {
        self.cancel.cancel();

        let workers = std::mem::take(&mut self.workers);
        let expected = workers.len() + 1;
        let deadline = Instant::now() + self.shutdown_timeout;
        let mut stopped = 0;
        while stopped < expected {
            match self.finished.recv_deadline(deadline) {
                Ok(_) => stopped += 1,
                Err(_) => break,
            }
        }

        if stopped < expected {
            let pending = expected - stopped;
            let timeout_ms =
                u64::try_from(self.shutdown_timeout.as_millis()).unwrap_or(u64::MAX);
            tracing::error!(pending, timeout_ms, "threads did not stop after cancellation");
            return Err(LedgerError::liveness_failure(pending, timeout_ms));
        }

        let mut attempts = 0u64;
        for (worker, handle) in workers.into_iter().enumerate() {
            attempts += handle
                .join()
                .map_err(|_| LedgerError::worker_panicked(worker))??;
        }
        if let Some(reporter) = self.reporter.take() {
            reporter
                .join()
                .map_err(|_| LedgerError::worker_panicked(expected - 1))?;
        }

        let summary = SimulationSummary {
            attempts,
            counted: self.counter.total(),
            final_total: self.aggregator.snapshot_total()?,
        };
        tracing::info!(
            attempts = summary.attempts,
            final_total = summary.final_total,
            "simulation stopped"
        );
        Ok(summary)
    }
}

// Dropping without `shutdown` still stops every thread; the handles are detached.
impl Drop for Simulation {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Reports a thread's exit on drop, including when it unwinds
struct FinishedSignal {
    id: usize,
    tx: Sender<usize>,
}

impl FinishedSignal {
    fn new(id: usize, tx: Sender<usize>) -> Self {
        FinishedSignal { id, tx }
    }
}

impl Drop for FinishedSignal {
    fn drop(&mut self) {
        let _ = self.tx.send(self.id);
    }
}

fn take_report(
    aggregator: &Aggregator,
    counter: &dyn Counter,
) -> Result<StatsReport, LedgerError> {
    let started = Instant::now();
    let sum = aggregator.snapshot_total()?;
    let snapshot_micros = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
    Ok(StatsReport {
        sum,
        transfers: counter.total(),
        snapshot_micros,
    })
}

fn run_reporter(
    aggregator: &Aggregator,
    counter: &dyn Counter,
    cancel: &CancellationToken,
    interval: Duration,
    reports: &Sender<StatsReport>,
) {
    let ticker = channel::tick(interval);
    loop {
        match take_report(aggregator, counter) {
            Ok(report) => {
                tracing::info!(
                    sum = report.sum,
                    transfers = report.transfers,
                    snapshot_micros = report.snapshot_micros,
                    "report"
                );
                if reports.send(report).is_err() {
                    break;
                }
            }
            Err(e) => tracing::error!(error = %e, "snapshot failed"),
        }

        // Sleep until the next tick, waking early on cancellation
        while ticker
            .recv_timeout(Duration::from_millis(50).min(interval))
            .is_err()
        {
            if cancel.is_cancelled() {
                return;
            }
        }
        if cancel.is_cancelled() {
            return;
        }
    }
}
