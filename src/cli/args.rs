use crate::core::{CounterKind, MapKind, SimulationConfig};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::time::Duration;

/// Simulate concurrent transfers over a shared ledger
#[derive(Parser, Debug)]
#[command(name = "ledger-sim")]
#[command(about = "Simulate concurrent transfers over a shared ledger", long_about = None)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run transfer workers and print periodic `sum,transfers` reports
    Simulate(SimulateArgs),
    /// Populate contended maps and compare correctness and timing
    Populate(PopulateArgs),
}

/// Arguments for the transfer simulation
#[derive(Args, Debug)]
pub struct SimulateArgs {
    /// Number of accounts in the ledger
    #[arg(long = "accounts", value_name = "N", default_value_t = 100)]
    pub accounts: usize,

    /// Starting balance of every account
    #[arg(long = "initial-balance", value_name = "B", default_value_t = 1000)]
    pub initial_balance: i64,

    /// Number of transfer worker threads
    #[arg(
        long = "workers",
        value_name = "COUNT",
        help = "Number of transfer worker threads (default: CPU cores)"
    )]
    pub workers: Option<usize>,

    /// How long to run before cancelling the workers
    #[arg(long = "duration-secs", value_name = "SECS", default_value_t = 15)]
    pub duration_secs: u64,

    /// Time between reports
    #[arg(long = "interval-ms", value_name = "MS", default_value_t = 1000)]
    pub interval_ms: u64,

    /// Lock acquisition strategy for transfers
    #[arg(
        long = "locking",
        value_name = "STRATEGY",
        default_value = "ordered",
        help = "Locking strategy: 'ordered' (deadlock-free) or 'naive' (may deadlock)"
    )]
    pub locking: StrategyType,

    /// Counter implementation for completed transfers
    #[arg(long = "counter", value_name = "KIND", default_value = "sharded")]
    pub counter: CounterKind,

    /// How long to wait for threads after cancellation
    #[arg(long = "shutdown-timeout-ms", value_name = "MS", default_value_t = 2000)]
    pub shutdown_timeout_ms: u64,

    /// Print every final balance after the run
    #[arg(long = "dump-balances")]
    pub dump_balances: bool,
}

/// Arguments for the contended-map comparison
#[derive(Args, Debug)]
pub struct PopulateArgs {
    /// Number of concurrent tasks
    #[arg(long = "tasks", value_name = "COUNT", default_value_t = 10)]
    pub tasks: usize,

    /// Increments per task
    #[arg(long = "iterations", value_name = "COUNT", default_value_t = 3_000_000)]
    pub iterations: usize,

    /// Size of the key space
    #[arg(long = "keys", value_name = "COUNT", default_value_t = 1000)]
    pub keys: u32,

    /// Map variants to run (default: all)
    #[arg(long = "map", value_name = "KIND")]
    pub maps: Vec<MapKind>,
}

/// Available locking strategies for transfers
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum StrategyType {
    Ordered,
    Naive,
}

impl SimulateArgs {
    /// Create a SimulationConfig from CLI arguments
    ///
    /// A missing worker count falls back to the number of CPU cores. Zero
    /// values are replaced with defaults by `SimulationConfig::new`.
    pub fn to_simulation_config(&self) -> SimulationConfig {
        let default = SimulationConfig::default();
        SimulationConfig::new(
            self.accounts,
            self.initial_balance,
            self.workers.unwrap_or(default.workers),
            Duration::from_millis(self.interval_ms),
            self.locking,
            self.counter,
            Duration::from_millis(self.shutdown_timeout_ms),
        )
    }

    /// How long the run lasts before cancellation
    pub fn duration(&self) -> Duration {
        Duration::from_secs(self.duration_secs)
    }
}

impl PopulateArgs {
    /// The requested map variants, or all of them
    pub fn map_kinds(&self) -> Vec<MapKind> {
        if self.maps.is_empty() {
            MapKind::ALL.to_vec()
        } else {
            self.maps.clone()
        }
    }
}
