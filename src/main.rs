//! Ledger Simulation CLI
//!
//! Command-line driver for the concurrent ledger.
//!
//! # Usage
//!
//! ```bash
//! cargo run -- simulate > stats.csv
//! cargo run -- simulate --accounts 15000 --workers 8 --duration-secs 5
//! cargo run -- simulate --locking naive --accounts 4 --duration-secs 2
//! cargo run -- populate --tasks 10 --iterations 100000
//! ```
//!
//! `simulate` starts the transfer workers and prints one `sum,transfers,
//! snapshot_micros` row per report interval to stdout. `populate` runs each
//! contended-map variant and prints `variant,elapsed_ns,total,expected` rows.
//! Logs go to stderr; set `RUST_LOG` to adjust verbosity.
//!
//! # Exit Codes
//!
//! - 0: Success
//! - 1: Error (invalid configuration, output failure, worker failure)
//! - 2: Liveness failure (workers did not stop; only expected with naive locking)

use crossbeam::channel;
use ledger_contention::cli::{self, Command, PopulateArgs, SimulateArgs};
use ledger_contention::core::{populate, Simulation};
use ledger_contention::io::{write_balances_csv, write_populate_csv, StatsWriter};
use ledger_contention::LedgerError;
use std::process;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = cli::parse_args();

    let result = match args.command {
        Command::Simulate(simulate) => run_simulation(&simulate),
        Command::Populate(populate) => run_populate(&populate),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        let code = match e {
            LedgerError::LivenessFailure { .. } => 2,
            _ => 1,
        };
        process::exit(code);
    }
}

fn run_simulation(args: &SimulateArgs) -> Result<(), LedgerError> {
    let config = args.to_simulation_config();
    let (reports_tx, reports_rx) = channel::unbounded();
    let simulation = Simulation::start(&config, reports_tx)?;

    let stdout = std::io::stdout();
    let mut writer = StatsWriter::new(stdout.lock());
    let stop = channel::after(args.duration());
    loop {
        channel::select! {
            recv(reports_rx) -> report => match report {
                Ok(report) => writer.write(&report)?,
                Err(_) => break,
            },
            recv(stop) -> _ => break,
        }
    }
    drop(writer);

    let aggregator = simulation.aggregator().clone();
    simulation.shutdown()?;

    // Every worker has stopped, so this cannot block on a stuck lock
    if args.dump_balances {
        write_balances_csv(&aggregator.snapshot_balances(), &mut std::io::stdout())?;
    }
    Ok(())
}

fn run_populate(args: &PopulateArgs) -> Result<(), LedgerError> {
    let reports = args
        .map_kinds()
        .into_iter()
        .map(|kind| populate(kind, args.tasks, args.iterations, args.keys))
        .collect::<Result<Vec<_>, _>>()?;

    write_populate_csv(&reports, &mut std::io::stdout())
}
