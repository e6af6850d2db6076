//! CSV format handling for simulation output
//!
//! This module centralizes all CSV output concerns:
//! - `StatsWriter` for streaming periodic reports as they arrive
//! - Balance dumps in account order
//! - Contended-map populate results
//!
//! Headers come from the serde field names of the row types.

use crate::types::{Balance, BalanceRow, LedgerError, PopulateReport, StatsReport};
use csv::Writer;
use std::io::Write;

/// Streaming writer for periodic stats rows
///
/// Flushes after every row so a consumer tailing the output sees each report
/// as soon as it is taken.
pub struct StatsWriter<W: Write> {
    writer: Writer<W>,
}

impl<W: Write> StatsWriter<W> {
    pub fn new(output: W) -> Self {
        StatsWriter {
            writer: Writer::from_writer(output),
        }
    }

    /// Write one report row (the header precedes the first row)
    pub fn write(&mut self, report: &StatsReport) -> Result<(), LedgerError> {
        self.writer.serialize(report)?;
        self.writer.flush()?;
        Ok(())
    }
}

/// Write every balance as `account,balance`, in account order
pub fn write_balances_csv(
    balances: &[Balance],
    output: &mut dyn Write,
) -> Result<(), LedgerError> {
    let mut writer = Writer::from_writer(output);

    for (account, balance) in balances.iter().enumerate() {
        writer.serialize(BalanceRow {
            account,
            balance: *balance,
        })?;
    }

    writer.flush()?;
    Ok(())
}

/// Write populate results as `variant,elapsed_ns,total,expected`
pub fn write_populate_csv(
    reports: &[PopulateReport],
    output: &mut dyn Write,
) -> Result<(), LedgerError> {
    let mut writer = Writer::from_writer(output);

    for report in reports {
        writer.serialize(report)?;
    }

    writer.flush()?;
    Ok(())
}
