//! I/O module
//!
//! Handles CSV output of reports and balance dumps.
//!
//! # Components
//!
//! - `csv_format` - CSV serialization of stats rows, populate rows and balances

pub mod csv_format;

pub use csv_format::{write_balances_csv, write_populate_csv, StatsWriter};
