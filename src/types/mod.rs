//! Types module
//!
//! Contains core data structures used throughout the crate.
//! This module organizes types into logical submodules:
//! - `account`: The lock-guarded balance cell
//! - `report`: Rows emitted by the simulation driver and contention harness
//! - `error`: Error types for the ledger

pub mod account;
pub mod error;
pub mod report;

pub use account::{Account, AccountId, Balance};
pub use error::LedgerError;
pub use report::{BalanceRow, PopulateReport, StatsReport};
