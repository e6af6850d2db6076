//! Error types for the ledger contention toolkit
//!
//! This module defines all error types that can occur while building a ledger,
//! moving balances between accounts, aggregating totals, or driving a simulation.
//!
//! # Error Categories
//!
//! - **Addressing Errors**: Account index outside the store, self-transfers
//! - **Configuration Errors**: Zero-sized stores, negative balances, and similar
//! - **Arithmetic Errors**: Totals that would not fit a signed 64-bit balance
//! - **Liveness Errors**: Workers that failed to stop within the shutdown deadline
//! - **Output Errors**: I/O and CSV failures while writing reports

use thiserror::Error;

/// Main error type for the ledger
///
/// Each variant carries enough context to diagnose the failure from a log line.
/// Cancellation is deliberately absent: stopping a worker is an expected exit
/// path, not an error.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LedgerError {
    /// Account index outside `[0, len)`
    ///
    /// Never expected in normal operation. Surfaced immediately and not retried.
    #[error("Account index {index} out of range for store of {len} accounts")]
    IndexOutOfRange {
        /// The requested index
        index: usize,
        /// Number of accounts in the store
        len: usize,
    },

    /// Debit and credit refer to the same account
    ///
    /// Account locks are not reentrant, so a self-transfer is rejected before
    /// any lock is taken.
    #[error("Transfer debit and credit both refer to account {index}")]
    SameAccount {
        /// The duplicated account index
        index: usize,
    },

    /// A configuration value is unusable
    #[error("Invalid configuration for {field}: {message}")]
    InvalidConfig {
        /// Name of the offending field
        field: String,
        /// Why the value was rejected
        message: String,
    },

    /// Arithmetic overflow would occur
    #[error("Balance overflow in {operation}")]
    BalanceOverflow {
        /// Operation that would overflow
        operation: String,
    },

    /// Worker threads did not stop within the shutdown deadline
    ///
    /// Only reachable with naive locking, where circular wait between workers
    /// is possible. The stuck threads are detached, not recovered.
    #[error("{pending} thread(s) still running {timeout_ms} ms after cancellation (likely deadlock)")]
    LivenessFailure {
        /// Threads that never reported completion
        pending: usize,
        /// The deadline that elapsed, in milliseconds
        timeout_ms: u64,
    },

    /// A worker thread panicked
    #[error("Worker {worker} panicked")]
    WorkerPanicked {
        /// Index of the worker
        worker: usize,
    },

    /// I/O error occurred while writing output
    #[error("I/O error: {message}")]
    Io {
        /// Description of the I/O error
        message: String,
    },

    /// CSV serialization error
    #[error("CSV error: {message}")]
    Csv {
        /// Description of the CSV error
        message: String,
    },
}

impl From<std::io::Error> for LedgerError {
    fn from(error: std::io::Error) -> Self {
        LedgerError::Io {
            message: error.to_string(),
        }
    }
}

impl From<csv::Error> for LedgerError {
    fn from(error: csv::Error) -> Self {
        LedgerError::Csv {
            message: error.to_string(),
        }
    }
}

// Helper functions for creating common errors

impl LedgerError {
    /// Create an IndexOutOfRange error
    pub fn index_out_of_range(index: usize, len: usize) -> Self {
        LedgerError::IndexOutOfRange { index, len }
    }

    /// Create a SameAccount error
    pub fn same_account(index: usize) -> Self {
        LedgerError::SameAccount { index }
    }

    /// Create an InvalidConfig error
    pub fn invalid_config(field: &str, message: impl Into<String>) -> Self {
        LedgerError::InvalidConfig {
            field: field.to_string(),
            message: message.into(),
        }
    }

    /// Create a BalanceOverflow error
    pub fn balance_overflow(operation: &str) -> Self {
        LedgerError::BalanceOverflow {
            operation: operation.to_string(),
        }
    }

    /// Create a LivenessFailure error
    pub fn liveness_failure(pending: usize, timeout_ms: u64) -> Self {
        LedgerError::LivenessFailure {
            pending,
            timeout_ms,
        }
    }

    /// Create a WorkerPanicked error
    pub fn worker_panicked(worker: usize) -> Self {
        LedgerError::WorkerPanicked { worker }
    }
}
