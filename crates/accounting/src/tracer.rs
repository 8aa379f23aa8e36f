//! Interface to the external line-counting tracer.

use std::time::Duration;
use thiserror::Error;
use tracelimit_types::{Hash, LineCounts, Transaction};

/// Errors reported by the tracer while executing or retracting a transaction.
///
/// Any of these means the cost of the transaction is unknown. Callers must
/// never treat them as "fits the budget".
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TracerError {
    /// Execution did not finish in time.
    #[error("Tracing of transaction {tx} timed out after {after:?}")]
    Timeout {
        /// Transaction being traced.
        tx: Hash,
        /// Time spent before giving up.
        after: Duration,
    },

    /// Execution failed.
    #[error("Tracing of transaction {tx} failed: {reason}")]
    Execution {
        /// Transaction being traced.
        tx: Hash,
        /// Failure reason from the execution client.
        reason: String,
    },

    /// The tracer cannot serve requests.
    #[error("Tracer unavailable: {0}")]
    Unavailable(String),
}

/// The external tracer that executes transactions and counts trace lines.
///
/// The selector drives one transaction at a time: `execute`, then
/// `cumulative_line_counts`, then either `commit` or `retract`.
pub trait LineCountTracer {
    /// Execute a candidate transaction, recording its rows in a new trial.
    fn execute(&mut self, tx: &Transaction) -> Result<(), TracerError>;

    /// Cumulative per-module line counts including every live trial.
    fn cumulative_line_counts(&self) -> Result<LineCounts, TracerError>;

    /// Keep the rows of the last executed transaction.
    fn commit(&mut self, _tx: &Transaction) -> Result<(), TracerError> {
        Ok(())
    }

    /// Undo the rows of the last executed transaction.
    fn retract(&mut self, tx: &Transaction) -> Result<(), TracerError>;
}
