//! Error types for the selector.

use thiserror::Error;
use tracelimit_accounting::TracerError;
use tracelimit_types::ModuleName;

/// Errors that abort block building.
///
/// Ordinary budget rejections are not errors; they are reported as
/// [`SelectionResult`](crate::SelectionResult) values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectorError {
    /// The tracer reported a module with no configured limit.
    ///
    /// Treating it as unbounded could produce an unprovable block.
    #[error("Module {module} is not defined in the line count limits")]
    ModuleNotDefined {
        /// Unconfigured module.
        module: ModuleName,
    },

    /// A cumulative count dropped below the committed baseline.
    #[error("Line count of module {module} went backwards from {before} to {after}")]
    LineCountRegression {
        /// Affected module.
        module: ModuleName,
        /// Committed baseline.
        before: u64,
        /// Count reported by the tracer.
        after: u64,
    },

    /// The tracer failed; the transaction's cost is unknown.
    #[error(transparent)]
    Tracer(#[from] TracerError),
}
