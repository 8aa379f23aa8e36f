//! Core types for trace line-limit admission control.
//!
//! Shared by the accounting containers, the limits configuration, the
//! selector and the pool validators.

mod hash;
mod identifiers;
mod line_counts;
mod transaction;

pub use hash::{Hash, HexError};
pub use identifiers::{Address, BlockHeight, ModuleName};
pub use line_counts::LineCounts;
pub use transaction::Transaction;
