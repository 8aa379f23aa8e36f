//! Trace line-limit transaction selection.
//!
//! Block building executes candidate transactions against a tracer that
//! reports cumulative rows per trace module. The selector keeps each block
//! within the configured per-module limits:
//!
//! | Result | Meaning | Cached |
//! |--------|---------|--------|
//! | `Selected` | fits the transaction and block budgets | - |
//! | `TxModuleLineCountOverflow` | too large for any block | yes |
//! | `TxModuleLineCountOverflowCached` | known overflow, not executed | - |
//! | `BlockModuleLineCountFull` | no room left in this block | no |
//!
//! Known overflows go into a shared [`RejectionCache`] so block building
//! skips them without execution and pool admission refuses them through
//! [`LineCountPoolValidator`].

mod block;
mod cache;
mod error;
mod result;
mod selector;
mod validator;

pub use block::{BlockBuilder, BuiltBlock};
pub use cache::{CachedRejection, RejectionCache};
pub use error::SelectorError;
pub use result::{SelectionResult, SelectorPhase};
pub use selector::TraceLineLimitSelector;
pub use validator::{
    DenyListValidator, LineCountPoolValidator, PoolTransactionValidator, ValidatorChain,
};
