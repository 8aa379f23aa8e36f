//! Line-countable operations.

use std::hash::{Hash, Hasher};
use std::sync::OnceLock;

/// Anything that can report how many trace rows it represents.
pub trait LineCountable {
    /// Number of trace rows.
    fn line_count(&self) -> u64;
}

/// A module operation identified by equality over its semantic inputs.
///
/// Implementors compute their row count from those inputs; wrap them in
/// [`Counted`] to memoize the result.
pub trait ModuleOperation: Eq + Hash {
    /// Compute the number of trace rows. May be expensive.
    fn compute_line_count(&self) -> u64;
}

/// An operation with a lazily computed, memoized line count.
///
/// Equality and hashing delegate to the wrapped operation, so the memo never
/// affects set membership.
#[derive(Debug)]
pub struct Counted<O> {
    op: O,
    line_count: OnceLock<u64>,
}

impl<O> Counted<O> {
    /// Wrap an operation. Its line count is not computed until first asked.
    pub fn new(op: O) -> Self {
        Self {
            op,
            line_count: OnceLock::new(),
        }
    }

    /// The wrapped operation.
    pub fn operation(&self) -> &O {
        &self.op
    }

    /// Whether the line count has already been computed.
    pub fn is_counted(&self) -> bool {
        self.line_count.get().is_some()
    }
}

impl<O: ModuleOperation> LineCountable for Counted<O> {
    fn line_count(&self) -> u64 {
        *self.line_count.get_or_init(|| self.op.compute_line_count())
    }
}

impl<O: PartialEq> PartialEq for Counted<O> {
    fn eq(&self, other: &Self) -> bool {
        self.op == other.op
    }
}

impl<O: Eq> Eq for Counted<O> {}

impl<O: Hash> Hash for Counted<O> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.op.hash(state);
    }
}

impl<O> From<O> for Counted<O> {
    fn from(op: O) -> Self {
        Self::new(op)
    }
}
