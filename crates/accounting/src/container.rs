//! Common contract of the stacked accounting containers.

/// A LIFO stack of accounting generations.
///
/// # Contract
///
/// - `enter()` pushes an empty generation
/// - `pop()` discards the top generation, restoring `line_count()` to its
///   value right before the matching `enter()`
/// - `pop()` on an empty stack panics: a mis-paired enter/pop corrupts the
///   row budget for the rest of the block, so it is never silently ignored
pub trait StackedContainer {
    /// Push an empty generation.
    fn enter(&mut self);

    /// Discard the top generation.
    ///
    /// # Panics
    ///
    /// Panics if no generation is open.
    fn pop(&mut self);

    /// Aggregate line count over all live generations.
    fn line_count(&self) -> u64;

    /// Number of open generations.
    fn depth(&self) -> usize;
}
