//! Count-only stacked container.

use crate::StackedContainer;

/// Stacked container that keeps only per-generation row totals.
///
/// Used by modules whose rows are a pure function of how many times
/// something happened, where keeping the operations themselves is wasted
/// memory. Starts with no open generation.
#[derive(Debug, Default)]
pub struct CountOnly {
    generations: Vec<u64>,
    line_count: u64,
}

impl CountOnly {
    /// Create a container with no open generation.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `rows` to the top generation.
    ///
    /// # Panics
    ///
    /// Panics if no generation is open.
    pub fn add(&mut self, rows: u64) {
        let top = self
            .generations
            .last_mut()
            .unwrap_or_else(|| panic!("CountOnly::add called with no open generation"));
        *top += rows;
        self.line_count += rows;
    }

    /// Fold the top generation into the one below it.
    ///
    /// `line_count()` is unchanged; the folded rows can no longer be popped
    /// on their own.
    ///
    /// # Panics
    ///
    /// Panics if fewer than two generations are open.
    pub fn commit(&mut self) {
        assert!(
            self.generations.len() >= 2,
            "CountOnly::commit needs a generation to fold into (depth {})",
            self.generations.len()
        );
        if let Some(top) = self.generations.pop() {
            if let Some(below) = self.generations.last_mut() {
                *below += top;
            }
        }
    }

    /// Rows held by the top generation.
    pub fn top(&self) -> Option<u64> {
        self.generations.last().copied()
    }
}

impl StackedContainer for CountOnly {
    fn enter(&mut self) {
        self.generations.push(0);
    }

    fn pop(&mut self) {
        let popped = self
            .generations
            .pop()
            .unwrap_or_else(|| panic!("CountOnly::pop called on an empty stack"));
        self.line_count -= popped;
    }

    fn line_count(&self) -> u64 {
        self.line_count
    }

    fn depth(&self) -> usize {
        self.generations.len()
    }
}
