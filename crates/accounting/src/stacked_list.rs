//! List-preserving stacked container.

use crate::{LineCountable, StackedContainer};

/// One generation of a [`StackedList`].
#[derive(Debug)]
struct Generation<E> {
    items: Vec<E>,
    /// Sum of the line counts of `items`.
    line_count: u64,
}

impl<E> Generation<E> {
    fn new() -> Self {
        Self {
            items: Vec::new(),
            line_count: 0,
        }
    }
}

/// Stacked container preserving every added operation, duplicates included.
///
/// Models nested speculative trials, e.g. a transaction's rows nested inside
/// a block's rows. Starts with no open generation.
#[derive(Debug)]
pub struct StackedList<E> {
    generations: Vec<Generation<E>>,
    /// Running total over all generations.
    line_count: u64,
}

impl<E: LineCountable> StackedList<E> {
    /// Create an empty list with no open generation.
    pub fn new() -> Self {
        Self {
            generations: Vec::new(),
            line_count: 0,
        }
    }

    /// Append an operation to the top generation.
    ///
    /// # Panics
    ///
    /// Panics if no generation is open.
    pub fn add(&mut self, op: E) {
        let count = op.line_count();
        let top = self
            .generations
            .last_mut()
            .unwrap_or_else(|| panic!("StackedList::add called with no open generation"));
        top.items.push(op);
        top.line_count += count;
        self.line_count += count;
    }

    /// Fold the top generation into the one below it, keeping item order.
    ///
    /// # Panics
    ///
    /// Panics if fewer than two generations are open.
    pub fn commit(&mut self) {
        assert!(
            self.generations.len() >= 2,
            "StackedList::commit needs a generation to fold into (depth {})",
            self.generations.len()
        );
        if let Some(top) = self.generations.pop() {
            if let Some(below) = self.generations.last_mut() {
                below.items.extend(top.items);
                below.line_count += top.line_count;
            }
        }
    }

    /// Total number of operations across all generations.
    pub fn len(&self) -> usize {
        self.generations.iter().map(|g| g.items.len()).sum()
    }

    /// Whether no operation is held.
    pub fn is_empty(&self) -> bool {
        self.generations.iter().all(|g| g.items.is_empty())
    }

    /// Most recently added operation still live.
    pub fn last(&self) -> Option<&E> {
        self.generations.iter().rev().find_map(|g| g.items.last())
    }

    /// Iterate operations from the oldest generation to the newest.
    pub fn iter(&self) -> impl Iterator<Item = &E> {
        self.generations.iter().flat_map(|g| g.items.iter())
    }
}

impl<E: LineCountable> Default for StackedList<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: LineCountable> StackedContainer for StackedList<E> {
    fn enter(&mut self) {
        self.generations.push(Generation::new());
    }

    fn pop(&mut self) {
        let popped = self
            .generations
            .pop()
            .unwrap_or_else(|| panic!("StackedList::pop called on an empty stack"));
        self.line_count -= popped.line_count;
    }

    fn line_count(&self) -> u64 {
        self.line_count
    }

    fn depth(&self) -> usize {
        self.generations.len()
    }
}
