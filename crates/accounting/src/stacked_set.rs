//! Set-deduplicating stacked container.

use crate::{LineCountable, StackedContainer};
use indexmap::IndexSet;
use std::hash::Hash;

#[derive(Debug)]
struct Generation<E> {
    items: IndexSet<E>,
    line_count: u64,
}

impl<E> Generation<E> {
    fn new() -> Self {
        Self {
            items: IndexSet::new(),
            line_count: 0,
        }
    }
}

/// Stacked container that counts each distinct operation once.
///
/// Holds the permanent, already-conflated operations plus the open trial
/// generations of the current transaction bundle. A freshly created set has
/// one open trial, so operations can be added right away.
///
/// - [`add`](Self::add) deduplicates against the permanent state and every
///   open generation
/// - [`commit_transaction_bundle`](Self::commit_transaction_bundle) folds the
///   trial into the permanent state; it cannot be undone afterwards
/// - [`pop_transaction_bundle`](Self::pop_transaction_bundle) discards the
///   trial and leaves the permanent state untouched
///
/// Insertion order is preserved, so iteration is deterministic.
#[derive(Debug)]
pub struct StackedSet<E> {
    conflation: IndexSet<E>,
    conflation_line_count: u64,
    generations: Vec<Generation<E>>,
}

impl<E: LineCountable + Eq + Hash> StackedSet<E> {
    /// Create an empty set with one open trial generation.
    pub fn new() -> Self {
        Self {
            conflation: IndexSet::new(),
            conflation_line_count: 0,
            generations: vec![Generation::new()],
        }
    }

    /// Insert an operation into the top generation.
    ///
    /// Returns `false` without inserting if an equal operation is already
    /// present anywhere in the container.
    ///
    /// # Panics
    ///
    /// Panics if no generation is open.
    pub fn add(&mut self, op: E) -> bool {
        if self.contains(&op) {
            return false;
        }
        let count = op.line_count();
        let top = self
            .generations
            .last_mut()
            .unwrap_or_else(|| panic!("StackedSet::add called with no open generation"));
        top.items.insert(op);
        top.line_count += count;
        true
    }

    /// Whether an equal operation is present in the permanent state or any
    /// open generation.
    pub fn contains(&self, op: &E) -> bool {
        self.conflation.contains(op) || self.generations.iter().any(|g| g.items.contains(op))
    }

    /// Number of distinct operations held.
    pub fn len(&self) -> usize {
        self.conflation.len() + self.generations.iter().map(|g| g.items.len()).sum::<usize>()
    }

    /// Whether no operation is held.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of operations already folded into the permanent state.
    pub fn committed_len(&self) -> usize {
        self.conflation.len()
    }

    /// Iterate permanent operations first, then the trial in generation order.
    pub fn iter(&self) -> impl Iterator<Item = &E> {
        self.conflation
            .iter()
            .chain(self.generations.iter().flat_map(|g| g.items.iter()))
    }

    /// Fold every open trial generation into the permanent state and open a
    /// fresh trial.
    ///
    /// # Panics
    ///
    /// Panics if no generation is open.
    pub fn commit_transaction_bundle(&mut self) {
        assert!(
            !self.generations.is_empty(),
            "StackedSet::commit_transaction_bundle called on an empty stack"
        );
        for generation in self.generations.drain(..) {
            self.conflation_line_count += generation.line_count;
            self.conflation.extend(generation.items);
        }
        self.generations.push(Generation::new());
    }

    /// Discard every open trial generation and open a fresh trial.
    ///
    /// # Panics
    ///
    /// Panics if no generation is open.
    pub fn pop_transaction_bundle(&mut self) {
        assert!(
            !self.generations.is_empty(),
            "StackedSet::pop_transaction_bundle called on an empty stack"
        );
        self.generations.clear();
        self.generations.push(Generation::new());
    }
}

impl<E: LineCountable + Eq + Hash> Default for StackedSet<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: LineCountable + Eq + Hash> StackedContainer for StackedSet<E> {
    fn enter(&mut self) {
        self.generations.push(Generation::new());
    }

    fn pop(&mut self) {
        self.generations
            .pop()
            .unwrap_or_else(|| panic!("StackedSet::pop called on an empty stack"));
    }

    fn line_count(&self) -> u64 {
        self.conflation_line_count + self.generations.iter().map(|g| g.line_count).sum::<u64>()
    }

    fn depth(&self) -> usize {
        self.generations.len()
    }
}
