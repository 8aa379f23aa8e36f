//! Named proof modules and their registry.
//!
//! The budgeting core never looks inside a module: it only needs each module
//! to report a cumulative line count under its name. [`TracedModule`] is that
//! capability, and [`ModuleRegistry`] turns a set of modules into
//! [`LineCounts`].

use crate::{CountOnly, Counted, ModuleOperation, StackedContainer, StackedList, StackedSet};
use std::any::Any;
use std::fmt;
use thiserror::Error;
use tracelimit_types::{LineCounts, ModuleName};
use tracing::trace;

/// A proof module as seen by the accounting core.
pub trait TracedModule: fmt::Debug + Send {
    /// Module name, as used in the limits configuration.
    fn name(&self) -> &ModuleName;

    /// Cumulative line count over everything still live in the module.
    fn line_count(&self) -> u64;

    /// Open a trial scope for the next transaction.
    fn enter_transaction(&mut self);

    /// Discard everything recorded since the matching `enter_transaction`.
    fn pop_transaction(&mut self);

    /// Keep the current trial permanently.
    fn commit_transaction(&mut self);

    /// Downcast support for callers that feed concrete module types.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Module whose rows are plain counts.
///
/// Created with one block-level generation; each transaction trial nests on
/// top of it and is folded into it on commit.
#[derive(Debug)]
pub struct CountModule {
    name: ModuleName,
    counts: CountOnly,
}

impl CountModule {
    /// Create an empty module with its block-level generation open.
    pub fn new(name: impl Into<ModuleName>) -> Self {
        let mut counts = CountOnly::new();
        counts.enter();
        Self {
            name: name.into(),
            counts,
        }
    }

    /// Record `rows` in the current trial.
    pub fn add(&mut self, rows: u64) {
        self.counts.add(rows);
    }
}

impl TracedModule for CountModule {
    fn name(&self) -> &ModuleName {
        &self.name
    }

    fn line_count(&self) -> u64 {
        self.counts.line_count()
    }

    fn enter_transaction(&mut self) {
        self.counts.enter();
    }

    fn pop_transaction(&mut self) {
        assert_open_trial(&self.name, self.counts.depth(), "pop_transaction");
        self.counts.pop();
    }

    fn commit_transaction(&mut self) {
        assert_open_trial(&self.name, self.counts.depth(), "commit_transaction");
        self.counts.commit();
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Module that counts each distinct operation once per conflation.
#[derive(Debug)]
pub struct SetModule<O> {
    name: ModuleName,
    ops: StackedSet<Counted<O>>,
}

impl<O: ModuleOperation> SetModule<O> {
    /// Create an empty module with an open trial.
    pub fn new(name: impl Into<ModuleName>) -> Self {
        Self {
            name: name.into(),
            ops: StackedSet::new(),
        }
    }

    /// Record an operation; returns `false` if it was already counted.
    pub fn add(&mut self, op: O) -> bool {
        self.ops.add(Counted::new(op))
    }

    /// Number of distinct operations held.
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// Whether no operation is held.
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

impl<O: ModuleOperation + fmt::Debug + Send + 'static> TracedModule for SetModule<O> {
    fn name(&self) -> &ModuleName {
        &self.name
    }

    fn line_count(&self) -> u64 {
        self.ops.line_count()
    }

    // The set always has one trial open; commit and pop reopen it.
    fn enter_transaction(&mut self) {}

    fn pop_transaction(&mut self) {
        self.ops.pop_transaction_bundle();
    }

    fn commit_transaction(&mut self) {
        self.ops.commit_transaction_bundle();
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Module that keeps every operation, duplicates included.
#[derive(Debug)]
pub struct ListModule<O> {
    name: ModuleName,
    ops: StackedList<Counted<O>>,
}

impl<O: ModuleOperation> ListModule<O> {
    /// Create an empty module with its block-level generation open.
    pub fn new(name: impl Into<ModuleName>) -> Self {
        let mut ops = StackedList::new();
        ops.enter();
        Self {
            name: name.into(),
            ops,
        }
    }

    /// Record an operation.
    pub fn add(&mut self, op: O) {
        self.ops.add(Counted::new(op));
    }

    /// Number of operations held.
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// Whether no operation is held.
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

impl<O: ModuleOperation + fmt::Debug + Send + 'static> TracedModule for ListModule<O> {
    fn name(&self) -> &ModuleName {
        &self.name
    }

    fn line_count(&self) -> u64 {
        self.ops.line_count()
    }

    fn enter_transaction(&mut self) {
        self.ops.enter();
    }

    fn pop_transaction(&mut self) {
        assert_open_trial(&self.name, self.ops.depth(), "pop_transaction");
        self.ops.pop();
    }

    fn commit_transaction(&mut self) {
        assert_open_trial(&self.name, self.ops.depth(), "commit_transaction");
        self.ops.commit();
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// The block-level generation is never a trial: popping or committing it
/// means an `enter_transaction` is missing.
fn assert_open_trial(module: &ModuleName, depth: usize, operation: &str) {
    assert!(
        depth > 1,
        "{operation} on module {module} without matching enter_transaction"
    );
}

/// Errors raised while assembling a registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// Two modules were registered under the same name.
    #[error("Module {0} is already registered")]
    DuplicateModule(ModuleName),
}

/// Ordered collection of modules reporting under distinct names.
#[derive(Debug, Default)]
pub struct ModuleRegistry {
    modules: Vec<Box<dyn TracedModule>>,
}

impl ModuleRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a module. Names must be unique.
    pub fn register(&mut self, module: Box<dyn TracedModule>) -> Result<(), RegistryError> {
        if self.modules.iter().any(|m| m.name() == module.name()) {
            return Err(RegistryError::DuplicateModule(module.name().clone()));
        }
        self.modules.push(module);
        Ok(())
    }

    /// Look up a module by name with its concrete type.
    pub fn module_mut<M: TracedModule + 'static>(&mut self, name: &str) -> Option<&mut M> {
        self.modules
            .iter_mut()
            .find(|m| m.name().as_str() == name)
            .and_then(|m| m.as_any_mut().downcast_mut::<M>())
    }

    /// Cumulative line counts of every registered module.
    pub fn line_counts(&self) -> LineCounts {
        self.modules
            .iter()
            .map(|m| (m.name().clone(), m.line_count()))
            .collect()
    }

    /// Open a trial scope in every module.
    pub fn enter_transaction(&mut self) {
        trace!(modules = self.modules.len(), "Entering transaction scope");
        self.modules.iter_mut().for_each(|m| m.enter_transaction());
    }

    /// Discard the current trial in every module.
    pub fn pop_transaction(&mut self) {
        trace!(modules = self.modules.len(), "Popping transaction scope");
        self.modules.iter_mut().for_each(|m| m.pop_transaction());
    }

    /// Keep the current trial in every module.
    pub fn commit_transaction(&mut self) {
        self.modules.iter_mut().for_each(|m| m.commit_transaction());
    }

    /// Number of registered modules.
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    /// Whether no module is registered.
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operation::tests::Weighted;

    fn make_registry() -> ModuleRegistry {
        let mut registry = ModuleRegistry::new();
        registry.register(Box::new(CountModule::new("ADD"))).unwrap();
        registry
            .register(Box::new(SetModule::<Weighted>::new("MMU")))
            .unwrap();
        registry
            .register(Box::new(ListModule::<Weighted>::new("EXT")))
            .unwrap();
        registry
    }

    #[test]
    fn test_duplicate_module_rejected() {
        let mut registry = make_registry();
        assert_eq!(
            registry.register(Box::new(CountModule::new("ADD"))),
            Err(RegistryError::DuplicateModule(ModuleName::from("ADD")))
        );
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn test_pop_transaction_restores_all_modules() {
        let mut registry = make_registry();
        registry.enter_transaction();
        registry.module_mut::<CountModule>("ADD").unwrap().add(2);
        registry.commit_transaction();
        let before = registry.line_counts();

        registry.enter_transaction();
        registry.module_mut::<CountModule>("ADD").unwrap().add(5);
        registry
            .module_mut::<SetModule<Weighted>>("MMU")
            .unwrap()
            .add(Weighted::new(1, 4));
        registry
            .module_mut::<ListModule<Weighted>>("EXT")
            .unwrap()
            .add(Weighted::new(1, 6));

        let during = registry.line_counts();
        assert_eq!(during.get("ADD"), Some(7));
        assert_eq!(during.get("MMU"), Some(4));
        assert_eq!(during.get("EXT"), Some(6));

        registry.pop_transaction();
        assert_eq!(registry.line_counts(), before);
    }

    #[test]
    fn test_commit_keeps_set_operations_deduplicated() {
        let mut registry = make_registry();
        registry.enter_transaction();
        registry
            .module_mut::<SetModule<Weighted>>("MMU")
            .unwrap()
            .add(Weighted::new(1, 4));
        registry.commit_transaction();

        registry.enter_transaction();
        let mmu = registry.module_mut::<SetModule<Weighted>>("MMU").unwrap();
        assert!(!mmu.add(Weighted::new(1, 4)));
        registry.pop_transaction();

        assert_eq!(registry.line_counts().get("MMU"), Some(4));
    }

    fn commit_five_rows_each(registry: &mut ModuleRegistry) -> LineCounts {
        registry.enter_transaction();
        registry.module_mut::<CountModule>("ADD").unwrap().add(5);
        registry
            .module_mut::<SetModule<Weighted>>("MMU")
            .unwrap()
            .add(Weighted::new(1, 5));
        registry
            .module_mut::<ListModule<Weighted>>("EXT")
            .unwrap()
            .add(Weighted::new(1, 5));
        registry.commit_transaction();
        registry.line_counts()
    }

    #[test]
    fn test_commit_is_permanent_across_module_kinds() {
        let mut registry = make_registry();
        let committed = commit_five_rows_each(&mut registry);
        assert_eq!(committed.get("ADD"), Some(5));
        assert_eq!(committed.get("MMU"), Some(5));
        assert_eq!(committed.get("EXT"), Some(5));

        for _ in 0..3 {
            registry.enter_transaction();
            registry.module_mut::<CountModule>("ADD").unwrap().add(1);
            registry.pop_transaction();
        }
        assert_eq!(registry.line_counts(), committed);
    }

    #[test]
    #[should_panic(expected = "pop_transaction on module ADD without matching enter_transaction")]
    fn test_unpaired_pop_after_commit_panics_for_count_module() {
        let mut registry = make_registry();
        commit_five_rows_each(&mut registry);
        registry.pop_transaction();
    }

    #[test]
    #[should_panic(expected = "pop_transaction on module EXT without matching enter_transaction")]
    fn test_unpaired_pop_after_commit_panics_for_list_module() {
        let mut module = ListModule::<Weighted>::new("EXT");
        module.enter_transaction();
        module.add(Weighted::new(1, 5));
        module.commit_transaction();
        module.pop_transaction();
    }

    #[test]
    fn test_unpaired_pop_keeps_committed_set_rows() {
        let mut module = SetModule::<Weighted>::new("MMU");
        module.enter_transaction();
        module.add(Weighted::new(1, 5));
        module.commit_transaction();
        module.pop_transaction();
        assert_eq!(module.line_count(), 5);
    }

    #[test]
    #[should_panic(expected = "commit_transaction on module ADD without matching enter_transaction")]
    fn test_commit_without_enter_panics() {
        let mut module = CountModule::new("ADD");
        module.add(1);
        module.commit_transaction();
    }

    #[test]
    fn test_downcast_to_wrong_type_is_none() {
        let mut registry = make_registry();
        assert!(registry.module_mut::<SetModule<Weighted>>("ADD").is_none());
        assert!(registry.module_mut::<CountModule>("MISSING").is_none());
    }
}
