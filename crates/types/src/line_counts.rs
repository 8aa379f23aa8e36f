//! Per-module cumulative line counts.

use crate::ModuleName;
use std::collections::BTreeMap;

/// Cumulative trace line counts keyed by module.
///
/// Iteration is in lexicographic module order, which is the fixed order the
/// selector evaluates limits in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineCounts(BTreeMap<ModuleName, u64>);

impl LineCounts {
    /// Create an empty set of counts.
    pub fn new() -> Self {
        Self::default()
    }

    /// Line count for a module, if reported.
    pub fn get(&self, module: &str) -> Option<u64> {
        self.0.get(module).copied()
    }

    /// Line count for a module, treating an unreported module as zero.
    pub fn get_or_zero(&self, module: &str) -> u64 {
        self.get(module).unwrap_or(0)
    }

    /// Set the count for a module, returning the previous value.
    pub fn insert(&mut self, module: impl Into<ModuleName>, count: u64) -> Option<u64> {
        self.0.insert(module.into(), count)
    }

    /// Iterate `(module, count)` pairs in evaluation order.
    pub fn iter(&self) -> impl Iterator<Item = (&ModuleName, u64)> {
        self.0.iter().map(|(module, count)| (module, *count))
    }

    /// Iterate the reported modules in evaluation order.
    pub fn modules(&self) -> impl Iterator<Item = &ModuleName> {
        self.0.keys()
    }

    /// Number of modules reported.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no module is reported.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Sum of all module counts.
    pub fn total(&self) -> u64 {
        self.0.values().sum()
    }
}

impl FromIterator<(ModuleName, u64)> for LineCounts {
    fn from_iter<I: IntoIterator<Item = (ModuleName, u64)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> FromIterator<(&'a str, u64)> for LineCounts {
    fn from_iter<I: IntoIterator<Item = (&'a str, u64)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(module, count)| (ModuleName::from(module), count))
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_iteration_is_lexicographic() {
        let counts: LineCounts = [("MUL", 3), ("ADD", 1), ("EXT", 2)].into_iter().collect();
        let order: Vec<&str> = counts.modules().map(ModuleName::as_str).collect();
        assert_eq!(order, vec!["ADD", "EXT", "MUL"]);
        assert_eq!(counts.total(), 6);
    }

    #[test]
    fn test_missing_module_reads_as_zero() {
        let counts: LineCounts = [("ADD", 7)].into_iter().collect();
        assert_eq!(counts.get("EXT"), None);
        assert_eq!(counts.get_or_zero("EXT"), 0);
        assert_eq!(counts.get_or_zero("ADD"), 7);
    }
}
