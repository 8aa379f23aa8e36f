//! Module line-count limits.
//!
//! The limits file is a flat TOML table mapping module names to their row
//! budget:
//!
//! ```toml
//! [traces-limits]
//! ADD = 262144
//! EXT = 65536
//! ```
//!
//! One number serves as both the per-transaction ceiling and the cumulative
//! per-block ceiling for that module.

use crate::{ConfigError, ReloadableMap};
use indexmap::IndexMap;
use serde::Deserialize;
use std::path::Path;
use tracelimit_types::ModuleName;
use tracing::{info, warn};

/// Hot-swappable limits shared by the selector and pool admission.
pub type LimitsStore = ReloadableMap<ModuleName, u64>;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct LimitsFile {
    #[serde(rename = "traces-limits")]
    traces_limits: IndexMap<String, u64>,
}

/// Parsed module limits, in file order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModuleLimits(IndexMap<ModuleName, u64>);

impl ModuleLimits {
    /// Parse limits from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let file: LimitsFile = toml::from_str(text)?;
        let mut limits = IndexMap::with_capacity(file.traces_limits.len());
        for (module, limit) in file.traces_limits {
            if module.trim().is_empty() {
                return Err(ConfigError::EmptyModuleName);
            }
            limits.insert(ModuleName::from(module), limit);
        }
        Ok(Self(limits))
    }

    /// Read and parse a limits file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| ConfigError::io(path, e))?;
        Self::from_toml_str(&text)
    }

    /// Limit for a module.
    pub fn get(&self, module: &str) -> Option<u64> {
        self.0.get(module).copied()
    }

    /// Number of configured modules.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no module is configured.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate `(module, limit)` in file order.
    pub fn iter(&self) -> impl Iterator<Item = (&ModuleName, u64)> {
        self.0.iter().map(|(module, limit)| (module, *limit))
    }

    /// Wrap these limits in a store at generation 0.
    pub fn into_store(self) -> LimitsStore {
        LimitsStore::new(self.0)
    }

    /// Unwrap into the underlying map.
    pub fn into_inner(self) -> IndexMap<ModuleName, u64> {
        self.0
    }
}

impl<'a> FromIterator<(&'a str, u64)> for ModuleLimits {
    fn from_iter<I: IntoIterator<Item = (&'a str, u64)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(module, limit)| (ModuleName::from(module), limit))
                .collect(),
        )
    }
}

/// Reload a limits file into `store`, replacing the whole table.
///
/// On error the store keeps its current contents. Returns the new
/// generation on success.
pub fn reload_limits(store: &LimitsStore, path: impl AsRef<Path>) -> Result<u64, ConfigError> {
    let path = path.as_ref();
    let limits = match ModuleLimits::from_file(path) {
        Ok(limits) => limits,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Keeping current module limits");
            return Err(e);
        }
    };

    let modules = limits.len();
    let generation = store.swap(limits.into_inner());
    info!(
        path = %path.display(),
        modules,
        generation,
        "Reloaded module limits"
    );
    Ok(generation)
}
