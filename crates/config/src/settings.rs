//! Selector and rejection-cache settings.

use crate::ConfigError;
use serde::Deserialize;

/// Default number of overflowing transactions remembered.
pub const DEFAULT_REJECTION_CACHE_CAPACITY: usize = 10_000;

/// Which entry the rejection cache evicts when full.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EvictionPolicy {
    /// Evict the oldest inserted entry. Lookups do not affect order.
    #[default]
    InsertionOrder,
    /// Evict the least recently looked-up entry (block-building lookups
    /// refresh recency; pool-admission reads do not).
    AccessOrder,
}

/// Rejection cache settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct RejectionCacheConfig {
    /// Maximum remembered transactions. Zero disables the cache.
    pub capacity: usize,

    /// Eviction order once `capacity` is reached.
    pub eviction: EvictionPolicy,

    /// Ignore entries recorded under an older limits generation.
    ///
    /// A transaction rejected under tight limits may fit after a reload
    /// raised them.
    pub invalidate_on_limits_reload: bool,
}

impl Default for RejectionCacheConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_REJECTION_CACHE_CAPACITY,
            eviction: EvictionPolicy::InsertionOrder,
            invalidate_on_limits_reload: true,
        }
    }
}

/// Settings of the line-limit selector and the block builder driving it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct SelectorConfig {
    /// Rejection cache settings.
    pub rejection_cache: RejectionCacheConfig,

    /// Seal the block at the first block-full rejection instead of trying
    /// smaller candidates.
    pub seal_on_block_full: bool,

    /// Seal once this many transactions are selected.
    pub max_transactions_per_block: Option<usize>,
}

impl SelectorConfig {
    /// Parse settings from TOML text. Missing keys take their defaults.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Set the rejection cache capacity.
    pub fn with_cache_capacity(mut self, capacity: usize) -> Self {
        self.rejection_cache.capacity = capacity;
        self
    }

    /// Set the rejection cache eviction policy.
    pub fn with_eviction(mut self, eviction: EvictionPolicy) -> Self {
        self.rejection_cache.eviction = eviction;
        self
    }

    /// Set whether a limits reload invalidates cached rejections.
    pub fn with_invalidate_on_limits_reload(mut self, invalidate: bool) -> Self {
        self.rejection_cache.invalidate_on_limits_reload = invalidate;
        self
    }

    /// Set whether the first block-full rejection seals the block.
    pub fn with_seal_on_block_full(mut self, seal: bool) -> Self {
        self.seal_on_block_full = seal;
        self
    }

    /// Cap the number of selected transactions per block.
    pub fn with_max_transactions_per_block(mut self, max: usize) -> Self {
        self.max_transactions_per_block = Some(max);
        self
    }
}
