//! Hot-swappable configuration for line-limit admission control.
//!
//! - [`ReloadableMap`] / [`ReloadableSet`]: lock-free snapshot containers that
//!   can only change by wholesale [`swap`](ReloadableMap::swap)
//! - [`ModuleLimits`] / [`LimitsStore`]: the per-module row budget, loaded
//!   from a TOML limits file and reloadable at runtime
//! - [`DenyList`]: reloadable set of senders refused at pool admission
//! - [`SelectorConfig`]: rejection cache and block sealing settings

mod deny_list;
mod error;
mod limits;
mod reloadable;
mod settings;

pub use deny_list::{load_deny_list, parse_deny_list, reload_deny_list, DenyList};
pub use error::ConfigError;
pub use limits::{reload_limits, LimitsStore, ModuleLimits};
pub use reloadable::{
    ImmutableError, KeySet, ReloadableMap, ReloadableSet, SetSnapshotIter, Snapshot, SnapshotIter,
};
pub use settings::{
    EvictionPolicy, RejectionCacheConfig, SelectorConfig, DEFAULT_REJECTION_CACHE_CAPACITY,
};
