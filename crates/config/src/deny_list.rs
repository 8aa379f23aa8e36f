//! Sender deny list.
//!
//! One hex address per line. Blank lines and `#` comments are ignored.

use crate::{ConfigError, ReloadableSet};
use indexmap::IndexSet;
use std::path::Path;
use tracelimit_types::Address;
use tracing::{info, warn};

/// Hot-swappable set of denied senders.
pub type DenyList = ReloadableSet<Address>;

/// Parse deny-list text.
pub fn parse_deny_list(text: &str) -> Result<IndexSet<Address>, ConfigError> {
    let mut denied = IndexSet::new();
    for (idx, raw) in text.lines().enumerate() {
        let line = raw.split('#').next().unwrap_or_default().trim();
        if line.is_empty() {
            continue;
        }
        let address = Address::from_hex(line).map_err(|source| ConfigError::InvalidAddress {
            line: idx + 1,
            value: line.to_owned(),
            source,
        })?;
        denied.insert(address);
    }
    Ok(denied)
}

/// Read and parse a deny-list file.
pub fn load_deny_list(path: impl AsRef<Path>) -> Result<IndexSet<Address>, ConfigError> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|e| ConfigError::io(path, e))?;
    parse_deny_list(&text)
}

/// Reload a deny-list file into `deny_list`.
///
/// On error the deny list keeps its current contents. Returns the new
/// generation on success.
pub fn reload_deny_list(deny_list: &DenyList, path: impl AsRef<Path>) -> Result<u64, ConfigError> {
    let path = path.as_ref();
    let denied = match load_deny_list(path) {
        Ok(denied) => denied,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Keeping current deny list");
            return Err(e);
        }
    };
    let entries = denied.len();
    let generation = deny_list.swap(denied);
    info!(path = %path.display(), entries, generation, "Reloaded deny list");
    Ok(generation)
}
