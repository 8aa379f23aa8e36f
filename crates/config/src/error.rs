//! Error types for configuration loading.

use std::path::PathBuf;
use thiserror::Error;
use tracelimit_types::HexError;

/// Errors while loading or reloading configuration files.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        /// File being read.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid TOML for the expected layout.
    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    /// A module limit was declared with an empty name.
    #[error("Module limit with empty name")]
    EmptyModuleName,

    /// A deny-list line is not a valid address.
    #[error("Invalid address on line {line}: {value:?} ({source})")]
    InvalidAddress {
        /// 1-based line number.
        line: usize,
        /// Offending text.
        value: String,
        /// Parse failure.
        #[source]
        source: HexError,
    },
}

impl ConfigError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
