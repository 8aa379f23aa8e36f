//! Transaction hash type using Blake3.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A 32-byte transaction identity hash.
///
/// Safe to use as a map key. All hashing operations are deterministic.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Hash([u8; 32]);

impl Hash {
    /// Blake3 digest of `bytes`.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let hash = blake3::hash(bytes);
        Self(*hash.as_bytes())
    }

    /// Blake3 digest of the concatenation of `parts`.
    pub fn from_parts(parts: &[&[u8]]) -> Self {
        let mut hasher = blake3::Hasher::new();
        for part in parts {
            hasher.update(part);
        }
        Self(*hasher.finalize().as_bytes())
    }

    /// Parse hash from a hex string, with or without `0x` prefix.
    pub fn from_hex(hex: &str) -> Result<Self, HexError> {
        let mut bytes = [0u8; 32];
        decode_prefixed(hex, &mut bytes)?;
        Ok(Self(bytes))
    }

    /// Convert hash to hex string (no prefix).
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Raw digest bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Debug for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hex = self.to_hex();
        write!(f, "Hash({}..{})", &hex[..8], &hex[56..])
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", self.to_hex())
    }
}

/// Decode a hex string with optional `0x` prefix into a fixed-size buffer.
pub(crate) fn decode_prefixed(hex: &str, out: &mut [u8]) -> Result<(), HexError> {
    let digits = hex.strip_prefix("0x").unwrap_or(hex);
    if digits.len() != out.len() * 2 {
        return Err(HexError::InvalidLength {
            expected: out.len() * 2,
            actual: digits.len(),
        });
    }
    hex::decode_to_slice(digits, out).map_err(|_| HexError::InvalidHex)
}

/// Errors that can occur when parsing hex strings.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HexError {
    /// Invalid hex string length.
    #[error("Invalid hex length: expected {expected}, got {actual}")]
    InvalidLength {
        /// Expected length.
        expected: usize,
        /// Actual length.
        actual: usize,
    },

    /// Invalid hex characters.
    #[error("Invalid hex string")]
    InvalidHex,
}
