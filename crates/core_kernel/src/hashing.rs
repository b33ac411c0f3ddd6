//! Content addressing for uploaded documents
//!
//! The hash of a document's raw bytes is its identity: two uploads with identical
//! bytes are the same document regardless of file name.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

const DIGEST_HEX_LEN: usize = 64;

/// SHA-256 digest of a document, rendered as 64 lowercase hex characters
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ContentHash(String);

impl ContentHash {
    /// Computes the hash of the given bytes
    pub fn of(bytes: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(bytes);
        Self(format!("{:x}", hasher.finalize()))
    }

    /// Recomputes the hash of `bytes` and checks it against a client-declared value
    ///
    /// Returns the recomputed hash when both agree, `None` when they differ.
    /// A malformed declaration never matches.
    pub fn verify(declared: &str, bytes: &[u8]) -> Option<Self> {
        let actual = Self::of(bytes);
        match declared.parse::<ContentHash>() {
            Ok(declared) if declared == actual => Some(actual),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ContentHash {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        if normalized.len() != DIGEST_HEX_LEN || !normalized.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(CoreError::InvalidHash(format!(
                "expected {} hex characters, got '{}'",
                DIGEST_HEX_LEN, s
            )));
        }
        Ok(Self(normalized))
    }
}

impl TryFrom<String> for ContentHash {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ContentHash> for String {
    fn from(hash: ContentHash) -> String {
        hash.0
    }
}
