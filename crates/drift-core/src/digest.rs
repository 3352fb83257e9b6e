//! # Content Digest — Naming Schema Versions
//!
//! A `ContentDigest` is the SHA-256 of a [`CanonicalText`]. The repair
//! pipeline derives the head ref of a change request from it, so the same
//! patched schema always lands on the same branch and two different
//! patches never share one.
//!
//! `sha256_digest()` accepts only `&CanonicalText`: every digest in the
//! system is taken over canonically rendered text.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::canonical::CanonicalText;

/// SHA-256 digest of canonical schema text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentDigest {
    /// The raw 32-byte digest value.
    pub bytes: [u8; 32],
}

impl ContentDigest {
    /// Render the digest as a lowercase hex string.
    pub fn to_hex(&self) -> String {
        self.bytes.iter().map(|b| format!("{b:02x}")).collect()
    }

    /// The first `len` hex characters, for ref names and log lines.
    pub fn short_hex(&self, len: usize) -> String {
        let mut hex = self.to_hex();
        hex.truncate(len);
        hex
    }
}

impl std::fmt::Display for ContentDigest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "sha256:{}", self.to_hex())
    }
}

/// Compute the SHA-256 digest of canonical schema text.
pub fn sha256_digest(text: &CanonicalText) -> ContentDigest {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    ContentDigest {
        bytes: hasher.finalize().into(),
    }
}
