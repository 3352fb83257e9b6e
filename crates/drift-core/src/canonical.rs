//! # Canonical Schema Text
//!
//! This module defines `CanonicalText`, the sole construction path for
//! schema text handed to the schema store.
//!
//! ## Invariant
//!
//! The inner `String` is private. The only constructor renders a JSON
//! value with two-space indentation and exactly one trailing newline.
//! Object members keep their insertion order (`serde_json` is built with
//! `preserve_order`), so members that an edit did not touch stay where the
//! previous version had them and new members land at the end. Two renders
//! of equal documents are byte-identical, which keeps the diff a reviewer
//! sees limited to what the repair changed.

use std::fmt;

use serde_json::Value;

use crate::error::{CanonicalizationError, DriftError};

/// Schema text produced exclusively by canonical rendering.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CanonicalText(String);

impl CanonicalText {
    /// Render a schema document.
    ///
    /// # Errors
    ///
    /// Returns `CanonicalizationError::SerializationFailed` if `serde_json`
    /// cannot serialize the value.
    pub fn new(schema: &Value) -> Result<Self, CanonicalizationError> {
        let mut text = serde_json::to_string_pretty(schema)?;
        text.push('\n');
        Ok(Self(text))
    }

    /// The rendered text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The rendered text as bytes, for digest computation.
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    /// Consume into the inner `String`.
    pub fn into_string(self) -> String {
        self.0
    }

    /// True when `other` is byte-identical to this rendering.
    pub fn matches(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl AsRef<str> for CanonicalText {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CanonicalText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Parse schema text fetched from a store.
///
/// # Errors
///
/// Returns `DriftError::Serialization` when the text is not JSON.
pub fn parse_schema_text(text: &str) -> Result<Value, DriftError> {
    serde_json::from_str(text).map_err(|e| DriftError::Serialization(format!("invalid schema JSON: {e}")))
}
