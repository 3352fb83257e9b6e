//! # Error Types — Structured Error Hierarchy
//!
//! Defines the error types shared by every schema-drift crate. All errors
//! use `thiserror` for derive-based `Display` and `Error` implementations.
//!
//! ## Design
//!
//! - Pointer errors name the offending text and the bad escape.
//! - Resolution errors name the full pointer, the depth at which the walk
//!   stopped, and why the token could not be followed.
//! - Nothing here panics; callers decide whether an error is fatal.

use thiserror::Error;

/// Top-level error type for schema-drift.
#[derive(Error, Debug)]
pub enum DriftError {
    /// Canonical rendering failed.
    #[error("canonicalization error: {0}")]
    Canonicalization(#[from] CanonicalizationError),

    /// A pointer could not be parsed.
    #[error("pointer error: {0}")]
    Pointer(#[from] PointerError),

    /// A pointer could not be resolved against a document.
    #[error("resolution error: {0}")]
    Resolution(#[from] ResolutionError),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Error while parsing an RFC 6901 pointer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PointerError {
    /// Non-empty pointer text that does not start with `/`.
    #[error("pointer '{0}' must be empty or start with '/'")]
    MissingLeadingSlash(String),

    /// A `~` not followed by `0` or `1`.
    #[error("pointer '{pointer}' contains invalid escape '~{escape}'")]
    InvalidEscape {
        /// The full pointer text.
        pointer: String,
        /// The character following `~` (empty when `~` ends the token).
        escape: String,
    },
}

/// A pointer that could not be walked through a JSON document.
///
/// Raised when the payload and the schema disagree structurally: the
/// validator reported a location that does not exist in the document
/// being inspected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("cannot resolve '{pointer}' at depth {depth}: {reason}")]
pub struct ResolutionError {
    /// The pointer being resolved, rendered in RFC 6901 form.
    pub pointer: String,
    /// Number of tokens successfully followed before the failure.
    pub depth: usize,
    /// Why the next token could not be followed.
    pub reason: String,
}

/// Error during canonical rendering.
#[derive(Error, Debug)]
pub enum CanonicalizationError {
    /// JSON serialization failed.
    #[error("serialization failed: {0}")]
    SerializationFailed(#[from] serde_json::Error),
}
