//! # Collaborator Boundaries
//!
//! The repair core is pure. The only operations that perform I/O are the
//! ones behind these two traits: reading and committing the authoritative
//! schema text, and turning a committed version into a reviewable change
//! request.
//!
//! Both traits are object-safe and `Send + Sync` so a single instance can
//! sit behind an `Arc` and serve concurrent events.

use std::fmt;

use async_trait::async_trait;
use drift_core::CanonicalText;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Identifier of an opened change request, as issued by the proposer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChangeId(pub String);

impl ChangeId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChangeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A collaborator call failed.
///
/// Fatal to the event being repaired. Nothing is committed before the
/// final commit call, so no variant leaves a partially written schema.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BoundaryError {
    /// Local or network I/O failed.
    #[error("{operation}: I/O failure: {reason}")]
    Io { operation: String, reason: String },

    /// The target was changed concurrently.
    #[error("{operation}: conflict: {reason}")]
    Conflict { operation: String, reason: String },

    /// The collaborator refused the request.
    #[error("{operation}: rejected: {reason}")]
    Rejected { operation: String, reason: String },

    /// The collaborator could not be reached or is not configured.
    #[error("{operation}: unavailable: {reason}")]
    Unavailable { operation: String, reason: String },
}

impl BoundaryError {
    /// The collaborator operation that failed.
    pub fn operation(&self) -> &str {
        match self {
            Self::Io { operation, .. }
            | Self::Conflict { operation, .. }
            | Self::Rejected { operation, .. }
            | Self::Unavailable { operation, .. } => operation,
        }
    }
}

/// Holder of the authoritative reference schema.
#[async_trait]
pub trait SchemaStore: Send + Sync {
    /// Current schema text.
    async fn fetch_schema_text(&self) -> Result<String, BoundaryError>;

    /// Persist `text` as a new version on `target_ref`.
    async fn commit_schema_text(
        &self,
        text: &CanonicalText,
        target_ref: &str,
    ) -> Result<(), BoundaryError>;
}

/// Turns a committed schema version into a reviewable change request.
#[async_trait]
pub trait ChangeProposer: Send + Sync {
    /// Open a change request from `head_ref` into `base_ref`.
    async fn propose_change(
        &self,
        base_ref: &str,
        head_ref: &str,
        title: &str,
        body: &str,
    ) -> Result<ChangeId, BoundaryError>;

    /// Attach `labels` to an opened change request.
    async fn label_change(&self, change_id: &ChangeId, labels: &[String]) -> Result<(), BoundaryError>;
}
