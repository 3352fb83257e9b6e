//! # Repair Pipeline
//!
//! Runs one delivered event through fetch → validate → plan → patch →
//! commit → propose.
//!
//! ## Failure Handling
//!
//! - An engine error ends the event before any repair is attempted.
//! - A violation whose pointers do not resolve is skipped; the rest of the
//!   plan still applies.
//! - A collaborator failure ends the event. The patched schema only exists
//!   in memory until the commit call, so a failed fetch or commit leaves
//!   nothing behind, and a failed proposal leaves only the committed head
//!   ref.
//!
//! Each call works on its own fetched snapshot; concurrent events share
//! nothing but the collaborators.

use std::sync::Arc;

use drift_core::{
    parse_schema_text, sha256_digest, CanonicalText, CanonicalizationError, DriftError, Event,
};
use drift_schema::{
    apply_edits, diagnose, render, Diagnosis, Edit, PatchError, SchemaValidationError,
    SchemaValidator,
};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::boundary::{BoundaryError, ChangeId, ChangeProposer, SchemaStore};
use crate::config::RepairConfig;
use crate::report::Report;

/// Hex digits of the patched schema digest used in head ref names.
const HEAD_REF_DIGEST_LEN: usize = 12;

/// What happened to one event.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum EventOutcome {
    /// The payload matches the schema.
    Valid,
    /// Invalid, but nothing could be repaired automatically.
    ManualReview { report: Report },
    /// Edits were decided but the patched schema equals the current one.
    NoChange { report: Report },
    /// A patched schema was committed and a change request opened.
    Proposed {
        change_id: ChangeId,
        head_ref: String,
        edits: Vec<Edit>,
        report: Report,
    },
}

impl EventOutcome {
    /// Metric label for the outcome.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Valid => "valid",
            Self::ManualReview { .. } => "manual_review",
            Self::NoChange { .. } => "no_change",
            Self::Proposed { .. } => "proposed",
        }
    }

    /// The report, for invalid payloads.
    pub fn report(&self) -> Option<&Report> {
        match self {
            Self::Valid => None,
            Self::ManualReview { report }
            | Self::NoChange { report }
            | Self::Proposed { report, .. } => Some(report),
        }
    }
}

/// Processing of one event failed.
#[derive(Error, Debug)]
pub enum RepairError {
    /// The store returned text that is not a JSON document.
    #[error("reference schema is unreadable: {0}")]
    SchemaText(#[source] DriftError),

    /// The validation engine could not run. No repair was attempted.
    #[error(transparent)]
    Engine(#[from] SchemaValidationError),

    /// A decided edit could not be applied.
    #[error("patch failed: {0}")]
    Patch(#[from] PatchError),

    /// The patched schema could not be rendered.
    #[error("render failed: {0}")]
    Render(#[from] CanonicalizationError),

    /// A collaborator call failed.
    #[error("boundary failure: {0}")]
    Boundary(#[from] BoundaryError),
}

impl RepairError {
    /// Metric label for the failure.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SchemaText(_) => "schema_unreadable",
            Self::Engine(_) => "engine_error",
            Self::Patch(_) | Self::Render(_) => "patch_error",
            Self::Boundary(_) => "boundary_error",
        }
    }
}

/// Everything decided before the first write.
enum Decision {
    Valid,
    ManualReview(Report),
    NoChange(Report),
    Commit {
        text: CanonicalText,
        edits: Vec<Edit>,
        report: Report,
    },
}

/// Validates events and proposes schema repairs.
#[derive(Clone)]
pub struct RepairPipeline {
    store: Arc<dyn SchemaStore>,
    proposer: Arc<dyn ChangeProposer>,
    config: RepairConfig,
}

impl std::fmt::Debug for RepairPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RepairPipeline")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl RepairPipeline {
    pub fn new(
        store: Arc<dyn SchemaStore>,
        proposer: Arc<dyn ChangeProposer>,
        config: RepairConfig,
    ) -> Self {
        Self {
            store,
            proposer,
            config,
        }
    }

    pub fn config(&self) -> &RepairConfig {
        &self.config
    }

    /// Process one event.
    ///
    /// # Errors
    ///
    /// Returns a [`RepairError`] when the schema cannot be read or
    /// validated, an edit cannot be applied, or a collaborator call fails.
    pub async fn handle(&self, event: &Event) -> Result<EventOutcome, RepairError> {
        let result = self.process(event).await;
        let outcome = match &result {
            Ok(outcome) => outcome.as_str(),
            Err(error) => {
                tracing::error!(event = %event.label(), %error, "event processing failed");
                error.as_str()
            }
        };
        metrics::counter!("drift_events_total", "outcome" => outcome).increment(1);
        result
    }

    async fn process(&self, event: &Event) -> Result<EventOutcome, RepairError> {
        let label = event.label();
        let current = self.store.fetch_schema_text().await?;

        let (text, edits, report) = match decide(&label, &current, event.payload())? {
            Decision::Valid => return Ok(EventOutcome::Valid),
            Decision::ManualReview(report) => {
                tracing::warn!(event = %label, "no automatic repair, manual review needed");
                return Ok(EventOutcome::ManualReview { report });
            }
            Decision::NoChange(report) => {
                tracing::info!(event = %label, "patched schema equals current schema");
                return Ok(EventOutcome::NoChange { report });
            }
            Decision::Commit {
                text,
                edits,
                report,
            } => (text, edits, report),
        };

        let digest = sha256_digest(&text);
        let head_ref = self.config.head_ref(&digest.short_hex(HEAD_REF_DIGEST_LEN));
        self.store.commit_schema_text(&text, &head_ref).await?;

        let change_id = self
            .proposer
            .propose_change(
                &self.config.base_ref,
                &head_ref,
                &self.config.title,
                &report.to_markdown(),
            )
            .await?;
        if !self.config.labels.is_empty() {
            self.proposer
                .label_change(&change_id, &self.config.labels)
                .await?;
        }

        tracing::info!(
            event = %label,
            %change_id,
            head_ref = %head_ref,
            digest = %digest,
            edits = edits.len(),
            "change request opened"
        );
        Ok(EventOutcome::Proposed {
            change_id,
            head_ref,
            edits,
            report,
        })
    }
}

/// Validate, plan and patch against one fetched schema snapshot.
fn decide(label: &str, current: &str, payload: &Value) -> Result<Decision, RepairError> {
    let schema = parse_schema_text(current).map_err(RepairError::SchemaText)?;
    let validator = SchemaValidator::new(&schema)?;

    let (violations, plan) = match diagnose(&validator, payload)? {
        Diagnosis::Valid => {
            tracing::info!("✅ Payload '{label}' matches schema");
            return Ok(Decision::Valid);
        }
        Diagnosis::Invalid { violations, plan } => (violations, plan),
    };

    tracing::warn!("❌ Payload '{label}' does not match schema");
    for v in &violations {
        metrics::counter!("drift_violations_total", "keyword" => v.keyword.as_str().to_string())
            .increment(1);
        tracing::warn!(
            event = %label,
            data_pointer = %v.data_pointer,
            schema_pointer = %v.schema_pointer,
            keyword = %v.keyword,
            "{}",
            v.message
        );
    }

    let report = Report::new(label, &plan);
    if !plan.is_actionable() {
        return Ok(Decision::ManualReview(report));
    }

    let patched = apply_edits(&schema, &plan.edits)?;
    let text = render(&patched)?;
    if patched == schema || text.matches(current) {
        return Ok(Decision::NoChange(report));
    }
    Ok(Decision::Commit {
        text,
        edits: report.edits.clone(),
        report,
    })
}
