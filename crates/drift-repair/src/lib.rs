//! # drift-repair — Repair Orchestration
//!
//! Wires the pure validate → plan → patch core in `drift-schema` to the
//! two external collaborators: the store holding the authoritative
//! schema and the mechanism that turns a patched schema into a reviewable
//! change request.
//!
//! - [`boundary`]: the [`SchemaStore`] and [`ChangeProposer`] traits and
//!   [`BoundaryError`].
//! - [`memory`] and [`file`]: in-process and dry-run collaborators.
//! - [`pipeline`]: [`RepairPipeline::handle`], one call per delivered event.
//! - [`report`]: the markdown body of the change request.
//!
//! ## Metrics
//!
//! - `drift_events_total{outcome}`: one increment per handled event.
//! - `drift_violations_total{keyword}`: one increment per violation found.

pub mod boundary;
pub mod config;
pub mod file;
pub mod memory;
pub mod pipeline;
pub mod report;

pub use boundary::{BoundaryError, ChangeId, ChangeProposer, SchemaStore};
pub use config::RepairConfig;
pub use file::{FileSchemaStore, LoggingProposer};
pub use memory::{Commit, InMemorySchemaStore, Proposal, RecordingProposer};
pub use pipeline::{EventOutcome, RepairError, RepairPipeline};
pub use report::{Report, SkippedEntry};
