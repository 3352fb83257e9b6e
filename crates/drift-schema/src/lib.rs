//! # drift-schema — Validate, Diagnose, Patch
//!
//! The pure core of schema-drift. Given a payload and the reference
//! schema, decide whether the payload conforms and, if not, which additive
//! schema edits would make it conform.
//!
//! ## Validation (`validate`)
//!
//! [`SchemaValidator`] compiles the reference schema once and reports
//! violations with their payload pointer, schema pointer and keyword. A
//! `oneOf` with no matching branch is descended into so the drifted field
//! is reported, not just the union.
//!
//! ## Interpretation (`interpret`)
//!
//! [`interpret`] maps one violation to one [`Edit`]: broaden a `type`,
//! extend an `enum`, or do nothing. [`plan`] folds a violation list into a
//! [`RepairPlan`], skipping violations that do not resolve.
//!
//! ## Patching (`patch`)
//!
//! [`apply_edits`] applies edits to a copy of the schema, independent of
//! edit order; [`render`] produces the canonical text committed to the
//! store.
//!
//! ## Crate Policy
//!
//! - Depends only on `drift-core` internally.
//! - No I/O. External `$ref`s are never fetched.
//! - Edits only widen what the schema accepts.

pub mod interpret;
pub mod locate;
pub mod patch;
pub mod validate;

pub use interpret::{
    diagnose, enum_member, interpret, plan, resolve, Diagnosis, Edit, NoOpReason, RepairPlan,
    ResolvedViolation, SkippedViolation,
};
pub use locate::locate;
pub use patch::{apply_edits, render, PatchError};
pub use validate::{
    validate, Keyword, SchemaValidationError, SchemaValidator, ValidationOutcome,
    ValidationViolations, Violation,
};
