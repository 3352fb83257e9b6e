//! # drift-core — Foundational Types for schema-drift
//!
//! The leaf of the workspace. Every other `drift-*` crate depends on it;
//! it depends on nothing internal.
//!
//! ## Key Design Principles
//!
//! 1. **Pointers are values, not strings.** `JsonPointer` parses RFC 6901
//!    text once and walks `serde_json::Value` trees recursively. Both the
//!    payload and the schema are addressed through it.
//!
//! 2. **`CanonicalText` newtype.** All schema text sent to a store flows
//!    through `CanonicalText::new()`, so every committed version has the
//!    same formatting and diffs only show real changes.
//!
//! 3. **Digests only over canonical text.** `sha256_digest()` accepts
//!    `&CanonicalText` and nothing else.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `drift-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod canonical;
pub mod digest;
pub mod error;
pub mod event;
pub mod kind;
pub mod pointer;

pub use canonical::{parse_schema_text, CanonicalText};
pub use digest::{sha256_digest, ContentDigest};
pub use error::{CanonicalizationError, DriftError, PointerError, ResolutionError};
pub use event::{Event, EventName};
pub use kind::JsonKind;
pub use pointer::JsonPointer;
