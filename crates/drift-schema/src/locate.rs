//! # Schema Locations Through `$ref`
//!
//! The validation engine reports keyword locations along the path it
//! evaluated, which passes through `$ref` keywords (`/oneOf/3/$ref/properties/...`).
//! That path cannot be walked as a plain pointer, and it is not where an
//! edit must land: the node to edit is the definition the reference
//! points at.
//!
//! [`locate`] walks such a path, jumping to the target of every local
//! `$ref` it crosses, and returns the canonical pointer of the node it
//! ends on.

use drift_core::{JsonPointer, ResolutionError};
use serde_json::Value;

/// Canonical location of the schema node addressed by `path`.
///
/// # Errors
///
/// Returns a [`ResolutionError`] (reported against `path`) when a token
/// cannot be followed or a crossed `$ref` is not a local `#...` reference.
pub fn locate(schema: &Value, path: &JsonPointer) -> Result<JsonPointer, ResolutionError> {
    let fail = |depth: usize, reason: String| ResolutionError {
        pointer: path.to_string(),
        depth,
        reason,
    };

    let mut canonical = JsonPointer::root();
    let mut current = schema;
    for (depth, token) in path.tokens().iter().enumerate() {
        if token == "$ref" {
            if let Some(reference) = current.get("$ref").and_then(Value::as_str) {
                canonical = local_ref(reference).ok_or_else(|| {
                    fail(depth, format!("'$ref' target '{reference}' is not a local reference"))
                })?;
                current = canonical
                    .resolve(schema)
                    .map_err(|e| fail(depth, format!("'$ref' target '{reference}': {}", e.reason)))?;
                continue;
            }
        }
        canonical.push(token.clone());
        current = canonical
            .resolve(schema)
            .map_err(|e| fail(depth, e.reason))?;
    }
    Ok(canonical)
}

/// Pointer for a `#`-relative reference (`#` or `#/definitions/x`).
fn local_ref(reference: &str) -> Option<JsonPointer> {
    let fragment = reference.strip_prefix('#')?;
    JsonPointer::parse(fragment).ok()
}
