//! # Schema Patching
//!
//! Applies a set of [`Edit`]s to a schema document and renders the result
//! as [`CanonicalText`].
//!
//! ## Order Independence
//!
//! Broadening wraps a node's rules into `oneOf/0`, which moves every
//! location beneath it. Edits are therefore applied deepest target first;
//! ties are broken by pointer, then edit kind, then value, so the same
//! edit set yields the same document whatever order it arrived in.
//! Exact duplicates are applied once.
//!
//! ## Broadening
//!
//! - A node whose only rule is `oneOf` gains `{ "type": <kind> }` as a new
//!   alternative, unless an alternative already accepts the whole kind.
//!   Alternatives that accept part of the kind are excluded from the new
//!   one with `not`, so every value accepted before still matches exactly
//!   one alternative.
//! - Any other node keeps its annotations and document-level members
//!   (`title`, `description`, `definitions`, ...) and has every other rule
//!   moved into alternative `0` of a new `oneOf`; the observed kind
//!   becomes alternative `1`.
//! - Broadening to `number` where the node admits `integer` adds
//!   `{ "type": "number", "not": { "type": "integer" } }` instead, so an
//!   integer payload still matches exactly one alternative.
//!
//! The input document is never mutated.

use std::cmp::{Ordering, Reverse};

use drift_core::{CanonicalText, CanonicalizationError, JsonKind, JsonPointer, ResolutionError};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::interpret::Edit;

/// Members that stay on a node when its rules are wrapped into `oneOf`.
const STAYS_ON_NODE: &[&str] = &[
    "$schema",
    "$id",
    "id",
    "$comment",
    "title",
    "description",
    "default",
    "examples",
    "definitions",
    "$defs",
];

/// An edit could not be applied.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PatchError {
    /// The edit target does not exist in the schema.
    #[error("edit target not found: {0}")]
    Target(#[from] ResolutionError),

    /// The edit target is not a schema object.
    #[error("edit target '{target}' is not a schema object")]
    NotAnObject { target: String },

    /// An `ExtendEnum` target has no `enum` array.
    #[error("edit target '{target}' has no 'enum' array")]
    NotAnEnum { target: String },

    /// The target's `oneOf` is not an array.
    #[error("edit target '{target}' has a 'oneOf' that is not an array")]
    MalformedOneOf { target: String },
}

/// Apply `edits` to a copy of `schema`.
///
/// No-op edits are ignored.
///
/// # Errors
///
/// Returns a [`PatchError`] for the first edit whose target is missing or
/// has the wrong shape. No partial result is returned.
pub fn apply_edits(schema: &Value, edits: &[Edit]) -> Result<Value, PatchError> {
    let mut patched = schema.clone();
    for edit in normalize(edits) {
        match edit {
            Edit::BroadenType { target, observed } => {
                let node = target.resolve_mut(&mut patched)?;
                broaden(node, target, *observed)?;
            }
            Edit::ExtendEnum { target, value } => {
                let node = target.resolve_mut(&mut patched)?;
                extend_enum(node, target, value)?;
            }
            Edit::NoOp { .. } => {}
        }
    }
    Ok(patched)
}

/// Render a schema document for the store.
///
/// # Errors
///
/// See [`CanonicalText::new`].
pub fn render(schema: &Value) -> Result<CanonicalText, CanonicalizationError> {
    CanonicalText::new(schema)
}

/// Actionable edits, deduplicated, in application order.
fn normalize(edits: &[Edit]) -> Vec<&Edit> {
    let mut unique: Vec<&Edit> = Vec::with_capacity(edits.len());
    for edit in edits.iter().filter(|e| e.is_actionable()) {
        if !unique.contains(&edit) {
            unique.push(edit);
        }
    }
    unique.sort_by(|a, b| application_order(a, b));
    unique
}

fn application_order(a: &Edit, b: &Edit) -> Ordering {
    let key = |e: &Edit| {
        let target = e.target().cloned().unwrap_or_default();
        (Reverse(target.len()), target, kind_rank(e), value_key(e))
    };
    key(a).cmp(&key(b))
}

fn kind_rank(edit: &Edit) -> u8 {
    match edit {
        Edit::ExtendEnum { .. } => 0,
        Edit::BroadenType { .. } => 1,
        Edit::NoOp { .. } => 2,
    }
}

fn value_key(edit: &Edit) -> String {
    match edit {
        Edit::BroadenType { observed, .. } => observed.as_str().to_string(),
        Edit::ExtendEnum { value, .. } => value.to_string(),
        Edit::NoOp { .. } => String::new(),
    }
}

fn broaden(node: &mut Value, target: &JsonPointer, observed: JsonKind) -> Result<(), PatchError> {
    let alternative = wrap_alternative(node, observed);
    let map = node.as_object_mut().ok_or_else(|| PatchError::NotAnObject {
        target: target.to_string(),
    })?;

    let only_one_of = map.contains_key("oneOf")
        && map.keys().all(|k| k == "oneOf" || STAYS_ON_NODE.contains(&k.as_str()));
    if only_one_of {
        let alternatives = map
            .get_mut("oneOf")
            .and_then(Value::as_array_mut)
            .ok_or_else(|| PatchError::MalformedOneOf {
                target: target.to_string(),
            })?;
        if let Some(alternative) = one_of_alternative(alternatives, observed) {
            alternatives.push(alternative);
        }
        return Ok(());
    }

    let mut kept = Map::new();
    let mut wrapped = Map::new();
    for (key, value) in std::mem::take(map) {
        if STAYS_ON_NODE.contains(&key.as_str()) {
            kept.insert(key, value);
        } else {
            wrapped.insert(key, value);
        }
    }
    kept.insert(
        "oneOf".to_string(),
        Value::Array(vec![Value::Object(wrapped), alternative]),
    );
    *map = kept;
    Ok(())
}

/// The alternative to append to an existing `oneOf` for `observed`.
///
/// `None` when an alternative already accepts every value of that kind.
/// Alternatives that may accept some values of the kind are excluded with
/// `not`, so values they accepted still match exactly one alternative.
fn one_of_alternative(alternatives: &[Value], observed: JsonKind) -> Option<Value> {
    if alternatives.iter().any(|alt| covers(alt, observed)) {
        return None;
    }
    let overlapping: Vec<Value> = alternatives
        .iter()
        .filter(|alt| may_admit(alt, observed))
        .cloned()
        .collect();
    let mut alternative = observed.type_schema();
    if let Value::Object(map) = &mut alternative {
        match overlapping.len() {
            0 => {}
            1 => {
                map.insert("not".to_string(), overlapping[0].clone());
            }
            _ => {
                map.insert("not".to_string(), serde_json::json!({ "anyOf": overlapping }));
            }
        }
    }
    Some(alternative)
}

/// True when `alternative` accepts every value of `kind`, or is an
/// alternative already added for it.
fn covers(alternative: &Value, kind: JsonKind) -> bool {
    match alternative {
        Value::Bool(accepts) => *accepts,
        Value::Object(map) => {
            let names_exactly = match map.get("type") {
                Some(Value::String(t)) => t == kind.as_str(),
                Some(Value::Array(ts)) => ts.iter().any(|t| t == kind.as_str()),
                _ => false,
            };
            names_exactly
                && map
                    .keys()
                    .all(|k| k == "type" || k == "not" || STAYS_ON_NODE.contains(&k.as_str()))
        }
        _ => false,
    }
}

/// True unless `alternative` visibly rejects every value of `kind`.
fn may_admit(alternative: &Value, kind: JsonKind) -> bool {
    let Value::Object(map) = alternative else {
        return !matches!(alternative, Value::Bool(false));
    };
    let names = |t: &str| t == kind.as_str() || (kind == JsonKind::Number && t == "integer");
    if let Some(declared) = map.get("type") {
        return match declared {
            Value::String(t) => names(t),
            Value::Array(ts) => ts.iter().filter_map(Value::as_str).any(names),
            _ => true,
        };
    }
    if let Some(Value::Array(members)) = map.get("enum") {
        return members.iter().any(|m| JsonKind::of(m) == kind);
    }
    if let Some(constant) = map.get("const") {
        return JsonKind::of(constant) == kind;
    }
    true
}

/// The alternative admitting `observed` next to a node's wrapped rules.
fn wrap_alternative(node: &Value, observed: JsonKind) -> Value {
    if observed == JsonKind::Number && admits_integer(node) {
        serde_json::json!({ "type": "number", "not": { "type": "integer" } })
    } else {
        observed.type_schema()
    }
}

/// True when `node` names `integer`.
fn admits_integer(node: &Value) -> bool {
    match node.get("type") {
        Some(Value::String(t)) => t == "integer",
        Some(Value::Array(ts)) => ts.iter().any(|t| t == "integer"),
        _ => false,
    }
}

fn extend_enum(node: &mut Value, target: &JsonPointer, value: &Value) -> Result<(), PatchError> {
    let members = node
        .get_mut("enum")
        .and_then(Value::as_array_mut)
        .ok_or_else(|| PatchError::NotAnEnum {
            target: target.to_string(),
        })?;
    if !members.contains(value) {
        members.push(value.clone());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ptr(s: &str) -> JsonPointer {
        JsonPointer::parse(s).unwrap()
    }

    fn broaden_edit(target: &str, observed: JsonKind) -> Edit {
        Edit::BroadenType {
            target: ptr(target),
            observed,
        }
    }

    fn enum_edit(target: &str, value: Value) -> Edit {
        Edit::ExtendEnum {
            target: ptr(target),
            value,
        }
    }

    #[test]
    fn broaden_wraps_existing_rules() {
        let schema = json!({
            "properties": {
                "head_commit": {
                    "description": "Most recent commit",
                    "type": "object",
                    "required": ["id"]
                }
            }
        });
        let patched =
            apply_edits(&schema, &[broaden_edit("/properties/head_commit", JsonKind::Null)]).unwrap();
        assert_eq!(
            patched["properties"]["head_commit"],
            json!({
                "description": "Most recent commit",
                "oneOf": [
                    {"type": "object", "required": ["id"]},
                    {"type": "null"}
                ]
            })
        );
    }

    #[test]
    fn broaden_appends_to_existing_one_of() {
        let schema = json!({"oneOf": [{"type": "object"}, {"type": "null"}]});
        let patched = apply_edits(&schema, &[broaden_edit("", JsonKind::String)]).unwrap();
        assert_eq!(
            patched,
            json!({"oneOf": [{"type": "object"}, {"type": "null"}, {"type": "string"}]})
        );
    }

    #[test]
    fn broaden_does_not_duplicate_alternative() {
        let schema = json!({"oneOf": [{"type": "object"}, {"type": "null"}]});
        let patched = apply_edits(&schema, &[broaden_edit("", JsonKind::Null)]).unwrap();
        assert_eq!(patched, schema);
    }

    fn valid(payload: Value, schema: &Value) -> bool {
        crate::validate::validate(&payload, schema).unwrap().is_valid()
    }

    #[test]
    fn broaden_excludes_enum_alternative_of_same_kind() {
        let schema = json!({"oneOf": [{"type": "null"}, {"enum": ["opened", "closed"]}]});
        let patched = apply_edits(&schema, &[broaden_edit("", JsonKind::String)]).unwrap();
        assert_eq!(
            patched["oneOf"][2],
            json!({"type": "string", "not": {"enum": ["opened", "closed"]}})
        );
        assert!(valid(json!("opened"), &patched));
        assert!(valid(json!(null), &patched));
        assert!(valid(json!("reopened"), &patched));
    }

    #[test]
    fn broaden_excludes_constrained_alternative_of_same_kind() {
        let schema = json!({"oneOf": [{"type": "null"}, {"type": "object", "required": ["id"]}]});
        let patched = apply_edits(&schema, &[broaden_edit("", JsonKind::Object)]).unwrap();
        assert_eq!(
            patched["oneOf"][2],
            json!({"type": "object", "not": {"type": "object", "required": ["id"]}})
        );
        assert!(valid(json!({"id": "abc"}), &patched));
        assert!(valid(json!({}), &patched));
    }

    #[test]
    fn broaden_excludes_every_overlapping_alternative() {
        let schema = json!({"oneOf": [{"const": "a"}, {"enum": ["b", 1]}, {"type": "null"}]});
        let patched = apply_edits(&schema, &[broaden_edit("", JsonKind::String)]).unwrap();
        assert_eq!(
            patched["oneOf"][3],
            json!({"type": "string", "not": {"anyOf": [{"const": "a"}, {"enum": ["b", 1]}]}})
        );
        assert!(valid(json!("a"), &patched));
        assert!(valid(json!("b"), &patched));
        assert!(valid(json!("c"), &patched));
    }

    #[test]
    fn broaden_with_exclusion_is_idempotent() {
        let schema = json!({"oneOf": [{"type": "null"}, {"enum": ["opened"]}]});
        let edit = [broaden_edit("", JsonKind::String)];
        let once = apply_edits(&schema, &edit).unwrap();
        assert_eq!(apply_edits(&once, &edit).unwrap(), once);
    }

    #[test]
    fn number_next_to_integer_alternative_excludes_integers() {
        let schema = json!({"oneOf": [{"type": "integer"}, {"type": "null"}]});
        let patched = apply_edits(&schema, &[broaden_edit("", JsonKind::Number)]).unwrap();
        assert_eq!(
            patched["oneOf"][2],
            json!({"type": "number", "not": {"type": "integer"}})
        );
        assert!(valid(json!(3), &patched));
        assert!(valid(json!(3.5), &patched));
    }

    #[test]
    fn broadening_root_keeps_definitions_in_place() {
        let schema = json!({
            "$schema": "http://json-schema.org/draft-07/schema#",
            "type": "object",
            "properties": {"sender": {"$ref": "#/definitions/user"}},
            "definitions": {"user": {"type": "object"}}
        });
        let patched = apply_edits(&schema, &[broaden_edit("", JsonKind::Array)]).unwrap();
        assert_eq!(patched["definitions"], schema["definitions"]);
        assert_eq!(patched["$schema"], schema["$schema"]);
        assert_eq!(patched["oneOf"][1], json!({"type": "array"}));
        assert_eq!(patched["oneOf"][0]["type"], json!("object"));
    }

    #[test]
    fn number_next_to_integer_excludes_integers() {
        let schema = json!({"properties": {"size": {"type": "integer"}}});
        let patched =
            apply_edits(&schema, &[broaden_edit("/properties/size", JsonKind::Number)]).unwrap();
        assert_eq!(
            patched["properties"]["size"]["oneOf"][1],
            json!({"type": "number", "not": {"type": "integer"}})
        );
    }

    #[test]
    fn extend_enum_appends_once() {
        let schema = json!({"enum": ["opened", "closed"]});
        let edits = [enum_edit("", json!("reopened")), enum_edit("", json!("reopened"))];
        let patched = apply_edits(&schema, &edits).unwrap();
        assert_eq!(patched, json!({"enum": ["opened", "closed", "reopened"]}));
    }

    #[test]
    fn extend_enum_existing_member_is_unchanged() {
        let schema = json!({"enum": ["opened", "null"]});
        let patched = apply_edits(&schema, &[enum_edit("", json!("null"))]).unwrap();
        assert_eq!(patched, schema);
    }

    #[test]
    fn extend_enum_without_enum_fails() {
        let schema = json!({"properties": {"a": {"type": "string"}}});
        let err = apply_edits(&schema, &[enum_edit("/properties/a", json!("x"))]).unwrap_err();
        assert_eq!(
            err,
            PatchError::NotAnEnum {
                target: "/properties/a".into()
            }
        );
    }

    #[test]
    fn missing_target_fails() {
        let schema = json!({"properties": {}});
        let err = apply_edits(&schema, &[broaden_edit("/properties/a", JsonKind::Null)]).unwrap_err();
        assert!(matches!(err, PatchError::Target(_)), "{err}");
    }

    #[test]
    fn boolean_schema_target_fails() {
        let schema = json!({"properties": {"a": true}});
        let err = apply_edits(&schema, &[broaden_edit("/properties/a", JsonKind::Null)]).unwrap_err();
        assert!(matches!(err, PatchError::NotAnObject { .. }));
    }

    #[test]
    fn nested_edits_survive_ancestor_broadening() {
        let schema = json!({
            "properties": {
                "issue": {
                    "type": "object",
                    "properties": {"state": {"enum": ["open"]}}
                }
            }
        });
        let edits = [
            broaden_edit("/properties/issue", JsonKind::Null),
            enum_edit("/properties/issue/properties/state", json!("closed")),
        ];
        let forward = apply_edits(&schema, &edits).unwrap();
        let reversed: Vec<Edit> = edits.iter().rev().cloned().collect();
        assert_eq!(apply_edits(&schema, &reversed).unwrap(), forward);
        assert_eq!(
            forward["properties"]["issue"]["oneOf"][0]["properties"]["state"]["enum"],
            json!(["open", "closed"])
        );
    }

    #[test]
    fn no_op_edits_are_ignored() {
        let schema = json!({"additionalProperties": false});
        let edits = [Edit::NoOp {
            reason: crate::interpret::NoOpReason::AdditionalProperties,
        }];
        assert_eq!(apply_edits(&schema, &edits).unwrap(), schema);
    }

    #[test]
    fn render_is_pretty_with_trailing_newline() {
        let text = render(&json!({"a": 1})).unwrap();
        assert_eq!(text.as_str(), "{\n  \"a\": 1\n}\n");
    }
}
