//! # Violation Interpreter
//!
//! Turns each [`Violation`] into an [`Edit`]: locate the offending value in
//! the payload and the offending rule in the schema, then pick the
//! corrective edit for the violated keyword.
//!
//! ## Edit Policy
//!
//! | Keyword | Edit |
//! |---------|------|
//! | `type` | [`Edit::BroadenType`]: admit the observed runtime kind as a new `oneOf` alternative |
//! | `enum` | [`Edit::ExtendEnum`]: append the observed value (`null` is recorded as the string `"null"`) |
//! | `additionalProperties` | [`Edit::NoOp`]: surfaced for manual review, never auto-repaired |
//! | anything else | [`Edit::NoOp`]: derivative of a more specific violation |
//!
//! Edits are additive only. Nothing here ever removes or narrows an
//! accepted shape.
//!
//! ## Planning
//!
//! [`plan`] folds a whole violation list into a [`RepairPlan`]. A
//! violation whose pointers cannot be resolved is skipped and logged; the
//! rest of the list is still interpreted. Derivative violations are dropped
//! once an actionable edit exists, and become the unresolvable set when
//! none does.

use std::fmt;

use drift_core::{JsonKind, JsonPointer, ResolutionError};
use serde::Serialize;
use serde_json::Value;

use crate::locate::locate;
use crate::validate::{Keyword, SchemaValidationError, SchemaValidator, ValidationOutcome, Violation};

/// Why an edit is a no-op.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase", tag = "kind", content = "keyword")]
pub enum NoOpReason {
    /// `additionalProperties` violations are not auto-repaired.
    AdditionalProperties,
    /// The keyword has no edit policy of its own.
    Derivative(String),
}

/// An instruction to mutate one schema node.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase", tag = "edit")]
pub enum Edit {
    /// Admit `observed` at `target` as an additional `oneOf` alternative.
    BroadenType {
        target: JsonPointer,
        observed: JsonKind,
    },
    /// Append `value` to the `enum` list at `target`.
    ExtendEnum { target: JsonPointer, value: Value },
    /// No schema mutation.
    NoOp { reason: NoOpReason },
}

impl Edit {
    /// The node this edit mutates; `None` for no-ops.
    pub fn target(&self) -> Option<&JsonPointer> {
        match self {
            Self::BroadenType { target, .. } | Self::ExtendEnum { target, .. } => Some(target),
            Self::NoOp { .. } => None,
        }
    }

    /// True for edits that mutate the schema.
    pub fn is_actionable(&self) -> bool {
        !matches!(self, Self::NoOp { .. })
    }
}

impl fmt::Display for Edit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BroadenType { target, observed } => {
                write!(f, "broaden `{}` to also accept `{observed}`", display_target(target))
            }
            Self::ExtendEnum { target, value } => {
                write!(f, "add `{value}` to the enum at `{}`", display_target(target))
            }
            Self::NoOp {
                reason: NoOpReason::AdditionalProperties,
            } => f.write_str("no change (additional properties need manual review)"),
            Self::NoOp {
                reason: NoOpReason::Derivative(keyword),
            } => write!(f, "no change (`{keyword}` has no repair policy)"),
        }
    }
}

fn display_target(target: &JsonPointer) -> String {
    if target.is_root() {
        "#".to_string()
    } else {
        format!("#{target}")
    }
}

/// A violation with its pointers walked.
#[derive(Debug, Clone)]
pub struct ResolvedViolation<'a> {
    /// The violation.
    pub violation: &'a Violation,
    /// The payload value at `data_pointer`.
    pub offending_value: &'a Value,
    /// Canonical location of the node holding the broken keyword.
    pub owner: JsonPointer,
    /// The schema node at `owner`.
    pub offending_node: &'a Value,
}

/// Walk a violation's pointers through the payload and the schema.
///
/// The rule owner is the schema pointer without its trailing keyword,
/// followed through any local `$ref`s.
///
/// # Errors
///
/// Returns a [`ResolutionError`] when either pointer names a location
/// missing from its document.
pub fn resolve<'a>(
    violation: &'a Violation,
    payload: &'a Value,
    schema: &'a Value,
) -> Result<ResolvedViolation<'a>, ResolutionError> {
    let offending_value = violation.data_pointer.resolve(payload)?;
    let reported_owner = match violation.schema_pointer.last() {
        Some(last) if last == violation.keyword.as_str() => violation
            .schema_pointer
            .parent()
            .unwrap_or_else(JsonPointer::root),
        _ => violation.schema_pointer.clone(),
    };
    let owner = locate(schema, &reported_owner)?;
    let offending_node = owner.resolve(schema)?;
    Ok(ResolvedViolation {
        violation,
        offending_value,
        owner,
        offending_node,
    })
}

/// Decide the corrective edit for one violation.
///
/// # Errors
///
/// Returns a [`ResolutionError`] when the violation's pointers cannot be
/// resolved against `payload` and `schema`.
pub fn interpret(
    violation: &Violation,
    payload: &Value,
    schema: &Value,
) -> Result<Edit, ResolutionError> {
    let resolved = resolve(violation, payload, schema)?;
    let edit = match &violation.keyword {
        Keyword::Type => Edit::BroadenType {
            target: broadening_target(resolved.owner),
            observed: JsonKind::of(resolved.offending_value),
        },
        Keyword::Enum => Edit::ExtendEnum {
            target: resolved.owner,
            value: enum_member(resolved.offending_value),
        },
        Keyword::AdditionalProperties => Edit::NoOp {
            reason: NoOpReason::AdditionalProperties,
        },
        Keyword::OneOf | Keyword::Other(_) => Edit::NoOp {
            reason: NoOpReason::Derivative(violation.keyword.as_str().to_string()),
        },
    };
    Ok(edit)
}

/// A `type` rule that is itself a `oneOf` alternative is broadened by
/// extending that `oneOf`, not by nesting a new one inside the alternative.
fn broadening_target(owner: JsonPointer) -> JsonPointer {
    let tokens = owner.tokens();
    if let [.., list, index] = tokens {
        if list == "oneOf" && index.bytes().all(|b| b.is_ascii_digit()) {
            if let Some(container) = owner.parent().and_then(|p| p.parent()) {
                return container;
            }
        }
    }
    owner
}

/// The enum entry recorded for an observed value.
///
/// JSON `null` is recorded as the string `"null"`; consumers of the
/// reference schema read that sentinel.
pub fn enum_member(value: &Value) -> Value {
    match value {
        Value::Null => Value::String("null".to_string()),
        other => other.clone(),
    }
}

/// A violation that was skipped because its pointers did not resolve.
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedViolation {
    /// The violation.
    pub violation: Violation,
    /// Why it could not be interpreted.
    pub error: ResolutionError,
}

/// Everything the interpreter decided for one payload.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RepairPlan {
    /// Actionable edits, in violation order.
    pub edits: Vec<Edit>,
    /// `additionalProperties` violations, surfaced for manual review.
    pub manual_review: Vec<Violation>,
    /// Violations without a policy, dropped because an actionable edit exists.
    pub derivative: Vec<Violation>,
    /// Violations without a policy and nothing actionable to fall back on.
    pub unresolvable: Vec<Violation>,
    /// Violations whose pointers could not be resolved.
    pub skipped: Vec<SkippedViolation>,
}

impl RepairPlan {
    /// True when at least one edit mutates the schema.
    pub fn is_actionable(&self) -> bool {
        !self.edits.is_empty()
    }
}

/// Interpret every violation of one payload.
pub fn plan(violations: &[Violation], payload: &Value, schema: &Value) -> RepairPlan {
    let mut plan = RepairPlan::default();
    let mut without_policy = Vec::new();

    for violation in violations {
        match interpret(violation, payload, schema) {
            Ok(Edit::NoOp {
                reason: NoOpReason::AdditionalProperties,
            }) => plan.manual_review.push(violation.clone()),
            Ok(Edit::NoOp {
                reason: NoOpReason::Derivative(_),
            }) => without_policy.push(violation.clone()),
            Ok(edit) => plan.edits.push(edit),
            Err(error) => {
                tracing::warn!(
                    data_pointer = %violation.data_pointer,
                    schema_pointer = %violation.schema_pointer,
                    keyword = %violation.keyword,
                    %error,
                    "skipping violation that does not resolve"
                );
                plan.skipped.push(SkippedViolation {
                    violation: violation.clone(),
                    error,
                });
            }
        }
    }

    if plan.edits.is_empty() {
        plan.unresolvable = without_policy;
    } else {
        plan.derivative = without_policy;
    }
    plan
}

/// Validation result together with the plan for an invalid payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Diagnosis {
    Valid,
    Invalid {
        violations: Vec<Violation>,
        plan: RepairPlan,
    },
}

/// Validate `payload` and, when invalid, plan the repair.
///
/// # Errors
///
/// Propagates engine errors from [`SchemaValidator::validate`]; an engine
/// error never yields a plan.
pub fn diagnose(validator: &SchemaValidator, payload: &Value) -> Result<Diagnosis, SchemaValidationError> {
    match validator.validate(payload)? {
        ValidationOutcome::Valid => Ok(Diagnosis::Valid),
        ValidationOutcome::Invalid(violations) => {
            let violations = violations.into_inner();
            let plan = plan(&violations, payload, validator.schema());
            Ok(Diagnosis::Invalid { violations, plan })
        }
    }
}
