//! # Payload Validation
//!
//! Runtime validation of event payloads against the reference schema,
//! producing a structured, ordered list of violations.
//!
//! ## Engine Errors Are Not Invalid Payloads
//!
//! A schema the engine cannot compile is reported as
//! [`SchemaValidationError::Engine`]. Callers must not treat that as an
//! invalid payload: nothing is known about the payload and no repair may
//! be attempted.
//!
//! ## `oneOf` Descent
//!
//! When no `oneOf` branch matches, the engine only says so; it does not
//! say why. The reference schema is usually a top-level `oneOf` of event
//! shapes, so that single violation would hide the field that actually
//! drifted. For every such violation the validator evaluates each branch
//! on its own, keeps the branch that came closest (fewest violations,
//! lowest index on ties), and reports that branch's violations ahead of
//! the `oneOf` violation itself.
//!
//! A branch is evaluated by rewriting the `oneOf` node into an `allOf`
//! holding just that branch inside a copy of the whole schema, so
//! local `$ref`s keep resolving. The copy's locations are rewritten back
//! to `.../oneOf/<branch>/...`.
//!
//! ## Determinism
//!
//! Violation order is the engine's traversal order with descended branch
//! violations inserted before their `oneOf`. The same payload and schema
//! always produce the same list.

use std::fmt;

use drift_core::JsonPointer;
use jsonschema::error::ValidationErrorKind;
use jsonschema::{Draft, Retrieve, Uri, ValidationError, ValidationOptions, Validator};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::locate::locate;

/// Retriever that answers every external `$ref` with a permissive schema.
///
/// Validation runs once per delivered event and must never perform
/// network I/O. References into the document itself are resolved by the
/// engine without consulting the retriever.
struct OfflineRetriever;

impl Retrieve for OfflineRetriever {
    fn retrieve(
        &self,
        uri: &Uri<&str>,
    ) -> Result<Value, Box<dyn std::error::Error + Send + Sync>> {
        tracing::debug!(uri = uri.as_str(), "external $ref answered with permissive schema");
        Ok(serde_json::json!({}))
    }
}

/// The validation engine could not run.
#[derive(Error, Debug)]
pub enum SchemaValidationError {
    /// The schema could not be compiled (malformed, unsupported keyword).
    #[error("validation engine error: {reason}")]
    Engine {
        /// Engine-supplied reason.
        reason: String,
    },

    /// The engine reported a location that is not a valid JSON pointer.
    #[error("validation engine reported malformed location '{location}'")]
    MalformedLocation {
        /// The location text.
        location: String,
    },
}

/// The rule kind a violation broke.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Keyword {
    Type,
    Enum,
    AdditionalProperties,
    OneOf,
    /// Any other keyword, by name.
    Other(String),
}

impl Keyword {
    /// The JSON Schema keyword name.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Type => "type",
            Self::Enum => "enum",
            Self::AdditionalProperties => "additionalProperties",
            Self::OneOf => "oneOf",
            Self::Other(name) => name,
        }
    }
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single validation violation with structured context.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Violation {
    /// Pointer to the offending value in the payload.
    pub data_pointer: JsonPointer,
    /// Pointer to the broken rule in the schema, ending in the keyword.
    pub schema_pointer: JsonPointer,
    /// The rule kind.
    pub keyword: Keyword,
    /// Human-readable description from the engine.
    pub message: String,
    /// Property names rejected by `additionalProperties`; empty otherwise.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub unexpected: Vec<String>,
}

impl Violation {
    fn from_engine(error: &ValidationError<'_>) -> Result<Self, SchemaValidationError> {
        let data_pointer = parse_location(&error.instance_path.to_string())?;
        let schema_pointer = parse_location(&error.schema_path.to_string())?;
        let keyword = match &error.kind {
            ValidationErrorKind::Type { .. } => Keyword::Type,
            ValidationErrorKind::Enum { .. } => Keyword::Enum,
            ValidationErrorKind::AdditionalProperties { .. } => Keyword::AdditionalProperties,
            ValidationErrorKind::OneOfNotValid { .. }
            | ValidationErrorKind::OneOfMultipleValid { .. } => Keyword::OneOf,
            _ => Keyword::Other(schema_pointer.last().unwrap_or("schema").to_string()),
        };
        let unexpected = match &error.kind {
            ValidationErrorKind::AdditionalProperties { unexpected } => unexpected.clone(),
            _ => Vec::new(),
        };
        Ok(Self {
            data_pointer,
            schema_pointer,
            keyword,
            message: error.to_string(),
            unexpected,
        })
    }
}

fn parse_location(location: &str) -> Result<JsonPointer, SchemaValidationError> {
    JsonPointer::parse(location).map_err(|_| SchemaValidationError::MalformedLocation {
        location: location.to_string(),
    })
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.data_pointer.is_root() {
            write!(f, "  (root) [{}]: {}", self.keyword, self.message)
        } else {
            write!(f, "  {} [{}]: {}", self.data_pointer, self.keyword, self.message)
        }
    }
}

/// Collection of validation violations, in traversal order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationViolations {
    violations: Vec<Violation>,
}

impl ValidationViolations {
    /// Returns the number of violations.
    pub fn len(&self) -> usize {
        self.violations.len()
    }

    /// Returns true if there are no violations.
    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    /// Returns a slice of all violations.
    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    /// Consumes self and returns the inner Vec.
    pub fn into_inner(self) -> Vec<Violation> {
        self.violations
    }
}

impl fmt::Display for ValidationViolations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, v) in self.violations.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{v}")?;
        }
        Ok(())
    }
}

/// Result of validating one payload.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationOutcome {
    Valid,
    Invalid(ValidationViolations),
}

impl ValidationOutcome {
    /// True for [`ValidationOutcome::Valid`].
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }

    /// The violations; empty when valid.
    pub fn violations(&self) -> &[Violation] {
        match self {
            Self::Valid => &[],
            Self::Invalid(v) => v.violations(),
        }
    }
}

/// A compiled reference schema.
///
/// Compilation happens once at construction; `validate` may be called for
/// any number of payloads. `SchemaValidator` is `Send + Sync`.
pub struct SchemaValidator {
    schema: Value,
    validator: Validator,
}

impl fmt::Debug for SchemaValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaValidator")
            .field("schema", &self.schema)
            .finish_non_exhaustive()
    }
}

impl SchemaValidator {
    /// Compile `schema`.
    ///
    /// # Errors
    ///
    /// Returns `SchemaValidationError::Engine` if the engine rejects the
    /// schema.
    pub fn new(schema: &Value) -> Result<Self, SchemaValidationError> {
        let validator = compile(schema)?;
        Ok(Self {
            schema: schema.clone(),
            validator,
        })
    }

    /// The schema this validator was compiled from.
    pub fn schema(&self) -> &Value {
        &self.schema
    }

    /// Validate one payload.
    ///
    /// # Errors
    ///
    /// Returns a [`SchemaValidationError`] if the engine reports a
    /// malformed location. Branch schemas built for `oneOf` descent that
    /// fail to compile are skipped, not reported.
    pub fn validate(&self, payload: &Value) -> Result<ValidationOutcome, SchemaValidationError> {
        let mut violations = Vec::new();
        collect(&self.validator, &self.schema, payload, &mut violations, true)?;
        if violations.is_empty() {
            Ok(ValidationOutcome::Valid)
        } else {
            Ok(ValidationOutcome::Invalid(ValidationViolations { violations }))
        }
    }
}

/// Compile `schema` and validate `payload` against it.
///
/// # Errors
///
/// See [`SchemaValidator::new`] and [`SchemaValidator::validate`].
pub fn validate(payload: &Value, schema: &Value) -> Result<ValidationOutcome, SchemaValidationError> {
    SchemaValidator::new(schema)?.validate(payload)
}

/// Options shared by the reference schema and every branch schema.
///
/// The draft follows `$schema` when present and defaults to Draft 7.
fn build_options(schema: &Value) -> ValidationOptions {
    let mut opts = jsonschema::options();
    if schema.get("$schema").is_none() {
        opts.with_draft(Draft::Draft7);
    }
    opts.with_retriever(OfflineRetriever);
    opts
}

fn compile(schema: &Value) -> Result<Validator, SchemaValidationError> {
    build_options(schema)
        .build(schema)
        .map_err(|e| SchemaValidationError::Engine {
            reason: e.to_string(),
        })
}

fn collect(
    validator: &Validator,
    schema: &Value,
    payload: &Value,
    out: &mut Vec<Violation>,
    descend: bool,
) -> Result<(), SchemaValidationError> {
    for error in validator.iter_errors(payload) {
        let violation = Violation::from_engine(&error)?;
        if descend && matches!(error.kind, ValidationErrorKind::OneOfNotValid { .. }) {
            out.extend(descend_one_of(schema, payload, &violation)?);
        }
        out.push(violation);
    }
    Ok(())
}

/// Violations of the closest branch of the `oneOf` that `violation` reports.
///
/// Branches are ranked on their own top-level violations: a branch whose
/// `type` rejects the value's kind ranks after every branch that accepts
/// it, then fewer violations win, then the lower index. Nested `oneOf`s
/// are only descended for the winning branch.
///
/// Returns nothing when the `oneOf` node cannot be located or no branch
/// could be checked; the `oneOf` violation alone still stands.
fn descend_one_of(
    schema: &Value,
    payload: &Value,
    violation: &Violation,
) -> Result<Vec<Violation>, SchemaValidationError> {
    let Some(reported_node) = violation.schema_pointer.parent() else {
        return Ok(Vec::new());
    };
    let node = match locate(schema, &reported_node) {
        Ok(node) => node,
        Err(e) => {
            tracing::debug!(error = %e, "oneOf node not locatable, not descending");
            return Ok(Vec::new());
        }
    };
    let Some(branches) = node
        .resolve(schema)
        .ok()
        .and_then(|n| n.get("oneOf"))
        .and_then(Value::as_array)
    else {
        return Ok(Vec::new());
    };

    let mut best: Option<((bool, usize), usize, BranchSchema, Validator)> = None;
    for (index, branch) in branches.iter().enumerate() {
        let Some(isolated) = BranchSchema::build(schema, &node, branch) else {
            continue;
        };
        let validator = match compile(&isolated.schema) {
            Ok(v) => v,
            Err(e) => {
                tracing::debug!(branch = index, error = %e, "oneOf branch did not compile");
                continue;
            }
        };
        let shallow = isolated.violations(&validator, payload, violation, &reported_node, index, false)?;
        let rejects_kind = shallow
            .iter()
            .any(|v| v.keyword == Keyword::Type && v.data_pointer == violation.data_pointer);
        let rank = (rejects_kind, shallow.len());
        if best.as_ref().map_or(true, |(r, ..)| rank < *r) {
            best = Some((rank, index, isolated, validator));
        }
    }

    match best {
        Some((_, index, isolated, validator)) => {
            isolated.violations(&validator, payload, violation, &reported_node, index, true)
        }
        None => Ok(Vec::new()),
    }
}

/// A copy of the schema with one `oneOf` node evaluating a single branch.
struct BranchSchema {
    schema: Value,
    /// Number of `allOf` entries the node had before the branch was added.
    preexisting: usize,
}

impl BranchSchema {
    fn build(schema: &Value, node: &JsonPointer, branch: &Value) -> Option<Self> {
        let mut copy = schema.clone();
        let target = node.resolve_mut(&mut copy).ok()?.as_object_mut()?;
        target.remove("oneOf");
        let all_of = target
            .entry("allOf")
            .or_insert_with(|| Value::Array(Vec::new()))
            .as_array_mut()?;
        let preexisting = all_of.len();
        all_of.push(branch.clone());
        Some(Self {
            schema: copy,
            preexisting,
        })
    }

    /// Violations of the isolated branch at or below the `oneOf`'s instance,
    /// with schema paths restored to `.../oneOf/<branch>/...`.
    fn violations(
        &self,
        validator: &Validator,
        payload: &Value,
        one_of: &Violation,
        node: &JsonPointer,
        branch: usize,
        descend: bool,
    ) -> Result<Vec<Violation>, SchemaValidationError> {
        let mut found = Vec::new();
        collect(validator, &self.schema, payload, &mut found, descend)?;
        Ok(found
            .into_iter()
            .filter(|v| v.data_pointer.starts_with(&one_of.data_pointer))
            .filter_map(|v| self.restore(node, branch, v))
            .collect())
    }

    /// Map a violation under the copy's `allOf` entry back to the
    /// `oneOf` branch it came from; `None` for violations elsewhere.
    fn restore(&self, node: &JsonPointer, branch: usize, v: Violation) -> Option<Violation> {
        let tokens = v.schema_pointer.tokens();
        if tokens.len() < node.len() {
            return None;
        }
        let (head, rest) = tokens.split_at(node.len());
        if head != node.tokens() {
            return None;
        }
        let (keyword, rest) = rest.split_first()?;
        if keyword != "allOf" {
            return None;
        }
        let branch_index = self.preexisting.to_string();
        // A single-entry allOf may be reported without its index.
        let rest = match rest.split_first() {
            Some((index, tail)) if *index == branch_index => tail,
            _ if self.preexisting == 0 => rest,
            _ => return None,
        };
        let schema_pointer = JsonPointer::from_tokens(
            head.iter()
                .cloned()
                .chain(["oneOf".to_string(), branch.to_string()])
                .chain(rest.iter().cloned()),
        );
        Some(Violation { schema_pointer, ..v })
    }
}
