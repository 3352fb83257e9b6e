//! # Runtime JSON Kinds
//!
//! The six runtime types a JSON value can have. A `type` violation is
//! repaired by admitting the kind the payload actually carried, so the
//! names here are exactly the JSON Schema `type` keywords for them.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Runtime type of a JSON value.
///
/// Integers report [`JsonKind::Number`]: `integer` is a schema constraint,
/// not something a payload value carries on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JsonKind {
    Null,
    Boolean,
    Number,
    String,
    Array,
    Object,
}

impl JsonKind {
    /// Classify a value.
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(_) => Self::Boolean,
            Value::Number(_) => Self::Number,
            Value::String(_) => Self::String,
            Value::Array(_) => Self::Array,
            Value::Object(_) => Self::Object,
        }
    }

    /// The JSON Schema `type` name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Boolean => "boolean",
            Self::Number => "number",
            Self::String => "string",
            Self::Array => "array",
            Self::Object => "object",
        }
    }

    /// The single-type schema `{ "type": <kind> }`.
    pub fn type_schema(&self) -> Value {
        serde_json::json!({ "type": self.as_str() })
    }
}

impl fmt::Display for JsonKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn classifies_every_variant() {
        assert_eq!(JsonKind::of(&json!(null)), JsonKind::Null);
        assert_eq!(JsonKind::of(&json!(false)), JsonKind::Boolean);
        assert_eq!(JsonKind::of(&json!(3)), JsonKind::Number);
        assert_eq!(JsonKind::of(&json!(3.5)), JsonKind::Number);
        assert_eq!(JsonKind::of(&json!("x")), JsonKind::String);
        assert_eq!(JsonKind::of(&json!([])), JsonKind::Array);
        assert_eq!(JsonKind::of(&json!({})), JsonKind::Object);
    }

    #[test]
    fn type_schema_uses_keyword_name() {
        assert_eq!(JsonKind::Null.type_schema(), json!({"type": "null"}));
        assert_eq!(
            serde_json::to_value(JsonKind::Boolean).unwrap(),
            json!("boolean")
        );
    }
}
