//! # Event Envelope
//!
//! One delivered event: the transport's event-kind label plus the JSON
//! payload. The payload is never modified by schema-drift; the envelope
//! only offers read access to it.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The transport's event-kind label (e.g. `push`, `issues`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventName(pub String);

impl EventName {
    /// Access the label.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EventName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EventName {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl From<String> for EventName {
    fn from(name: String) -> Self {
        Self(name)
    }
}

/// A delivered event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    name: EventName,
    payload: Value,
}

impl Event {
    /// Wrap a payload received under `name`.
    pub fn new(name: impl Into<EventName>, payload: Value) -> Self {
        Self {
            name: name.into(),
            payload,
        }
    }

    /// The event-kind label.
    pub fn name(&self) -> &EventName {
        &self.name
    }

    /// The payload, read-only.
    pub fn payload(&self) -> &Value {
        &self.payload
    }

    /// The payload's string `action` member, when it has one.
    pub fn action(&self) -> Option<&str> {
        self.payload.get("action").and_then(Value::as_str)
    }

    /// `name` or `name.action`, used in log lines and change titles.
    pub fn label(&self) -> String {
        match self.action() {
            Some(action) => format!("{}.{action}", self.name),
            None => self.name.to_string(),
        }
    }
}
