//! # Change Request Report
//!
//! Markdown body of the change request opened for a repaired payload, and
//! the summary surfaced when a payload needs manual review instead. Lists
//! the schema edits applied, the violations a human must look at, and the
//! violations that were skipped or dropped.

use std::fmt::{self, Write as _};

use drift_schema::{Edit, RepairPlan, SkippedViolation, Violation};
use serde::Serialize;

/// What was decided for one invalid payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    /// `event` or `event.action`.
    pub label: String,
    /// Distinct edits applied, in plan order.
    pub edits: Vec<Edit>,
    /// Forbidden extra properties.
    pub manual_review: Vec<Violation>,
    /// Violations with no repair policy and nothing actionable alongside.
    pub unresolvable: Vec<Violation>,
    /// Violations whose pointers did not resolve.
    pub skipped: Vec<SkippedEntry>,
    /// Violations dropped in favour of a more specific edit.
    pub derivative: Vec<Violation>,
}

/// A skipped violation with its resolution failure rendered.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedEntry {
    pub violation: Violation,
    pub reason: String,
}

impl From<&SkippedViolation> for SkippedEntry {
    fn from(skipped: &SkippedViolation) -> Self {
        Self {
            violation: skipped.violation.clone(),
            reason: skipped.error.to_string(),
        }
    }
}

impl Report {
    pub fn new(label: impl Into<String>, plan: &RepairPlan) -> Self {
        let mut edits: Vec<Edit> = Vec::with_capacity(plan.edits.len());
        for edit in &plan.edits {
            if !edits.contains(edit) {
                edits.push(edit.clone());
            }
        }
        Self {
            label: label.into(),
            edits,
            manual_review: plan.manual_review.clone(),
            unresolvable: plan.unresolvable.clone(),
            skipped: plan.skipped.iter().map(SkippedEntry::from).collect(),
            derivative: plan.derivative.clone(),
        }
    }

    /// True when something needs a human regardless of the edits.
    pub fn needs_attention(&self) -> bool {
        !self.manual_review.is_empty() || !self.unresolvable.is_empty() || !self.skipped.is_empty()
    }

    /// Render as a markdown change-request body.
    pub fn to_markdown(&self) -> String {
        let mut out = String::new();
        // Writing to a String cannot fail.
        let _ = self.write_markdown(&mut out);
        out
    }

    fn write_markdown(&self, out: &mut String) -> fmt::Result {
        writeln!(out, "Payload `{}` did not match the schema.", self.label)?;

        if !self.edits.is_empty() {
            writeln!(out, "\n### Schema changes\n")?;
            for edit in &self.edits {
                writeln!(out, "- {edit}")?;
            }
        }

        if !self.manual_review.is_empty() || !self.unresolvable.is_empty() {
            writeln!(out, "\n### Needs manual review\n")?;
            for v in &self.manual_review {
                let names: Vec<String> = v.unexpected.iter().map(|n| format!("`{n}`")).collect();
                writeln!(
                    out,
                    "- `{}`: properties not allowed by the schema: {}",
                    location(v),
                    names.join(", ")
                )?;
            }
            for v in &self.unresolvable {
                writeln!(out, "- `{}` [{}]: {}", location(v), v.keyword, v.message)?;
            }
        }

        if !self.skipped.is_empty() {
            writeln!(out, "\n### Skipped\n")?;
            for entry in &self.skipped {
                writeln!(
                    out,
                    "- `{}` [{}]: {}",
                    location(&entry.violation),
                    entry.violation.keyword,
                    entry.reason
                )?;
            }
        }

        if !self.derivative.is_empty() {
            writeln!(out, "\n<details><summary>Derivative violations</summary>\n")?;
            for v in &self.derivative {
                writeln!(out, "- `{}` [{}]: {}", location(v), v.keyword, v.message)?;
            }
            writeln!(out, "\n</details>")?;
        }
        Ok(())
    }
}

fn location(v: &Violation) -> String {
    if v.data_pointer.is_root() {
        "(root)".to_string()
    } else {
        v.data_pointer.to_string()
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_markdown())
    }
}
