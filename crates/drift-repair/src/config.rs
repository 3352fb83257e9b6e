//! Repair pipeline configuration.
//!
//! Defaults match the webhook schema repository: change requests target
//! `master`, head refs are `schemas-update-<digest>`, and every request is
//! labelled `maintenance`.

/// Where and how change requests are opened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepairConfig {
    /// Ref change requests are opened against.
    pub base_ref: String,
    /// Prefix of the head ref each patched schema is committed to.
    pub head_ref_prefix: String,
    /// Change request title.
    pub title: String,
    /// Labels applied to every change request.
    pub labels: Vec<String>,
}

impl Default for RepairConfig {
    fn default() -> Self {
        Self {
            base_ref: "master".to_string(),
            head_ref_prefix: "schemas-update".to_string(),
            title: "Update schemas".to_string(),
            labels: vec!["maintenance".to_string()],
        }
    }
}

impl RepairConfig {
    /// Load configuration from environment variables.
    ///
    /// Variables (unset or empty keeps the default):
    /// - `DRIFT_BASE_REF` (default: `master`)
    /// - `DRIFT_HEAD_REF_PREFIX` (default: `schemas-update`)
    /// - `DRIFT_PR_TITLE` (default: `Update schemas`)
    /// - `DRIFT_LABELS`, comma separated (default: `maintenance`)
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();
        Self {
            base_ref: var("DRIFT_BASE_REF").unwrap_or(defaults.base_ref),
            head_ref_prefix: var("DRIFT_HEAD_REF_PREFIX").unwrap_or(defaults.head_ref_prefix),
            title: var("DRIFT_PR_TITLE").unwrap_or(defaults.title),
            labels: var("DRIFT_LABELS")
                .map(|raw| parse_labels(&raw))
                .unwrap_or(defaults.labels),
        }
    }

    /// Head ref for a patched schema with the given digest.
    pub fn head_ref(&self, digest_hex: &str) -> String {
        format!("{}-{digest_hex}", self.head_ref_prefix)
    }
}

fn parse_labels(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults() {
        let cfg = RepairConfig::default();
        assert_eq!(cfg.base_ref, "master");
        assert_eq!(cfg.labels, vec!["maintenance"]);
        assert_eq!(cfg.head_ref("0123abcd"), "schemas-update-0123abcd");
    }

    #[test]
    fn lookup_overrides_and_keeps_defaults() {
        let env: HashMap<&str, &str> = [
            ("DRIFT_BASE_REF", "main"),
            ("DRIFT_LABELS", "schema, automated ,,"),
            ("DRIFT_PR_TITLE", "  "),
        ]
        .into_iter()
        .collect();
        let cfg = RepairConfig::from_lookup(|name| env.get(name).map(|v| v.to_string()));
        assert_eq!(cfg.base_ref, "main");
        assert_eq!(cfg.labels, vec!["schema", "automated"]);
        assert_eq!(cfg.title, "Update schemas");
        assert_eq!(cfg.head_ref_prefix, "schemas-update");
    }
}
