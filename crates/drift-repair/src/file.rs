//! File-backed collaborators for dry runs.
//!
//! [`FileSchemaStore`] reads the reference schema from disk and writes each
//! committed version to `<out_dir>/<target_ref>/<file name>`.
//! [`LoggingProposer`] logs each change request instead of opening one.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use drift_core::CanonicalText;

use crate::boundary::{BoundaryError, ChangeId, ChangeProposer, SchemaStore};

/// Schema store over a local file.
#[derive(Debug, Clone)]
pub struct FileSchemaStore {
    schema_path: PathBuf,
    out_dir: PathBuf,
}

impl FileSchemaStore {
    pub fn new(schema_path: impl Into<PathBuf>, out_dir: impl Into<PathBuf>) -> Self {
        Self {
            schema_path: schema_path.into(),
            out_dir: out_dir.into(),
        }
    }

    /// Where a commit to `target_ref` is written.
    pub fn committed_path(&self, target_ref: &str) -> Result<PathBuf, BoundaryError> {
        let file_name = self.schema_path.file_name().ok_or_else(|| BoundaryError::Rejected {
            operation: "commit_schema_text".into(),
            reason: format!("'{}' has no file name", self.schema_path.display()),
        })?;
        if target_ref.is_empty() || target_ref.split('/').any(|c| c.is_empty() || c == "..") {
            return Err(BoundaryError::Rejected {
                operation: "commit_schema_text".into(),
                reason: format!("invalid target ref '{target_ref}'"),
            });
        }
        Ok(self.out_dir.join(target_ref).join(file_name))
    }
}

fn io_error(operation: &str, path: &Path, error: std::io::Error) -> BoundaryError {
    BoundaryError::Io {
        operation: operation.to_string(),
        reason: format!("{}: {error}", path.display()),
    }
}

#[async_trait]
impl SchemaStore for FileSchemaStore {
    async fn fetch_schema_text(&self) -> Result<String, BoundaryError> {
        tokio::fs::read_to_string(&self.schema_path)
            .await
            .map_err(|e| io_error("fetch_schema_text", &self.schema_path, e))
    }

    async fn commit_schema_text(
        &self,
        text: &CanonicalText,
        target_ref: &str,
    ) -> Result<(), BoundaryError> {
        let path = self.committed_path(target_ref)?;
        if let Some(dir) = path.parent() {
            tokio::fs::create_dir_all(dir)
                .await
                .map_err(|e| io_error("commit_schema_text", dir, e))?;
        }
        tokio::fs::write(&path, text.as_bytes())
            .await
            .map_err(|e| io_error("commit_schema_text", &path, e))?;
        tracing::info!(path = %path.display(), target_ref, "schema version written");
        Ok(())
    }
}

/// Change proposer that only logs, handing out sequential ids.
#[derive(Debug, Default)]
pub struct LoggingProposer {
    next: AtomicU64,
}

impl LoggingProposer {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ChangeProposer for LoggingProposer {
    async fn propose_change(
        &self,
        base_ref: &str,
        head_ref: &str,
        title: &str,
        body: &str,
    ) -> Result<ChangeId, BoundaryError> {
        let id = self.next.fetch_add(1, Ordering::Relaxed) + 1;
        let change_id = ChangeId(format!("dry-run-{id}"));
        tracing::info!(%change_id, base_ref, head_ref, title, "change request (dry run)");
        tracing::debug!(%change_id, body, "change request body");
        Ok(change_id)
    }

    async fn label_change(&self, change_id: &ChangeId, labels: &[String]) -> Result<(), BoundaryError> {
        tracing::info!(%change_id, labels = ?labels, "labels (dry run)");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn commit_writes_under_target_ref() {
        let dir = tempfile::tempdir().unwrap();
        let schema_path = dir.path().join("schema.json");
        std::fs::write(&schema_path, "{}\n").unwrap();
        let out = dir.path().join("out");

        let store = FileSchemaStore::new(&schema_path, &out);
        assert_eq!(store.fetch_schema_text().await.unwrap(), "{}\n");

        let text = CanonicalText::new(&json!({"type": "object"})).unwrap();
        store.commit_schema_text(&text, "schemas-update-1").await.unwrap();
        let written = std::fs::read_to_string(out.join("schemas-update-1").join("schema.json")).unwrap();
        assert_eq!(written, text.as_str());
        assert_eq!(std::fs::read_to_string(&schema_path).unwrap(), "{}\n");
    }

    #[tokio::test]
    async fn missing_schema_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSchemaStore::new(dir.path().join("absent.json"), dir.path());
        let err = store.fetch_schema_text().await.unwrap_err();
        assert!(matches!(err, BoundaryError::Io { .. }), "{err}");
    }

    #[test]
    fn parent_traversal_is_rejected() {
        let store = FileSchemaStore::new("schema.json", "/tmp/out");
        assert!(store.committed_path("../escape").is_err());
        assert!(store.committed_path("").is_err());
        assert!(store.committed_path("feature/x").is_ok());
    }

    #[tokio::test]
    async fn logging_proposer_ids_are_sequential() {
        let proposer = LoggingProposer::new();
        let a = proposer.propose_change("master", "h", "t", "b").await.unwrap();
        let b = proposer.propose_change("master", "h", "t", "b").await.unwrap();
        assert_eq!(a.as_str(), "dry-run-1");
        assert_eq!(b.as_str(), "dry-run-2");
    }
}
