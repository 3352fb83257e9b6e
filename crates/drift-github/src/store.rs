//! Schema store backed by a file in a GitHub repository.

use std::sync::Arc;

use async_trait::async_trait;
use drift_core::CanonicalText;
use drift_repair::{BoundaryError, SchemaStore};

use crate::client::GithubClient;
use crate::config::GithubConfig;

/// Reads the reference schema from the configured branch and commits new
/// versions to head branches created from it.
#[derive(Debug, Clone)]
pub struct GithubSchemaStore {
    client: Arc<GithubClient>,
    schema_path: String,
    schema_branch: String,
    commit_message: String,
}

impl GithubSchemaStore {
    pub fn new(client: Arc<GithubClient>, config: &GithubConfig) -> Self {
        Self {
            client,
            schema_path: config.schema_path.clone(),
            schema_branch: config.schema_branch.clone(),
            commit_message: config.commit_message.clone(),
        }
    }
}

#[async_trait]
impl SchemaStore for GithubSchemaStore {
    async fn fetch_schema_text(&self) -> Result<String, BoundaryError> {
        const OP: &str = "fetch_schema_text";
        let file = self
            .client
            .get_file(&self.schema_path, &self.schema_branch)
            .await
            .map_err(|e| e.into_boundary(OP))?
            .ok_or_else(|| BoundaryError::Rejected {
                operation: OP.into(),
                reason: format!("{} not found on {}", self.schema_path, self.schema_branch),
            })?;
        Ok(file.text)
    }

    async fn commit_schema_text(
        &self,
        text: &CanonicalText,
        target_ref: &str,
    ) -> Result<(), BoundaryError> {
        const OP: &str = "commit_schema_text";
        let existing_branch = self
            .client
            .get_branch_sha(target_ref)
            .await
            .map_err(|e| e.into_boundary(OP))?;

        if existing_branch.is_none() {
            let base_sha = self
                .client
                .get_branch_sha(&self.schema_branch)
                .await
                .map_err(|e| e.into_boundary(OP))?
                .ok_or_else(|| BoundaryError::Rejected {
                    operation: OP.into(),
                    reason: format!("base branch {} not found", self.schema_branch),
                })?;
            self.client
                .create_branch(target_ref, &base_sha)
                .await
                .map_err(|e| e.into_boundary(OP))?;
            tracing::info!(branch = target_ref, base = %self.schema_branch, "head branch created");
        }

        let current = self
            .client
            .get_file(&self.schema_path, target_ref)
            .await
            .map_err(|e| e.into_boundary(OP))?;
        if current.as_ref().is_some_and(|f| text.matches(&f.text)) {
            tracing::info!(branch = target_ref, "head branch already holds this schema version");
            return Ok(());
        }

        self.client
            .put_file(
                &self.schema_path,
                target_ref,
                &self.commit_message,
                text.as_str(),
                current.as_ref().map(|f| f.sha.as_str()),
            )
            .await
            .map_err(|e| e.into_boundary(OP))?;
        tracing::info!(branch = target_ref, path = %self.schema_path, "schema version committed");
        Ok(())
    }
}
