//! Change proposer opening labelled pull requests.

use std::sync::Arc;

use async_trait::async_trait;
use drift_repair::{BoundaryError, ChangeId, ChangeProposer};

use crate::client::GithubClient;

/// Opens a pull request per repaired schema. The change id is the pull
/// request number. A pull request already open for the head branch is
/// reused.
#[derive(Debug, Clone)]
pub struct GithubChangeProposer {
    client: Arc<GithubClient>,
}

impl GithubChangeProposer {
    pub fn new(client: Arc<GithubClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ChangeProposer for GithubChangeProposer {
    async fn propose_change(
        &self,
        base_ref: &str,
        head_ref: &str,
        title: &str,
        body: &str,
    ) -> Result<ChangeId, BoundaryError> {
        let open = self
            .client
            .find_open_pull(head_ref, base_ref)
            .await
            .map_err(|e| e.into_boundary("propose_change"))?;
        if let Some(number) = open {
            tracing::info!(number, head_ref, base_ref, "pull request already open");
            return Ok(ChangeId(number.to_string()));
        }

        let number = self
            .client
            .create_pull(title, body, head_ref, base_ref)
            .await
            .map_err(|e| e.into_boundary("propose_change"))?;
        tracing::info!(number, head_ref, base_ref, "pull request opened");
        Ok(ChangeId(number.to_string()))
    }

    async fn label_change(&self, change_id: &ChangeId, labels: &[String]) -> Result<(), BoundaryError> {
        let number: u64 = change_id.as_str().parse().map_err(|_| BoundaryError::Rejected {
            operation: "label_change".into(),
            reason: format!("'{change_id}' is not a pull request number"),
        })?;
        self.client
            .add_labels(number, labels)
            .await
            .map_err(|e| e.into_boundary("label_change"))
    }
}
