//! In-memory collaborators.
//!
//! Used by tests and by callers embedding the pipeline without a remote
//! store. State is guarded by `parking_lot` locks; no lock is held across
//! an `.await`.

use async_trait::async_trait;
use drift_core::CanonicalText;
use parking_lot::{Mutex, RwLock};

use crate::boundary::{BoundaryError, ChangeId, ChangeProposer, SchemaStore};

/// A schema version written by [`InMemorySchemaStore::commit_schema_text`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Commit {
    pub target_ref: String,
    pub text: String,
}

/// Schema store holding the reference text in memory.
///
/// Commits are recorded, not applied: the reference text stays what it
/// was, as it would on a store where commits land on a side branch.
#[derive(Debug, Default)]
pub struct InMemorySchemaStore {
    current: RwLock<String>,
    commits: Mutex<Vec<Commit>>,
    fetch_failure: Mutex<Option<BoundaryError>>,
    commit_failure: Mutex<Option<BoundaryError>>,
}

impl InMemorySchemaStore {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            current: RwLock::new(text.into()),
            ..Self::default()
        }
    }

    /// Replace the reference text.
    pub fn set_text(&self, text: impl Into<String>) {
        *self.current.write() = text.into();
    }

    /// Every commit so far, oldest first.
    pub fn commits(&self) -> Vec<Commit> {
        self.commits.lock().clone()
    }

    /// Fail the next fetch with `error`.
    pub fn fail_next_fetch(&self, error: BoundaryError) {
        *self.fetch_failure.lock() = Some(error);
    }

    /// Fail the next commit with `error`.
    pub fn fail_next_commit(&self, error: BoundaryError) {
        *self.commit_failure.lock() = Some(error);
    }
}

#[async_trait]
impl SchemaStore for InMemorySchemaStore {
    async fn fetch_schema_text(&self) -> Result<String, BoundaryError> {
        if let Some(error) = self.fetch_failure.lock().take() {
            return Err(error);
        }
        Ok(self.current.read().clone())
    }

    async fn commit_schema_text(
        &self,
        text: &CanonicalText,
        target_ref: &str,
    ) -> Result<(), BoundaryError> {
        if let Some(error) = self.commit_failure.lock().take() {
            return Err(error);
        }
        self.commits.lock().push(Commit {
            target_ref: target_ref.to_string(),
            text: text.as_str().to_string(),
        });
        Ok(())
    }
}

/// A change request opened through [`RecordingProposer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Proposal {
    pub change_id: ChangeId,
    pub base_ref: String,
    pub head_ref: String,
    pub title: String,
    pub body: String,
    pub labels: Vec<String>,
}

/// Change proposer that records proposals and numbers them from 1.
///
/// Proposing the same head into the same base again returns the recorded
/// change id, as a forge does while the change request is open.
#[derive(Debug, Default)]
pub struct RecordingProposer {
    proposals: Mutex<Vec<Proposal>>,
    propose_failure: Mutex<Option<BoundaryError>>,
}

impl RecordingProposer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every proposal so far, oldest first.
    pub fn proposals(&self) -> Vec<Proposal> {
        self.proposals.lock().clone()
    }

    /// Fail the next proposal with `error`.
    pub fn fail_next_proposal(&self, error: BoundaryError) {
        *self.propose_failure.lock() = Some(error);
    }
}

#[async_trait]
impl ChangeProposer for RecordingProposer {
    async fn propose_change(
        &self,
        base_ref: &str,
        head_ref: &str,
        title: &str,
        body: &str,
    ) -> Result<ChangeId, BoundaryError> {
        if let Some(error) = self.propose_failure.lock().take() {
            return Err(error);
        }
        let mut proposals = self.proposals.lock();
        if let Some(open) = proposals
            .iter()
            .find(|p| p.head_ref == head_ref && p.base_ref == base_ref)
        {
            return Ok(open.change_id.clone());
        }
        let change_id = ChangeId((proposals.len() + 1).to_string());
        proposals.push(Proposal {
            change_id: change_id.clone(),
            base_ref: base_ref.to_string(),
            head_ref: head_ref.to_string(),
            title: title.to_string(),
            body: body.to_string(),
            labels: Vec::new(),
        });
        Ok(change_id)
    }

    async fn label_change(&self, change_id: &ChangeId, labels: &[String]) -> Result<(), BoundaryError> {
        let mut proposals = self.proposals.lock();
        let proposal = proposals
            .iter_mut()
            .find(|p| &p.change_id == change_id)
            .ok_or_else(|| BoundaryError::Rejected {
                operation: "label_change".into(),
                reason: format!("no change request {change_id}"),
            })?;
        for label in labels {
            if !proposal.labels.contains(label) {
                proposal.labels.push(label.clone());
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn store_records_commits_without_changing_reference() {
        let store = InMemorySchemaStore::new("{}\n");
        let text = CanonicalText::new(&json!({"type": "object"})).unwrap();
        store.commit_schema_text(&text, "schemas-update-abc").await.unwrap();
        assert_eq!(store.fetch_schema_text().await.unwrap(), "{}\n");
        assert_eq!(store.commits()[0].target_ref, "schemas-update-abc");
    }

    #[tokio::test]
    async fn injected_failure_applies_once() {
        let store = InMemorySchemaStore::new("{}");
        store.fail_next_fetch(BoundaryError::Io {
            operation: "fetch".into(),
            reason: "disk".into(),
        });
        assert!(store.fetch_schema_text().await.is_err());
        assert!(store.fetch_schema_text().await.is_ok());
    }

    #[tokio::test]
    async fn proposer_numbers_and_labels() {
        let proposer = RecordingProposer::new();
        let first = proposer.propose_change("master", "a", "t", "b").await.unwrap();
        let second = proposer.propose_change("master", "b", "t", "b").await.unwrap();
        assert_eq!(first.as_str(), "1");
        assert_eq!(second.as_str(), "2");

        let labels = vec!["maintenance".to_string()];
        proposer.label_change(&second, &labels).await.unwrap();
        proposer.label_change(&second, &labels).await.unwrap();
        assert_eq!(proposer.proposals()[1].labels, labels);
    }

    #[tokio::test]
    async fn proposer_reuses_open_change_for_same_head() {
        let proposer = RecordingProposer::new();
        let first = proposer.propose_change("master", "a", "t", "b").await.unwrap();
        let again = proposer.propose_change("master", "a", "t2", "b2").await.unwrap();
        let other_base = proposer.propose_change("develop", "a", "t", "b").await.unwrap();
        assert_eq!(first, again);
        assert_ne!(first, other_base);
        assert_eq!(proposer.proposals().len(), 2);
    }

    #[tokio::test]
    async fn labelling_unknown_change_is_rejected() {
        let proposer = RecordingProposer::new();
        let err = proposer
            .label_change(&ChangeId("9".into()), &[])
            .await
            .unwrap_err();
        assert!(matches!(err, BoundaryError::Rejected { .. }));
    }
}
