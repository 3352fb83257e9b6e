//! # drift-github — GitHub Collaborators
//!
//! Implements the schema-drift collaborator traits against the GitHub
//! REST API:
//!
//! - [`GithubSchemaStore`]: the reference schema is a file on a branch;
//!   each repaired version is committed to its own head branch, created
//!   from the schema branch when missing.
//! - [`GithubChangeProposer`]: a pull request from the head branch into
//!   the base branch, then labels.
//!
//! Both share one [`GithubClient`]. Failures map onto `BoundaryError`;
//! nothing is retried.

pub mod client;
pub mod config;
pub mod error;
pub mod proposer;
pub mod store;

use std::sync::Arc;

pub use client::{FileContents, GithubClient};
pub use config::{ConfigError, GithubConfig};
pub use error::GithubError;
pub use proposer::GithubChangeProposer;
pub use store::GithubSchemaStore;

/// Build the store and proposer for `config` over a shared client.
pub fn collaborators(
    config: &GithubConfig,
) -> Result<(GithubSchemaStore, GithubChangeProposer), GithubError> {
    let client = Arc::new(GithubClient::new(config)?);
    Ok((
        GithubSchemaStore::new(client.clone(), config),
        GithubChangeProposer::new(client),
    ))
}
