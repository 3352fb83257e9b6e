//! # Serve — run the webhook receiver.
//!
//! Without `--dry-run-dir` the schema store and change proposer talk to
//! GitHub (see `GithubConfig::from_env` for the variables). With it,
//! the schema is read from `--schema` and repaired versions are written
//! under the directory while change requests are only logged.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use metrics_exporter_prometheus::PrometheusHandle;

use drift_api::{AppState, WebhookSecret};
use drift_github::GithubConfig;
use drift_repair::{
    ChangeProposer, FileSchemaStore, LoggingProposer, RepairConfig, RepairPipeline, SchemaStore,
};

/// Serve subcommand arguments.
#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Address to listen on.
    #[arg(long, env = "DRIFT_BIND", default_value = "0.0.0.0:3000")]
    pub bind: SocketAddr,

    /// Write repaired schemas here instead of pushing to GitHub.
    #[arg(long, requires = "schema")]
    pub dry_run_dir: Option<PathBuf>,

    /// Reference schema file for dry runs.
    #[arg(long, requires = "dry_run_dir")]
    pub schema: Option<PathBuf>,

    /// Shared secret for `X-Hub-Signature-256` verification.
    #[arg(long, env = "DRIFT_WEBHOOK_SECRET", hide_env_values = true)]
    pub webhook_secret: Option<String>,
}

/// Execute the serve subcommand until Ctrl-C.
pub async fn run_serve(args: &ServeArgs, metrics: Option<PrometheusHandle>) -> Result<u8> {
    let (store, proposer) = collaborators(args)?;
    let pipeline = RepairPipeline::new(store, proposer, RepairConfig::from_env());

    let mut state = AppState::new(pipeline);
    match &args.webhook_secret {
        Some(secret) if !secret.is_empty() => {
            state = state.with_webhook_secret(WebhookSecret::new(secret));
        }
        _ => tracing::warn!("no webhook secret configured; deliveries are not authenticated"),
    }
    if let Some(handle) = metrics {
        state = state.with_metrics(handle);
    }

    let listener = tokio::net::TcpListener::bind(args.bind)
        .await
        .with_context(|| format!("cannot bind {}", args.bind))?;
    drift_api::serve(listener, state, shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("server stopped");
    Ok(0)
}

fn collaborators(args: &ServeArgs) -> Result<(Arc<dyn SchemaStore>, Arc<dyn ChangeProposer>)> {
    if let (Some(dir), Some(schema)) = (&args.dry_run_dir, &args.schema) {
        tracing::info!(
            schema = %schema.display(),
            out_dir = %dir.display(),
            "dry run: repaired schemas are written locally"
        );
        return Ok((
            Arc::new(FileSchemaStore::new(schema, dir)),
            Arc::new(LoggingProposer::new()),
        ));
    }

    let config = GithubConfig::from_env().context("GitHub configuration")?;
    tracing::info!(
        owner = %config.owner,
        repo = %config.repo,
        path = %config.schema_path,
        branch = %config.schema_branch,
        "using GitHub collaborators"
    );
    let (store, proposer) = drift_github::collaborators(&config)?;
    Ok((Arc::new(store), Arc::new(proposer)))
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c().await.ok();
    tracing::info!("shutdown signal received");
}
