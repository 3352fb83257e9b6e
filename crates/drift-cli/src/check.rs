//! # Check — run one payload through the pipeline offline.
//!
//! The schema file stands in for the schema store and the change request
//! is only recorded, so nothing leaves the machine. Prints the violations
//! and the change-request body, and writes the repaired schema when
//! `--output` is given (stdout otherwise).
//!
//! Exit status: 0 when the payload is valid or the schema was repaired,
//! 1 when the payload needs manual review.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;

use drift_core::{parse_schema_text, Event};
use drift_repair::{EventOutcome, InMemorySchemaStore, RecordingProposer, RepairConfig, RepairPipeline};

/// Check subcommand arguments.
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Reference schema file.
    #[arg(long)]
    pub schema: PathBuf,

    /// Payload file (JSON).
    #[arg(long)]
    pub payload: PathBuf,

    /// Event name the payload was delivered under.
    #[arg(long, default_value = "manual")]
    pub event: String,

    /// Write the repaired schema here.
    #[arg(long)]
    pub output: Option<PathBuf>,
}

/// Execute the check subcommand.
pub async fn run_check(args: &CheckArgs) -> Result<u8> {
    let schema_text = std::fs::read_to_string(&args.schema)
        .with_context(|| format!("cannot read schema {}", args.schema.display()))?;
    let payload_text = std::fs::read_to_string(&args.payload)
        .with_context(|| format!("cannot read payload {}", args.payload.display()))?;
    let payload: serde_json::Value = serde_json::from_str(&payload_text)
        .with_context(|| format!("{} is not JSON", args.payload.display()))?;

    let schema = parse_schema_text(&schema_text)?;
    let validation = drift_schema::validate(&payload, &schema)?;
    if !validation.is_valid() {
        println!("{} violation(s):", validation.violations().len());
        for violation in validation.violations() {
            println!("{violation}");
        }
        println!();
    }

    let store = Arc::new(InMemorySchemaStore::new(schema_text));
    let proposer = Arc::new(RecordingProposer::new());
    let pipeline = RepairPipeline::new(store.clone(), proposer, RepairConfig::default());
    let event = Event::new(args.event.as_str(), payload);

    match pipeline.handle(&event).await? {
        EventOutcome::Valid => {
            println!("{} matches the schema", event.label());
            Ok(0)
        }
        EventOutcome::ManualReview { report } => {
            println!("{}", report.to_markdown());
            Ok(1)
        }
        EventOutcome::NoChange { report } => {
            println!("{}", report.to_markdown());
            println!("schema already accepts this payload after repair; nothing to write");
            Ok(0)
        }
        EventOutcome::Proposed { head_ref, report, .. } => {
            println!("{}", report.to_markdown());
            let commit = store
                .commits()
                .pop()
                .context("pipeline proposed a change without committing it")?;
            match &args.output {
                Some(path) => {
                    std::fs::write(path, &commit.text)
                        .with_context(|| format!("cannot write {}", path.display()))?;
                    println!("repaired schema ({head_ref}) written to {}", path.display());
                }
                None => print!("{}", commit.text),
            }
            Ok(0)
        }
    }
}
