//! # schema-drift CLI entry point
//!
//! Parses command-line arguments and dispatches to subcommand handlers.

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use metrics_exporter_prometheus::PrometheusBuilder;

use drift_cli::check::{run_check, CheckArgs};
use drift_cli::serve::{run_serve, ServeArgs};

/// schema-drift: detect payloads that no longer match a reference JSON
/// Schema and propose the schema change that accepts them.
#[derive(Parser, Debug)]
#[command(name = "schema-drift", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Emit logs as JSON lines.
    #[arg(long, env = "DRIFT_LOG_JSON", global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Receive webhook deliveries and repair the schema as they drift.
    Serve(ServeArgs),

    /// Check one payload against a schema file without side effects.
    Check(CheckArgs),
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    drift_cli::init_tracing(cli.verbose, cli.log_json);

    let result = match cli.command {
        Commands::Serve(args) => {
            let metrics = match PrometheusBuilder::new().install_recorder() {
                Ok(handle) => Some(handle),
                Err(e) => {
                    tracing::warn!(error = %e, "prometheus recorder not installed; /metrics disabled");
                    None
                }
            };
            run_serve(&args, metrics).await
        }
        Commands::Check(args) => run_check(&args).await,
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn serve_defaults() {
        let cli = Cli::try_parse_from(["schema-drift", "serve"]).unwrap();
        if let Commands::Serve(args) = cli.command {
            assert_eq!(args.bind.port(), 3000);
            assert!(args.dry_run_dir.is_none());
        } else {
            panic!("expected serve");
        }
    }

    #[test]
    fn dry_run_requires_schema() {
        assert!(Cli::try_parse_from(["schema-drift", "serve", "--dry-run-dir", "out"]).is_err());
        let cli = Cli::try_parse_from([
            "schema-drift",
            "serve",
            "--dry-run-dir",
            "out",
            "--schema",
            "schema.json",
        ])
        .unwrap();
        if let Commands::Serve(args) = cli.command {
            assert_eq!(args.schema, Some(PathBuf::from("schema.json")));
        }
    }

    #[test]
    fn check_requires_schema_and_payload() {
        assert!(Cli::try_parse_from(["schema-drift", "check", "--schema", "s.json"]).is_err());
        let cli = Cli::try_parse_from([
            "schema-drift",
            "check",
            "--schema",
            "s.json",
            "--payload",
            "p.json",
        ])
        .unwrap();
        if let Commands::Check(args) = cli.command {
            assert_eq!(args.event, "manual");
            assert!(args.output.is_none());
        } else {
            panic!("expected check");
        }
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "schema-drift",
            "check",
            "--schema",
            "s.json",
            "--payload",
            "p.json",
            "-vv",
            "--log-json",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        assert!(cli.log_json);
    }
}
