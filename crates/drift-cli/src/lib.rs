//! # drift-cli — schema-drift Command-Line Interface
//!
//! ## Subcommands
//!
//! - `schema-drift serve`: run the webhook receiver. Collaborators are the
//!   GitHub store and proposer configured from the environment, or local
//!   files with `--dry-run-dir`.
//! - `schema-drift check`: run one payload through the pipeline offline and
//!   print what would change.
//!
//! ```bash
//! GITHUB_TOKEN=... schema-drift serve --bind 0.0.0.0:3000
//! schema-drift serve --dry-run-dir out/ --schema schema.json
//! schema-drift check --schema schema.json --payload push.json --event push
//! ```
//!
//! ## Crate Policy
//!
//! - Argument parsing is separated from the handlers.
//! - Handlers delegate to the library crates; no repair logic here.

pub mod check;
pub mod serve;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins when set; otherwise the level follows `verbose`
/// (`info`, `debug`, then `trace`).
pub fn init_tracing(verbose: u8, json: bool) {
    let default_level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_target(false))
            .init();
    }
}
