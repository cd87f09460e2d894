//! CLI subcommand definitions

use std::path::PathBuf;

use clap::Subcommand;

pub(crate) const DEFAULT_SAMPLES: usize = 10_000;

/// Main CLI commands
#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Show which deployment each session sticks to
    Route {
        /// JSON array of deployment entries (flat or gateway registry maps)
        #[arg(short, long, value_name = "FILE")]
        deployments: PathBuf,
        /// Logical model name requested by the caller
        #[arg(short, long)]
        model: String,
        /// Session id to route (repeatable)
        #[arg(short, long = "session", value_name = "ID", required = true)]
        sessions: Vec<String>,
    },
    /// Simulate traffic over synthetic sessions and compare shares to weights
    Distribution {
        /// JSON array of deployment entries (flat or gateway registry maps)
        #[arg(short, long, value_name = "FILE")]
        deployments: PathBuf,
        /// Logical model name requested by the caller
        #[arg(short, long)]
        model: String,
        /// Number of synthetic sessions
        #[arg(short = 'n', long, default_value_t = DEFAULT_SAMPLES)]
        samples: usize,
    },
    /// Replay recorded gateway calls through usage and cost reconciliation
    Reconcile {
        /// JSONL files or glob patterns of `{"call": .., "response": ..}` records
        #[arg(required = true, value_name = "FILE")]
        inputs: Vec<String>,
        /// LiteLLM-style pricing map (model -> per-token prices)
        #[arg(short, long, value_name = "FILE")]
        pricing: Option<PathBuf>,
    },
}
