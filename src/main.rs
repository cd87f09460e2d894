mod app;
mod cli;
mod output;

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::Cli;
use stickyledger::config::Config;

const LOG_ENV: &str = "STICKYLEDGER_LOG";

fn init_logging(debug: bool) {
    let default = if debug { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let loaded = match Config::load(cli.config.as_deref()) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };
    let cli = cli.with_config(&loaded.config);
    init_logging(cli.debug);

    for warning in &loaded.warnings {
        tracing::warn!("skipping config file: {warning}");
    }
    if let Some(path) = &loaded.source {
        tracing::debug!(path = %path.display(), "loaded config");
    }

    match app::run(&cli, &loaded.config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
