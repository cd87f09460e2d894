//! CLI argument definitions
//!
//! Global CLI options and configuration merging logic.

use std::io::IsTerminal;
use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use stickyledger::config::Config;

use super::commands::Commands;

#[derive(Debug, Clone, Copy, Default, ValueEnum, PartialEq)]
pub(crate) enum ColorMode {
    /// Auto-detect based on terminal (default)
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

#[derive(Parser)]
#[command(name = "stickyledger")]
#[command(
    about = "Session-sticky deployment routing and usage/cost reconciliation for LLM gateways",
    version
)]
pub(crate) struct Cli {
    #[command(subcommand)]
    pub(crate) command: Commands,

    /// Output as JSON
    #[arg(short, long, global = true)]
    pub(crate) json: bool,

    /// Config file to use instead of the default search path
    #[arg(long, global = true, value_name = "FILE")]
    pub(crate) config: Option<PathBuf>,

    /// Color output mode
    #[arg(long, global = true, value_enum, default_value = "auto")]
    pub(crate) color: ColorMode,

    /// Disable colored output (shorthand for --color=never)
    #[arg(long, global = true)]
    pub(crate) no_color: bool,

    /// Enable debug logging (routing and reconciliation decisions)
    #[arg(long, global = true)]
    pub(crate) debug: bool,
}

impl Cli {
    /// Merge config file values into CLI (CLI args take precedence)
    pub(crate) fn with_config(mut self, config: &Config) -> Self {
        if !self.debug && config.debug {
            self.debug = true;
        }
        self
    }

    pub(crate) fn use_color(&self) -> bool {
        if self.no_color {
            return false;
        }
        match self.color {
            ColorMode::Always => true,
            ColorMode::Never => false,
            ColorMode::Auto => std::io::stdout().is_terminal(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap()
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = parse(&["stickyledger", "reconcile", "calls.jsonl", "--json", "--no-color"]);
        assert!(cli.json);
        assert!(!cli.use_color());
    }

    #[test]
    fn color_always_wins_without_no_color() {
        let cli = parse(&["stickyledger", "--color", "always", "reconcile", "calls.jsonl"]);
        assert!(cli.use_color());
        let cli = parse(&["stickyledger", "--color", "always", "--no-color", "reconcile", "x"]);
        assert!(!cli.use_color());
    }

    #[test]
    fn config_debug_applies_when_flag_absent() {
        let config = Config {
            debug: true,
            ..Config::default()
        };
        let cli = parse(&["stickyledger", "reconcile", "calls.jsonl"]).with_config(&config);
        assert!(cli.debug);

        let cli = parse(&["stickyledger", "reconcile", "calls.jsonl"]).with_config(&Config::default());
        assert!(!cli.debug);
    }

    #[test]
    fn subcommand_is_required() {
        assert!(Cli::try_parse_from(["stickyledger"]).is_err());
    }
}
