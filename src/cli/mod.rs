//! Command-line interface definitions.

pub mod check;
pub mod run;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Arbitron - cross-venue spread arbitrage detection and execution.
#[derive(Parser, Debug)]
#[command(name = "arbitron")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the trading loop in paper mode (foreground)
    Run(RunArgs),

    /// Run diagnostic checks
    #[command(subcommand)]
    Check(CheckCommand),
}

/// Subcommands for `arbitron check`
#[derive(Subcommand, Debug)]
pub enum CheckCommand {
    /// Validate configuration file
    Config(ConfigPathArg),
}

/// Shared argument for commands that only need a config path.
#[derive(Parser, Debug)]
pub struct ConfigPathArg {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,
}

/// Arguments for the `run` subcommand.
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    /// Override log level (debug, info, warn, error)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Use JSON log format instead of pretty
    #[arg(long)]
    pub json_logs: bool,

    /// Detect, score and gate opportunities but don't execute trades
    #[arg(long)]
    pub dry_run: bool,

    /// Stop after this many cycles
    #[arg(long)]
    pub max_cycles: Option<u64>,

    /// Write every event as JSON lines to this file
    #[arg(long)]
    pub events: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_run_overrides() {
        let cli = Cli::parse_from([
            "arbitron",
            "run",
            "--config",
            "paper.toml",
            "--dry-run",
            "--json-logs",
            "--max-cycles",
            "3",
        ]);

        let Commands::Run(args) = cli.command else {
            panic!("expected run");
        };
        assert_eq!(args.config, PathBuf::from("paper.toml"));
        assert!(args.dry_run);
        assert!(args.json_logs);
        assert_eq!(args.max_cycles, Some(3));
    }

    #[test]
    fn parses_check_config() {
        let cli = Cli::parse_from(["arbitron", "check", "config"]);
        assert!(matches!(
            cli.command,
            Commands::Check(CheckCommand::Config(ConfigPathArg { .. }))
        ));
    }
}
