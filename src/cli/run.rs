//! Handler for the `run` command.

use tracing::info;

use crate::cli::RunArgs;
use crate::error::Result;
use crate::infrastructure::config::settings::Config;
use crate::infrastructure::runtime;

/// Load the config and apply command-line overrides.
///
/// # Errors
///
/// Returns an error if the config cannot be loaded or fails validation.
pub fn load_config(args: &RunArgs) -> Result<Config> {
    let mut config = Config::load(&args.config)?;

    if let Some(ref level) = args.log_level {
        config.logging.level = level.clone();
    }
    if args.json_logs {
        config.logging.format = "json".to_string();
    }
    if args.dry_run {
        config.dry_run = true;
    }
    if let Some(max_cycles) = args.max_cycles {
        config.runtime.max_cycles = Some(max_cycles);
    }
    if let Some(ref events) = args.events {
        config.events_path = Some(events.clone());
    }

    config.validate()?;
    Ok(config)
}

/// Execute the run command.
///
/// # Errors
///
/// Returns an error if the config is invalid or the engine cannot start.
pub async fn execute(args: &RunArgs) -> Result<()> {
    let config = load_config(args)?;
    config.init_logging();

    if config.dry_run {
        info!("Dry-run mode enabled - will not execute trades");
    }

    let summary = runtime::run(config).await?;
    info!(
        cycles = summary.cycles,
        breaker = %summary.breaker_state,
        executions = summary.execution.total,
        success_rate = summary.execution.success_rate(),
        value = %summary.portfolio.total_value,
        "arbitron stopped"
    );
    Ok(())
}
