//! Configuration validation command.

use std::path::Path;

use crate::error::Result;
use crate::infrastructure::config::settings::Config;

/// Validate a configuration file without starting the engine.
///
/// # Errors
///
/// Returns an error if the file cannot be read, parsed or validated.
pub fn execute_config<P: AsRef<Path>>(config_path: P) -> Result<()> {
    let path = config_path.as_ref();
    println!("Checking configuration: {}", path.display());
    println!();

    let config = Config::load(path)?;
    println!("✓ Configuration file is valid");
    println!();
    println!("Summary:");
    println!("  Venues: {}", config.market.venues.join(", "));
    println!("  Symbols: {}", config.market.symbols.join(", "));
    println!(
        "  Strategies: direct={} statistical={}",
        config.detector.direct_enabled, config.detector.statistical_enabled
    );
    println!(
        "  Min profit: {}  Fee per leg: {}",
        config.detector.min_profit_threshold, config.detector.fee_rate_per_leg
    );
    println!(
        "  Initial balance: {} {}",
        config.ledger.initial_balance, config.ledger.quote_currency
    );
    println!(
        "  Max concurrent: {}  Max trade notional: {}",
        config.execution.max_concurrent, config.execution.max_trade_notional
    );
    println!("  Dry-run: {}", config.dry_run);
    match &config.events_path {
        Some(path) => println!("  Events: {}", path.display()),
        None => println!("  Events: log only"),
    }
    println!();
    println!("Configuration is ready to use.");
    Ok(())
}
