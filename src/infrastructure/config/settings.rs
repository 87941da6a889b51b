//! Application configuration loading and validation.
//!
//! Provides the main [`Config`] struct that aggregates all application settings.
//! Configuration is loaded from a TOML file; every section and field has a
//! default, so an empty file is a valid paper-trading setup.
//!
//! # Example
//!
//! ```no_run
//! use arbitron::infrastructure::config::settings::Config;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load("config.toml")?;
//!     config.init_logging();
//!     Ok(())
//! }
//! ```

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use chrono::Duration;
use rust_decimal::Decimal;
use serde::Deserialize;

use super::logging::LoggingConfig;
use super::market::MarketConfig;
use super::risk::RiskConfig;
use super::runtime::RuntimeConfig;
use super::scoring::ScoringConfig;
use crate::adapter::paper::PaperConfig;
use crate::application::detector::DetectorConfig;
use crate::application::execution::ExecutionConfig;
use crate::application::ledger::LedgerConfig;
use crate::application::pipeline::PipelineConfig;
use crate::domain::time::seconds;
use crate::error::{ConfigError, Result};

/// Main application configuration.
///
/// Load from a TOML file using [`Config::load`] or parse directly with
/// [`Config::parse_toml`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Logging and tracing configuration.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Venues, symbols and snapshot freshness.
    #[serde(default)]
    pub market: MarketConfig,

    /// Detection thresholds and strategy toggles.
    #[serde(default)]
    pub detector: DetectorConfig,

    #[serde(default)]
    pub scoring: ScoringConfig,

    /// Risk gate limits.
    #[serde(default)]
    pub risk: RiskConfig,

    /// Execution concurrency, size caps and leg timeout.
    #[serde(default)]
    pub execution: ExecutionConfig,

    #[serde(default)]
    pub ledger: LedgerConfig,

    /// Paper gateway simulation.
    #[serde(default)]
    pub paper: PaperConfig,

    #[serde(default)]
    pub runtime: RuntimeConfig,

    /// Append every event as JSON lines to this file.
    #[serde(default)]
    pub events_path: Option<PathBuf>,

    /// Enable dry-run mode.
    ///
    /// When true, detects, scores and gates opportunities but never
    /// dispatches orders. Defaults to false.
    #[serde(default)]
    pub dry_run: bool,
}

fn invalid(field: &'static str, reason: &str) -> crate::error::Error {
    ConfigError::InvalidValue {
        field,
        reason: reason.to_string(),
    }
    .into()
}

fn fraction_in(value: f64, low: f64, high: f64) -> bool {
    value.is_finite() && value >= low && value <= high
}

impl Config {
    /// Parse configuration from TOML content.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML content is malformed or validation fails.
    #[allow(clippy::result_large_err)]
    pub fn parse_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The file cannot be read
    /// - The TOML content is malformed
    /// - Validation fails
    #[allow(clippy::result_large_err)]
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadFile)?;
        Self::parse_toml(&content)
    }

    /// Validate configuration values.
    ///
    /// Checks that all required fields are present and values are within
    /// acceptable ranges.
    #[allow(clippy::result_large_err)]
    pub fn validate(&self) -> Result<()> {
        self.validate_market()?;
        self.validate_detector()?;
        self.validate_risk()?;
        self.validate_execution()?;

        if !fraction_in(self.scoring.min_confidence, 0.0, 1.0) {
            return Err(invalid("min_confidence", "must be between 0 and 1"));
        }
        if self.ledger.initial_balance <= Decimal::ZERO {
            return Err(invalid("initial_balance", "must be greater than 0"));
        }
        if self.ledger.quote_currency.trim().is_empty() {
            return Err(ConfigError::MissingField {
                field: "quote_currency",
            }
            .into());
        }
        if self.ledger.position_margin_fraction < Decimal::ZERO
            || self.ledger.position_margin_fraction >= Decimal::ONE
        {
            return Err(invalid("position_margin_fraction", "must be in [0, 1)"));
        }
        if !fraction_in(self.paper.fail_rate, 0.0, 1.0) {
            return Err(invalid("fail_rate", "must be between 0 and 1"));
        }
        if self.paper.slippage < Decimal::ZERO || self.paper.fee_rate < Decimal::ZERO {
            return Err(invalid("paper", "slippage and fee_rate must be 0 or greater"));
        }
        if self.runtime.cycle_interval_ms == 0 {
            return Err(invalid("cycle_interval_ms", "must be greater than 0"));
        }
        if !self.logging.is_known_format() {
            return Err(invalid("format", "must be \"pretty\" or \"json\""));
        }
        Ok(())
    }

    fn validate_market(&self) -> Result<()> {
        let market = &self.market;
        let distinct: HashSet<&str> = market.venues.iter().map(String::as_str).collect();
        if distinct.len() != market.venues.len() {
            return Err(invalid("venues", "must not contain duplicates"));
        }
        if distinct.len() < 2 {
            return Err(invalid("venues", "at least two venues are required"));
        }
        if market.symbols.is_empty() {
            return Err(ConfigError::MissingField { field: "symbols" }.into());
        }
        if market.max_snapshot_age_secs == 0 {
            return Err(invalid("max_snapshot_age_secs", "must be greater than 0"));
        }
        Ok(())
    }

    fn validate_detector(&self) -> Result<()> {
        let detector = &self.detector;
        if detector.fee_rate_per_leg < Decimal::ZERO || detector.fee_rate_per_leg >= Decimal::ONE {
            return Err(invalid("fee_rate_per_leg", "must be in [0, 1)"));
        }
        if detector.min_profit_threshold < Decimal::ZERO {
            return Err(invalid("min_profit_threshold", "must be 0 or greater"));
        }
        if !fraction_in(detector.direct_confidence, 0.0, 1.0) {
            return Err(invalid("direct_confidence", "must be between 0 and 1"));
        }
        if detector.top_k == 0 {
            return Err(invalid("top_k", "must be greater than 0"));
        }
        let stats = &detector.statistical;
        if stats.min_observations < 2 {
            return Err(invalid("min_observations", "must be at least 2"));
        }
        if stats.lookback < stats.min_observations {
            return Err(invalid("lookback", "must be >= min_observations"));
        }
        if !(stats.z_threshold.is_finite() && stats.z_threshold > 0.0) {
            return Err(invalid("z_threshold", "must be greater than 0"));
        }
        Ok(())
    }

    fn validate_risk(&self) -> Result<()> {
        let risk = &self.risk;
        for (field, value) in [
            ("max_position_size", risk.max_position_size),
            ("max_position_risk", risk.max_position_risk),
            ("max_symbol_exposure", risk.max_symbol_exposure),
        ] {
            if value <= Decimal::ZERO || value > Decimal::ONE {
                return Err(invalid(field, "must be in (0, 1]"));
            }
        }
        if risk.max_daily_loss <= Decimal::ZERO {
            return Err(invalid("max_daily_loss", "must be greater than 0"));
        }
        if risk.circuit_breaker_loss <= Decimal::ZERO {
            return Err(invalid("circuit_breaker_loss", "must be greater than 0"));
        }
        if !(risk.max_drawdown.is_finite() && risk.max_drawdown > 0.0 && risk.max_drawdown < 1.0) {
            return Err(invalid("max_drawdown", "must be in (0, 1)"));
        }
        if !fraction_in(risk.risk_score_threshold, 0.0, 1.0) {
            return Err(invalid("risk_score_threshold", "must be between 0 and 1"));
        }
        if !(risk.var_confidence > 0.0 && risk.var_confidence < 1.0) {
            return Err(invalid("var_confidence", "must be in (0, 1)"));
        }
        if !fraction_in(risk.market_risk, 0.0, 1.0)
            || risk.venue_risk.values().any(|r| !fraction_in(*r, 0.0, 1.0))
        {
            return Err(invalid("venue_risk", "risk levels must be between 0 and 1"));
        }
        Ok(())
    }

    fn validate_execution(&self) -> Result<()> {
        let execution = &self.execution;
        if execution.max_concurrent == 0 {
            return Err(invalid("max_concurrent", "must be greater than 0"));
        }
        if execution.max_trade_notional <= Decimal::ZERO {
            return Err(invalid("max_trade_notional", "must be greater than 0"));
        }
        if execution.leg_timeout_ms == 0 {
            return Err(invalid("leg_timeout_ms", "must be greater than 0"));
        }
        let sizing = &execution.sizing;
        if !fraction_in(sizing.max_fraction, 0.0, 1.0) {
            return Err(invalid("max_fraction", "must be between 0 and 1"));
        }
        if !(sizing.assumed_loss.is_finite() && sizing.assumed_loss >= 0.0) {
            return Err(invalid("assumed_loss", "must be 0 or greater"));
        }
        if sizing.base_notional <= Decimal::ZERO {
            return Err(invalid("base_notional", "must be greater than 0"));
        }
        Ok(())
    }

    /// Snapshot freshness cutoff.
    #[must_use]
    pub fn max_snapshot_age(&self) -> Duration {
        seconds(self.market.max_snapshot_age_secs)
    }

    /// Trading cycle settings assembled from `[scoring]`, `[runtime]` and
    /// `dry_run`.
    #[must_use]
    pub fn pipeline(&self) -> PipelineConfig {
        PipelineConfig {
            min_confidence: self.scoring.min_confidence,
            snapshot_every: self.runtime.snapshot_every,
            dry_run: self.dry_run,
        }
    }

    /// Initialize logging based on configuration.
    pub fn init_logging(&self) {
        self.logging.init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use rust_decimal_macros::dec;

    #[test]
    fn empty_file_uses_defaults() {
        let config = Config::parse_toml("").unwrap();

        assert_eq!(config.market.venues.len(), 3);
        assert_eq!(config.detector.fee_rate_per_leg, dec!(0.001));
        assert_eq!(config.execution.max_concurrent, 5);
        assert_eq!(config.ledger.initial_balance, dec!(10000));
        assert_eq!(config.pipeline().min_confidence, 0.7);
        assert!(!config.dry_run);
        assert!(config.events_path.is_none());
    }

    #[test]
    fn sections_override_defaults() {
        let toml = r#"
dry_run = true
events_path = "events.jsonl"

[market]
venues = ["a", "b"]
symbols = ["SOL/USDT"]

[detector]
min_profit_threshold = 0.003
top_k = 3

[detector.statistical]
z_threshold = 2.5

[risk]
max_daily_trades = 10

[risk.venue_risk]
a = 0.2

[execution.sizing]
max_fraction = 0.02
"#;
        let config = Config::parse_toml(toml).unwrap();

        assert!(config.pipeline().dry_run);
        assert_eq!(config.market.symbol_ids().len(), 1);
        assert_eq!(config.detector.min_profit_threshold, dec!(0.003));
        assert_eq!(config.detector.statistical.z_threshold, 2.5);
        assert_eq!(config.detector.statistical.lookback, 100);
        assert_eq!(config.risk.max_daily_trades, 10);
        assert_eq!(config.risk.venue_risk.get("a"), Some(&0.2));
        assert_eq!(config.execution.sizing.max_fraction, 0.02);
        assert_eq!(config.execution.leg_timeout_ms, 5000);
    }

    #[test]
    fn single_venue_is_rejected() {
        let result = Config::parse_toml("[market]\nvenues = [\"a\"]\n");
        assert!(matches!(
            result,
            Err(Error::Config(ConfigError::InvalidValue { field: "venues", .. }))
        ));
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        let result = Config::parse_toml("[market\nvenues = 3");
        assert!(matches!(result, Err(Error::Config(ConfigError::Parse(_)))));
    }
}
