//! Risk management configuration.

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::Deserialize;

use crate::application::risk::RiskLimits;

/// Risk management configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct RiskConfig {
    /// Max candidate notional as a fraction of available balance.
    #[serde(default = "default_max_position_size")]
    pub max_position_size: Decimal,
    /// Max candidate notional as a fraction of portfolio value.
    #[serde(default = "default_max_position_risk")]
    pub max_position_risk: Decimal,
    /// Max exposure per symbol as a fraction of portfolio value.
    #[serde(default = "default_max_symbol_exposure")]
    pub max_symbol_exposure: Decimal,
    /// Daily loss, in quote currency, at which candidates are refused.
    #[serde(default = "default_max_daily_loss")]
    pub max_daily_loss: Decimal,
    #[serde(default = "default_max_daily_trades")]
    pub max_daily_trades: u32,
    /// Daily loss, in quote currency, at which the breaker halts trading.
    #[serde(default = "default_circuit_breaker_loss")]
    pub circuit_breaker_loss: Decimal,
    /// Drawdown fraction that emergency-stops trading.
    #[serde(default = "default_max_drawdown")]
    pub max_drawdown: f64,
    #[serde(default = "default_risk_score_threshold")]
    pub risk_score_threshold: f64,
    #[serde(default = "default_var_confidence")]
    pub var_confidence: f64,
    /// Risk per venue in `[0, 1]`; unlisted venues count as 0.5.
    #[serde(default)]
    pub venue_risk: HashMap<String, f64>,
    #[serde(default = "default_market_risk")]
    pub market_risk: f64,
}

fn default_max_position_size() -> Decimal {
    Decimal::new(1, 1) // 10%
}

fn default_max_position_risk() -> Decimal {
    Decimal::new(5, 2) // 5%
}

fn default_max_symbol_exposure() -> Decimal {
    Decimal::new(2, 1) // 20%
}

fn default_max_daily_loss() -> Decimal {
    Decimal::from(500)
}

const fn default_max_daily_trades() -> u32 {
    100
}

fn default_circuit_breaker_loss() -> Decimal {
    Decimal::from(100)
}

const fn default_max_drawdown() -> f64 {
    0.15
}

const fn default_risk_score_threshold() -> f64 {
    0.7
}

const fn default_var_confidence() -> f64 {
    0.95
}

const fn default_market_risk() -> f64 {
    0.5
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            max_position_size: default_max_position_size(),
            max_position_risk: default_max_position_risk(),
            max_symbol_exposure: default_max_symbol_exposure(),
            max_daily_loss: default_max_daily_loss(),
            max_daily_trades: default_max_daily_trades(),
            circuit_breaker_loss: default_circuit_breaker_loss(),
            max_drawdown: default_max_drawdown(),
            risk_score_threshold: default_risk_score_threshold(),
            var_confidence: default_var_confidence(),
            venue_risk: HashMap::new(),
            market_risk: default_market_risk(),
        }
    }
}

impl From<RiskConfig> for RiskLimits {
    fn from(config: RiskConfig) -> Self {
        Self {
            max_position_size: config.max_position_size,
            max_position_risk: config.max_position_risk,
            max_symbol_exposure: config.max_symbol_exposure,
            max_daily_loss: config.max_daily_loss,
            max_daily_trades: config.max_daily_trades,
            circuit_breaker_loss: config.circuit_breaker_loss,
            max_drawdown: config.max_drawdown,
            risk_score_threshold: config.risk_score_threshold,
            var_confidence: config.var_confidence,
            venue_risk: config.venue_risk,
            market_risk: config.market_risk,
        }
    }
}
