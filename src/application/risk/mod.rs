//! Risk gate module.
//!
//! Provides per-candidate validation, portfolio-level circuit breakers and
//! historical risk measures.

pub mod gate;
pub mod measures;
pub mod score;

use std::collections::HashMap;

use rust_decimal::Decimal;

pub use gate::{RiskDecision, RiskGate, RiskReport};
pub use score::{RiskScore, RiskScorer};

/// Risk limits enforced by the gate.
#[derive(Debug, Clone)]
pub struct RiskLimits {
    /// Max candidate notional as a fraction of the available balance.
    pub max_position_size: Decimal,
    /// Max candidate notional as a fraction of total portfolio value.
    pub max_position_risk: Decimal,
    /// Max exposure to one symbol as a fraction of total portfolio value.
    pub max_symbol_exposure: Decimal,
    /// Absolute daily PnL at which candidates are refused and the gate halts.
    pub max_daily_loss: Decimal,
    /// Executions allowed per UTC day.
    pub max_daily_trades: u32,
    /// Absolute daily PnL at which the cycle-level breaker halts trading.
    pub circuit_breaker_loss: Decimal,
    /// Drawdown fraction at which trading is emergency-stopped.
    pub max_drawdown: f64,
    /// Highest acceptable composite risk score.
    pub risk_score_threshold: f64,
    /// Confidence level of the reported VaR.
    pub var_confidence: f64,
    /// Configured risk per venue in `[0, 1]`.
    pub venue_risk: HashMap<String, f64>,
    /// Configured market-wide risk in `[0, 1]`.
    pub market_risk: f64,
}

impl Default for RiskLimits {
    fn default() -> Self {
        Self {
            max_position_size: Decimal::new(1, 1),   // 10%
            max_position_risk: Decimal::new(5, 2),   // 5%
            max_symbol_exposure: Decimal::new(2, 1), // 20%
            max_daily_loss: Decimal::from(500),
            max_daily_trades: 100,
            circuit_breaker_loss: Decimal::from(100),
            max_drawdown: 0.15,
            risk_score_threshold: 0.7,
            var_confidence: 0.95,
            venue_risk: HashMap::new(),
            market_risk: 0.5,
        }
    }
}
