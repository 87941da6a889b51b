//! Execution coordinator module.
//!
//! Sizes approved opportunities, reserves their notional and dispatches
//! both legs to the order gateway.

pub mod coordinator;
pub mod sizing;

use rust_decimal::Decimal;
use serde::Deserialize;

pub use coordinator::{
    ExecutionCoordinator, ExecutionReport, ExecutionStats, Leg, LegOutcome,
};
pub use sizing::{KellySizer, SizingConfig};

/// Configuration for the execution coordinator.
#[derive(Debug, Clone, Deserialize)]
pub struct ExecutionConfig {
    /// Executions allowed in flight at once.
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,

    /// Largest notional a single execution may carry.
    #[serde(default = "default_max_trade_notional")]
    pub max_trade_notional: Decimal,

    /// Per-leg placement timeout in milliseconds.
    #[serde(default = "default_leg_timeout_ms")]
    pub leg_timeout_ms: u64,

    /// Position sizing.
    #[serde(default)]
    pub sizing: SizingConfig,
}

const fn default_max_concurrent() -> usize {
    5
}

fn default_max_trade_notional() -> Decimal {
    Decimal::from(1000)
}

const fn default_leg_timeout_ms() -> u64 {
    5_000
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            max_concurrent: default_max_concurrent(),
            max_trade_notional: default_max_trade_notional(),
            leg_timeout_ms: default_leg_timeout_ms(),
            sizing: SizingConfig::default(),
        }
    }
}
