//! Portfolio ledger.
//!
//! Owns balances, positions, trades and reservations, and derives the
//! performance metrics the risk gate reads.

mod handle;
#[allow(clippy::module_inception)]
mod ledger;
pub mod metrics;

use rust_decimal::Decimal;
use serde::Deserialize;

pub use handle::{LedgerHandle, PortfolioSnapshot};
pub use ledger::{Ledger, ReservationId};
pub use metrics::PortfolioMetrics;

/// Configuration for the portfolio ledger.
#[derive(Debug, Clone, Deserialize)]
pub struct LedgerConfig {
    /// Starting quote balance.
    #[serde(default = "default_initial_balance")]
    pub initial_balance: Decimal,

    /// Currency balances and PnL are denominated in.
    #[serde(default = "default_quote_currency")]
    pub quote_currency: String,

    /// Fraction of open position notional held back from the available
    /// balance.
    #[serde(default = "default_position_margin_fraction")]
    pub position_margin_fraction: Decimal,
}

fn default_initial_balance() -> Decimal {
    Decimal::from(10_000)
}

fn default_quote_currency() -> String {
    "USDT".to_string()
}

fn default_position_margin_fraction() -> Decimal {
    Decimal::new(1, 1) // 10%
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            initial_balance: default_initial_balance(),
            quote_currency: default_quote_currency(),
            position_margin_fraction: default_position_margin_fraction(),
        }
    }
}
