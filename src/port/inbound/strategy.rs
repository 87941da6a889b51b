//! Strategy port for spread detection.
//!
//! Defines the [`Strategy`] trait and the [`DetectionContext`] handed to it.
//! Strategies analyze fresh snapshots grouped by symbol and emit
//! [`Opportunity`] candidates. New strategies (cointegration,
//! volume-weighted, ...) plug in by implementing this trait and registering
//! with the detector.
//!
//! # Example
//!
//! ```
//! use arbitron::domain::{Opportunity, StrategyKind};
//! use arbitron::port::inbound::strategy::{DetectionContext, Strategy};
//!
//! struct Quiet;
//!
//! impl Strategy for Quiet {
//!     fn name(&self) -> &'static str { "quiet" }
//!     fn kind(&self) -> StrategyKind { StrategyKind::Direct }
//!     fn detect(&mut self, _ctx: &DetectionContext<'_>) -> Vec<Opportunity> {
//!         vec![]
//!     }
//! }
//! ```

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::domain::{MarketSnapshot, Opportunity, StrategyKind, Symbol};

/// Inputs shared by all strategies in one detection pass.
#[derive(Debug, Clone)]
pub struct DetectionContext<'a> {
    /// Evaluation time.
    pub now: DateTime<Utc>,
    /// Fresh snapshots per symbol, venues in lexical order.
    pub markets: BTreeMap<Symbol, Vec<&'a MarketSnapshot>>,
    /// Fee rate charged on each leg, as a fraction.
    pub fee_rate_per_leg: Decimal,
    /// Minimum net margin, as a fraction of the buy price.
    pub min_profit_threshold: Decimal,
}

impl DetectionContext<'_> {
    /// Per-unit fees of buying at `buy` and selling at `sell`.
    #[must_use]
    pub fn leg_fees(&self, buy: Decimal, sell: Decimal) -> Decimal {
        (buy + sell) * self.fee_rate_per_leg
    }

    /// Minimum net margin in percent.
    #[must_use]
    pub fn min_profit_pct(&self) -> Decimal {
        self.min_profit_threshold * Decimal::ONE_HUNDRED
    }
}

/// A spread detection algorithm.
///
/// `detect` takes `&mut self` so strategies can keep rolling state (spread
/// histories) between cycles.
pub trait Strategy: Send {
    /// Unique identifier for this strategy.
    fn name(&self) -> &'static str;

    /// Strategy tag stamped on emitted opportunities.
    fn kind(&self) -> StrategyKind;

    /// Detect opportunities in the given context.
    fn detect(&mut self, ctx: &DetectionContext<'_>) -> Vec<Opportunity>;
}
