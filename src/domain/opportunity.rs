//! Opportunity type with builder pattern.
//!
//! This module provides the `Opportunity` struct representing a detected
//! cross-venue spread, along with `OpportunityBuilder` for safe construction.
//! The builder computes every derived money field so that
//! `net_profit == gross_profit - estimated_fees` holds for every instance.

use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use super::id::{OpportunityId, Symbol, VenueId};
use super::money::{from_f64, Price, Volume};

/// Strategy that produced an opportunity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    /// Buy on the venue whose ask is below another venue's bid.
    Direct,
    /// Bet on a historically wide spread reverting to its mean.
    StatisticalMeanReversion,
}

impl StrategyKind {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Direct => "direct",
            Self::StatisticalMeanReversion => "statistical_mean_reversion",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when building an Opportunity fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpportunityBuildError {
    /// Symbol is required but was not provided.
    MissingSymbol,
    /// Buy venue and price are required but were not provided.
    MissingBuyLeg,
    /// Sell venue and price are required but were not provided.
    MissingSellLeg,
    /// Strategy is required but was not provided.
    MissingStrategy,
    /// Both legs point at the same venue.
    SameVenue,
    /// Buy price must be strictly positive.
    NonPositiveBuyPrice,
}

impl fmt::Display for OpportunityBuildError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingSymbol => write!(f, "symbol is required"),
            Self::MissingBuyLeg => write!(f, "buy venue and price are required"),
            Self::MissingSellLeg => write!(f, "sell venue and price are required"),
            Self::MissingStrategy => write!(f, "strategy is required"),
            Self::SameVenue => write!(f, "buy and sell venue must differ"),
            Self::NonPositiveBuyPrice => write!(f, "buy price must be positive"),
        }
    }
}

impl std::error::Error for OpportunityBuildError {}

/// A detected arbitrage opportunity.
///
/// Use `Opportunity::builder()` to construct instances. After construction
/// only the score fields can change, through [`Opportunity::with_confidence`]
/// and [`Opportunity::with_expected_profit`].
#[derive(Debug, Clone, Serialize)]
pub struct Opportunity {
    id: OpportunityId,
    symbol: Symbol,
    buy_venue: VenueId,
    sell_venue: VenueId,
    buy_price: Price,
    sell_price: Price,
    gross_profit: Decimal,
    profit_pct: Decimal,
    estimated_fees: Decimal,
    net_profit: Decimal,
    confidence: f64,
    expected_profit: Decimal,
    strategy: StrategyKind,
    volume_available: Volume,
    detected_at: DateTime<Utc>,
}

impl Opportunity {
    /// Create a new builder for constructing an Opportunity.
    pub fn builder() -> OpportunityBuilder {
        OpportunityBuilder::new()
    }

    pub fn id(&self) -> &OpportunityId {
        &self.id
    }

    pub fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    /// Venue the asset is bought on.
    pub fn buy_venue(&self) -> &VenueId {
        &self.buy_venue
    }

    /// Venue the asset is sold on.
    pub fn sell_venue(&self) -> &VenueId {
        &self.sell_venue
    }

    pub fn buy_price(&self) -> Price {
        self.buy_price
    }

    pub fn sell_price(&self) -> Price {
        self.sell_price
    }

    /// Per-unit gross profit (`sell_price - buy_price`).
    pub fn gross_profit(&self) -> Decimal {
        self.gross_profit
    }

    /// Gross margin in percent of the buy price.
    pub fn profit_pct(&self) -> Decimal {
        self.profit_pct
    }

    /// Per-unit fees for both legs.
    pub fn estimated_fees(&self) -> Decimal {
        self.estimated_fees
    }

    /// Per-unit profit after fees.
    pub fn net_profit(&self) -> Decimal {
        self.net_profit
    }

    /// Net margin in percent of the buy price.
    pub fn net_margin_pct(&self) -> Decimal {
        self.net_profit / self.buy_price * Decimal::ONE_HUNDRED
    }

    pub fn confidence(&self) -> f64 {
        self.confidence
    }

    /// Expected per-unit profit as estimated by the scorer.
    ///
    /// Equal to `net_profit` until a score is attached.
    pub fn expected_profit(&self) -> Decimal {
        self.expected_profit
    }

    pub fn strategy(&self) -> StrategyKind {
        self.strategy
    }

    /// Base-asset volume available on the thinner side.
    pub fn volume_available(&self) -> Volume {
        self.volume_available
    }

    pub fn detected_at(&self) -> DateTime<Utc> {
        self.detected_at
    }

    /// Ranking key: `net_profit × confidence`.
    pub fn ranking_score(&self) -> Decimal {
        self.net_profit * from_f64(self.confidence)
    }

    /// Returns a copy carrying the given confidence, clamped to `[0, 1]`.
    #[must_use]
    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = clamp_unit(confidence);
        self
    }

    /// Returns a copy carrying the scorer's expected profit.
    #[must_use]
    pub fn with_expected_profit(mut self, expected_profit: Decimal) -> Self {
        self.expected_profit = expected_profit;
        self
    }
}

fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// Builder for constructing `Opportunity` instances.
///
/// # Example
///
/// ```
/// use arbitron::domain::{Opportunity, StrategyKind};
/// use rust_decimal_macros::dec;
///
/// let opportunity = Opportunity::builder()
///     .symbol("BTC/USDT")
///     .buy("a", dec!(100.5))
///     .sell("b", dec!(101.0))
///     .estimated_fees(dec!(0.2015))
///     .volume_available(dec!(3))
///     .strategy(StrategyKind::Direct)
///     .build()
///     .unwrap();
///
/// assert_eq!(opportunity.net_profit(), dec!(0.2985));
/// ```
#[derive(Debug, Default)]
pub struct OpportunityBuilder {
    symbol: Option<Symbol>,
    buy: Option<(VenueId, Price)>,
    sell: Option<(VenueId, Price)>,
    estimated_fees: Decimal,
    confidence: Option<f64>,
    strategy: Option<StrategyKind>,
    volume_available: Volume,
    detected_at: Option<DateTime<Utc>>,
}

impl OpportunityBuilder {
    /// Create a new empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn symbol(mut self, symbol: impl Into<Symbol>) -> Self {
        self.symbol = Some(symbol.into());
        self
    }

    /// Set the buy venue and the price paid there.
    pub fn buy(mut self, venue: impl Into<VenueId>, price: Price) -> Self {
        self.buy = Some((venue.into(), price));
        self
    }

    /// Set the sell venue and the price received there.
    pub fn sell(mut self, venue: impl Into<VenueId>, price: Price) -> Self {
        self.sell = Some((venue.into(), price));
        self
    }

    /// Set the per-unit fees of both legs together.
    pub fn estimated_fees(mut self, fees: Decimal) -> Self {
        self.estimated_fees = fees;
        self
    }

    /// Set the detector's base confidence. Defaults to 1.0.
    pub fn confidence(mut self, confidence: f64) -> Self {
        self.confidence = Some(confidence);
        self
    }

    pub fn strategy(mut self, strategy: StrategyKind) -> Self {
        self.strategy = Some(strategy);
        self
    }

    pub fn volume_available(mut self, volume: Volume) -> Self {
        self.volume_available = volume;
        self
    }

    /// Set the detection time. Defaults to now.
    pub fn detected_at(mut self, at: DateTime<Utc>) -> Self {
        self.detected_at = Some(at);
        self
    }

    /// Build the Opportunity, calculating derived fields.
    ///
    /// # Errors
    ///
    /// Returns `OpportunityBuildError` if a required field is missing, both
    /// legs name the same venue, or the buy price is not positive.
    pub fn build(self) -> Result<Opportunity, OpportunityBuildError> {
        let symbol = self.symbol.ok_or(OpportunityBuildError::MissingSymbol)?;
        let (buy_venue, buy_price) = self.buy.ok_or(OpportunityBuildError::MissingBuyLeg)?;
        let (sell_venue, sell_price) = self.sell.ok_or(OpportunityBuildError::MissingSellLeg)?;
        let strategy = self.strategy.ok_or(OpportunityBuildError::MissingStrategy)?;

        if buy_venue == sell_venue {
            return Err(OpportunityBuildError::SameVenue);
        }
        if buy_price <= Decimal::ZERO {
            return Err(OpportunityBuildError::NonPositiveBuyPrice);
        }

        let gross_profit = sell_price - buy_price;
        let net_profit = gross_profit - self.estimated_fees;
        let profit_pct = gross_profit / buy_price * Decimal::ONE_HUNDRED;

        Ok(Opportunity {
            id: OpportunityId::new(),
            symbol,
            buy_venue,
            sell_venue,
            buy_price,
            sell_price,
            gross_profit,
            profit_pct,
            estimated_fees: self.estimated_fees,
            net_profit,
            confidence: clamp_unit(self.confidence.unwrap_or(1.0)),
            expected_profit: net_profit,
            strategy,
            volume_available: self.volume_available.max(Decimal::ZERO),
            detected_at: self.detected_at.unwrap_or_else(Utc::now),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn example() -> Opportunity {
        Opportunity::builder()
            .symbol("BTC/USDT")
            .buy("a", dec!(100.5))
            .sell("b", dec!(101.0))
            .estimated_fees(dec!(0.2015))
            .confidence(0.8)
            .volume_available(dec!(2))
            .strategy(StrategyKind::Direct)
            .build()
            .unwrap()
    }

    #[test]
    fn builder_computes_derived_fields() {
        let opp = example();

        assert_eq!(opp.gross_profit(), dec!(0.5));
        assert_eq!(opp.net_profit(), dec!(0.2985));
        assert_eq!(opp.net_profit(), opp.gross_profit() - opp.estimated_fees());
        assert_eq!(opp.profit_pct().round_dp(4), dec!(0.4975));
        assert_eq!(opp.expected_profit(), opp.net_profit());
        assert_eq!(opp.buy_venue().as_str(), "a");
        assert_eq!(opp.sell_venue().as_str(), "b");
    }

    #[test]
    fn net_margin_uses_buy_price() {
        let opp = example();
        assert_eq!(opp.net_margin_pct().round_dp(4), dec!(0.2970));
    }

    #[test]
    fn builder_requires_symbol() {
        let result = Opportunity::builder()
            .buy("a", dec!(1))
            .sell("b", dec!(2))
            .strategy(StrategyKind::Direct)
            .build();

        assert_eq!(result.unwrap_err(), OpportunityBuildError::MissingSymbol);
    }

    #[test]
    fn builder_rejects_same_venue() {
        let result = Opportunity::builder()
            .symbol("ETH/USDT")
            .buy("a", dec!(1))
            .sell("a", dec!(2))
            .strategy(StrategyKind::Direct)
            .build();

        assert_eq!(result.unwrap_err(), OpportunityBuildError::SameVenue);
    }

    #[test]
    fn builder_rejects_zero_buy_price() {
        let result = Opportunity::builder()
            .symbol("ETH/USDT")
            .buy("a", Decimal::ZERO)
            .sell("b", dec!(2))
            .strategy(StrategyKind::Direct)
            .build();

        assert_eq!(result.unwrap_err(), OpportunityBuildError::NonPositiveBuyPrice);
    }

    #[test]
    fn confidence_is_clamped() {
        let opp = example().with_confidence(1.7);
        assert_eq!(opp.confidence(), 1.0);

        let opp = opp.with_confidence(f64::NAN);
        assert_eq!(opp.confidence(), 0.0);
    }

    #[test]
    fn scoring_keeps_money_fields() {
        let opp = example();
        let scored = opp
            .clone()
            .with_confidence(0.5)
            .with_expected_profit(dec!(0.14925));

        assert_eq!(scored.id(), opp.id());
        assert_eq!(scored.net_profit(), opp.net_profit());
        assert_eq!(scored.expected_profit(), dec!(0.14925));
        assert_eq!(scored.ranking_score(), dec!(0.14925));
    }

    #[test]
    fn strategy_kind_display() {
        assert_eq!(StrategyKind::Direct.to_string(), "direct");
        assert_eq!(
            StrategyKind::StatisticalMeanReversion.to_string(),
            "statistical_mean_reversion"
        );
    }
}
