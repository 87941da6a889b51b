//! Composite risk score of a single opportunity.

use std::collections::HashMap;

use crate::domain::money::to_f64;
use crate::domain::Opportunity;

const PROFIT_WEIGHT: f64 = 0.30;
const VENUE_WEIGHT: f64 = 0.20;
const LIQUIDITY_WEIGHT: f64 = 0.20;
const MARKET_WEIGHT: f64 = 0.30;

/// Risk assumed for a venue with no configured value.
pub const DEFAULT_VENUE_RISK: f64 = 0.5;

/// Per-component breakdown of a risk score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RiskScore {
    pub profit_margin_risk: f64,
    pub venue_risk: f64,
    pub liquidity_risk: f64,
    pub market_risk: f64,
}

impl RiskScore {
    /// Weighted total in `[0, 1]`.
    #[must_use]
    pub fn total(&self) -> f64 {
        PROFIT_WEIGHT * self.profit_margin_risk
            + VENUE_WEIGHT * self.venue_risk
            + LIQUIDITY_WEIGHT * self.liquidity_risk
            + MARKET_WEIGHT * self.market_risk
    }
}

/// Computes [`RiskScore`]s from configured venue and market risk levels.
#[derive(Debug, Clone)]
pub struct RiskScorer {
    venue_risk: HashMap<String, f64>,
    market_risk: f64,
}

impl RiskScorer {
    #[must_use]
    pub fn new(venue_risk: HashMap<String, f64>, market_risk: f64) -> Self {
        Self {
            venue_risk,
            market_risk: market_risk.clamp(0.0, 1.0),
        }
    }

    fn venue(&self, name: &str) -> f64 {
        self.venue_risk
            .get(name)
            .copied()
            .unwrap_or(DEFAULT_VENUE_RISK)
            .clamp(0.0, 1.0)
    }

    #[must_use]
    pub fn score(&self, opportunity: &Opportunity) -> RiskScore {
        let pct = to_f64(opportunity.profit_pct());
        let volume = to_f64(opportunity.volume_available()).max(0.0);

        RiskScore {
            profit_margin_risk: (1.0 - pct / 5.0).clamp(0.0, 1.0),
            venue_risk: (self.venue(opportunity.buy_venue().as_str())
                + self.venue(opportunity.sell_venue().as_str()))
                / 2.0,
            liquidity_risk: (1.0 - volume.ln_1p() / 10.0).max(0.0),
            market_risk: self.market_risk,
        }
    }
}

impl Default for RiskScorer {
    fn default() -> Self {
        Self::new(HashMap::new(), 0.5)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::StrategyKind;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn opportunity(volume: Decimal) -> Opportunity {
        Opportunity::builder()
            .symbol("BTC/USDT")
            .buy("a", dec!(100.5))
            .sell("b", dec!(101.0))
            .estimated_fees(dec!(0.2015))
            .volume_available(volume)
            .strategy(StrategyKind::Direct)
            .build()
            .unwrap()
    }

    #[test]
    fn zero_volume_is_maximally_illiquid() {
        let score = RiskScorer::default().score(&opportunity(Decimal::ZERO));
        assert_eq!(score.liquidity_risk, 1.0);
    }

    #[test]
    fn defaults_score_the_worked_example() {
        let score = RiskScorer::default().score(&opportunity(dec!(1000)));

        assert!((score.profit_margin_risk - (1.0 - 0.497512 / 5.0)).abs() < 1e-4);
        assert_eq!(score.venue_risk, 0.5);
        assert!((score.liquidity_risk - (1.0 - 1001f64.ln() / 10.0)).abs() < 1e-12);
        assert!(score.total() < 0.7);
    }

    #[test]
    fn thin_books_push_score_up() {
        let score = RiskScorer::default().score(&opportunity(dec!(1)));
        assert!(score.total() > 0.7);
    }

    #[test]
    fn configured_venues_are_averaged() {
        let venues = HashMap::from([("a".to_string(), 0.1), ("b".to_string(), 0.3)]);
        let score = RiskScorer::new(venues, 0.2).score(&opportunity(dec!(10)));

        assert!((score.venue_risk - 0.2).abs() < 1e-12);
        assert_eq!(score.market_risk, 0.2);
    }
}
