//! Statistical mean-reversion detection.
//!
//! Tracks the normalized spread `(price_a - price_b) / price_b` of every
//! venue pair and bets on reversion once the current spread sits more than
//! `z_threshold` standard deviations away from its rolling mean.

use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::debug;

use crate::domain::money::to_f64;
use crate::domain::time::seconds;
use crate::domain::{MarketSnapshot, Opportunity, SpreadBook, SpreadKey, StrategyKind, Symbol};
use crate::port::inbound::strategy::{DetectionContext, Strategy};

/// Configuration for the mean-reversion strategy.
#[derive(Debug, Clone, Deserialize)]
pub struct StatisticalConfig {
    /// Maximum observations kept per venue pair.
    #[serde(default = "default_lookback")]
    pub lookback: usize,

    /// Maximum age of an observation in seconds.
    #[serde(default = "default_max_history_age_secs")]
    pub max_history_age_secs: u64,

    /// Observations required before a z-score is computed.
    #[serde(default = "default_min_observations")]
    pub min_observations: usize,

    /// Absolute z-score above which a candidate is emitted.
    #[serde(default = "default_z_threshold")]
    pub z_threshold: f64,
}

const fn default_lookback() -> usize {
    100
}

const fn default_max_history_age_secs() -> u64 {
    3600
}

const fn default_min_observations() -> usize {
    20
}

const fn default_z_threshold() -> f64 {
    2.0
}

impl Default for StatisticalConfig {
    fn default() -> Self {
        Self {
            lookback: default_lookback(),
            max_history_age_secs: default_max_history_age_secs(),
            min_observations: default_min_observations(),
            z_threshold: default_z_threshold(),
        }
    }
}

/// Strategy owning one spread history per (symbol, venue pair).
pub struct StatisticalStrategy {
    config: StatisticalConfig,
    book: SpreadBook,
}

impl StatisticalStrategy {
    #[must_use]
    pub fn new(config: StatisticalConfig) -> Self {
        let max_age = seconds(config.max_history_age_secs);
        let book = SpreadBook::new(config.lookback, max_age);
        Self { config, book }
    }

    /// Spread histories collected so far.
    #[must_use]
    pub fn book(&self) -> &SpreadBook {
        &self.book
    }

    fn evaluate(
        &mut self,
        ctx: &DetectionContext<'_>,
        symbol: &Symbol,
        a: &MarketSnapshot,
        b: &MarketSnapshot,
    ) -> Option<Opportunity> {
        let price_a = a.reference_price()?;
        let price_b = b.reference_price()?;
        let current = to_f64((price_a - price_b) / price_b);

        let key = SpreadKey::new(symbol.clone(), a.venue.clone(), b.venue.clone());
        let history = self.book.record(key, ctx.now, current);
        if history.len() < self.config.min_observations {
            return None;
        }

        let (mean, std) = history.mean_std();
        if std == 0.0 {
            return None;
        }

        let z = (current - mean) / std;
        if z.abs() <= self.config.z_threshold {
            return None;
        }

        // A is rich relative to B: buy B, sell A. And the reverse.
        let (buy, sell) = if z > 0.0 { (b, a) } else { (a, b) };
        let ask = buy.ask()?;
        let bid = sell.bid()?;
        if bid <= ask {
            return None;
        }

        debug!(
            symbol = %symbol,
            buy = %buy.venue,
            sell = %sell.venue,
            z_score = z,
            "Spread deviates from mean"
        );

        Opportunity::builder()
            .symbol(symbol.clone())
            .buy(buy.venue.clone(), ask)
            .sell(sell.venue.clone(), bid)
            .estimated_fees(ctx.leg_fees(ask, bid))
            .confidence((z.abs() / 5.0).min(1.0))
            .volume_available(buy.volume.min(sell.volume).max(Decimal::ZERO))
            .strategy(StrategyKind::StatisticalMeanReversion)
            .detected_at(ctx.now)
            .build()
            .ok()
    }
}

impl Strategy for StatisticalStrategy {
    fn name(&self) -> &'static str {
        "statistical_mean_reversion"
    }

    fn kind(&self) -> StrategyKind {
        StrategyKind::StatisticalMeanReversion
    }

    fn detect(&mut self, ctx: &DetectionContext<'_>) -> Vec<Opportunity> {
        let mut found = Vec::new();
        for (symbol, venues) in &ctx.markets {
            for (i, a) in venues.iter().enumerate() {
                for b in &venues[i + 1..] {
                    if let Some(opp) = self.evaluate(ctx, symbol, a, b) {
                        found.push(opp);
                    }
                }
            }
        }
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};
    use rust_decimal_macros::dec;
    use std::collections::BTreeMap;

    fn config(min_observations: usize) -> StatisticalConfig {
        StatisticalConfig {
            lookback: 50,
            max_history_age_secs: 3600,
            min_observations,
            z_threshold: 2.0,
        }
    }

    fn run(
        strategy: &mut StatisticalStrategy,
        now: DateTime<Utc>,
        a: MarketSnapshot,
        b: MarketSnapshot,
    ) -> Vec<Opportunity> {
        let snapshots = [a, b];
        let mut markets: BTreeMap<Symbol, Vec<&MarketSnapshot>> = BTreeMap::new();
        for s in &snapshots {
            markets.entry(s.symbol.clone()).or_default().push(s);
        }
        let ctx = DetectionContext {
            now,
            markets,
            fee_rate_per_leg: dec!(0.0005),
            min_profit_threshold: dec!(0.002),
        };
        strategy.detect(&ctx)
    }

    fn quote(venue: &str, bid: Decimal, ask: Decimal, last: Decimal) -> MarketSnapshot {
        MarketSnapshot::new(venue, "BTC/USDT")
            .with_quote(bid, ask)
            .with_last(last)
            .with_volume(dec!(10))
    }

    fn warm_up(strategy: &mut StatisticalStrategy, now: DateTime<Utc>, rounds: usize) {
        for i in 0..rounds {
            // Spread alternates around zero: +0.1% / -0.1%.
            let last_a = if i % 2 == 0 { dec!(100.1) } else { dec!(99.9) };
            run(
                strategy,
                now,
                quote("a", dec!(99.9), dec!(100.1), last_a),
                quote("b", dec!(99.9), dec!(100.1), dec!(100)),
            );
        }
    }

    #[test]
    fn waits_for_min_observations() {
        let now = Utc::now();
        let mut strategy = StatisticalStrategy::new(config(20));
        warm_up(&mut strategy, now, 5);

        let found = run(
            &mut strategy,
            now,
            quote("a", dec!(105), dec!(105.2), dec!(105.1)),
            quote("b", dec!(99.9), dec!(100.1), dec!(100)),
        );

        assert!(found.is_empty());
        assert_eq!(strategy.book().len(), 1);
    }

    #[test]
    fn rich_venue_is_sold() {
        let now = Utc::now();
        let mut strategy = StatisticalStrategy::new(config(10));
        warm_up(&mut strategy, now, 20);

        let found = run(
            &mut strategy,
            now,
            quote("a", dec!(101.0), dec!(101.1), dec!(101.0)),
            quote("b", dec!(99.9), dec!(100.1), dec!(100)),
        );

        assert_eq!(found.len(), 1);
        let opp = &found[0];
        assert_eq!(opp.buy_venue().as_str(), "b");
        assert_eq!(opp.sell_venue().as_str(), "a");
        assert_eq!(opp.buy_price(), dec!(100.1));
        assert_eq!(opp.sell_price(), dec!(101.0));
        assert_eq!(opp.strategy(), StrategyKind::StatisticalMeanReversion);
        assert_eq!(opp.net_profit(), opp.gross_profit() - opp.estimated_fees());
        assert!(opp.confidence() > 0.4 && opp.confidence() <= 1.0);
    }

    #[test]
    fn flat_history_is_skipped() {
        let now = Utc::now();
        let mut strategy = StatisticalStrategy::new(config(3));
        for _ in 0..5 {
            let found = run(
                &mut strategy,
                now,
                quote("a", dec!(99.9), dec!(100.1), dec!(100)),
                quote("b", dec!(99.9), dec!(100.1), dec!(100)),
            );
            assert!(found.is_empty());
        }
    }

    #[test]
    fn no_candidate_without_positive_gross() {
        let now = Utc::now();
        let mut strategy = StatisticalStrategy::new(config(10));
        warm_up(&mut strategy, now, 20);

        // Last trade moved but the book did not cross.
        let found = run(
            &mut strategy,
            now,
            quote("a", dec!(99.9), dec!(100.1), dec!(101.0)),
            quote("b", dec!(99.9), dec!(100.1), dec!(100)),
        );

        assert!(found.is_empty());
    }
}
