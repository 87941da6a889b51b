//! Opportunity detection service.
//!
//! Runs every registered [`Strategy`](crate::port::inbound::strategy::Strategy)
//! over fresh snapshots and ranks the combined candidates.

pub mod direct;
pub mod registry;
pub mod statistical;

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::debug;

use crate::domain::snapshot::fresh_by_symbol;
use crate::domain::{Opportunity, SnapshotMap, Symbol, VenueId};
use crate::port::inbound::strategy::DetectionContext;

pub use registry::{StrategyRegistry, StrategyRegistryBuilder};
pub use statistical::StatisticalConfig;

/// Configuration for the opportunity detector.
#[derive(Debug, Clone, Deserialize)]
pub struct DetectorConfig {
    /// Fee rate charged per leg, as a fraction (0.001 = 0.1%).
    #[serde(default = "default_fee_rate_per_leg")]
    pub fee_rate_per_leg: Decimal,

    /// Minimum net margin, as a fraction of the buy price.
    #[serde(default = "default_min_profit_threshold")]
    pub min_profit_threshold: Decimal,

    /// Enable the direct spread strategy.
    #[serde(default = "default_true")]
    pub direct_enabled: bool,

    /// Base confidence of direct spread candidates.
    #[serde(default = "default_direct_confidence")]
    pub direct_confidence: f64,

    /// Enable the statistical mean-reversion strategy.
    #[serde(default = "default_true")]
    pub statistical_enabled: bool,

    #[serde(default)]
    pub statistical: StatisticalConfig,

    /// Maximum candidates returned per cycle.
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

fn default_fee_rate_per_leg() -> Decimal {
    Decimal::new(1, 3) // 0.1%
}

fn default_min_profit_threshold() -> Decimal {
    Decimal::new(2, 3) // 0.2%
}

const fn default_true() -> bool {
    true
}

const fn default_direct_confidence() -> f64 {
    0.8
}

const fn default_top_k() -> usize {
    10
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            fee_rate_per_leg: default_fee_rate_per_leg(),
            min_profit_threshold: default_min_profit_threshold(),
            direct_enabled: true,
            direct_confidence: default_direct_confidence(),
            statistical_enabled: true,
            statistical: StatisticalConfig::default(),
            top_k: default_top_k(),
        }
    }
}

/// Scans snapshots and emits ranked opportunities.
pub struct Detector {
    config: DetectorConfig,
    max_snapshot_age: Duration,
    strategies: StrategyRegistry,
}

impl Detector {
    /// Create a detector with the strategies enabled in `config`.
    #[must_use]
    pub fn new(config: DetectorConfig, max_snapshot_age: Duration) -> Self {
        let mut builder = StrategyRegistry::builder();
        if config.direct_enabled {
            builder = builder.direct(config.direct_confidence);
        }
        if config.statistical_enabled {
            builder = builder.statistical(config.statistical.clone());
        }
        Self::with_strategies(config, max_snapshot_age, builder.build())
    }

    /// Create a detector with an explicit strategy registry.
    #[must_use]
    pub fn with_strategies(
        config: DetectorConfig,
        max_snapshot_age: Duration,
        strategies: StrategyRegistry,
    ) -> Self {
        Self {
            config,
            max_snapshot_age,
            strategies,
        }
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    pub fn strategies(&self) -> &StrategyRegistry {
        &self.strategies
    }

    pub fn strategies_mut(&mut self) -> &mut StrategyRegistry {
        &mut self.strategies
    }

    /// Run all strategies over the fresh subset of `snapshots` and rank.
    pub fn detect(&mut self, snapshots: &SnapshotMap, now: DateTime<Utc>) -> Vec<Opportunity> {
        let markets = fresh_by_symbol(snapshots, now, self.max_snapshot_age);
        let ctx = DetectionContext {
            now,
            markets,
            fee_rate_per_leg: self.config.fee_rate_per_leg,
            min_profit_threshold: self.config.min_profit_threshold,
        };

        let candidates = self.strategies.detect_all(&ctx);
        let found = candidates.len();
        let ranked = rank(
            candidates,
            self.config.min_profit_threshold,
            self.config.top_k,
        );

        debug!(
            snapshots = snapshots.len(),
            candidates = found,
            ranked = ranked.len(),
            "Detection pass complete"
        );
        ranked
    }
}

/// Filter, dedupe and order candidates.
///
/// Candidates whose net margin is below `min_profit_threshold` are dropped.
/// Per (symbol, buy venue, sell venue) only the candidate with the highest
/// `net_profit × confidence` survives. The result is sorted by that product,
/// descending, and truncated to `top_k`.
#[must_use]
pub fn rank(
    candidates: Vec<Opportunity>,
    min_profit_threshold: Decimal,
    top_k: usize,
) -> Vec<Opportunity> {
    let min_pct = min_profit_threshold * Decimal::ONE_HUNDRED;
    let mut best: HashMap<(Symbol, VenueId, VenueId), Opportunity> = HashMap::new();

    for opp in candidates {
        if opp.net_profit() <= Decimal::ZERO || opp.net_margin_pct() < min_pct {
            continue;
        }
        let key = (
            opp.symbol().clone(),
            opp.buy_venue().clone(),
            opp.sell_venue().clone(),
        );
        match best.get(&key) {
            Some(existing) if existing.ranking_score() >= opp.ranking_score() => {}
            _ => {
                best.insert(key, opp);
            }
        }
    }

    let mut ranked: Vec<Opportunity> = best.into_values().collect();
    ranked.sort_by(|a, b| {
        b.ranking_score()
            .cmp(&a.ranking_score())
            .then_with(|| a.symbol().cmp(b.symbol()))
            .then_with(|| a.buy_venue().cmp(b.buy_venue()))
    });
    ranked.truncate(top_k);
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{MarketSnapshot, StrategyKind};
    use rust_decimal_macros::dec;

    fn candidate(buy: &str, sell: &str, sell_price: Decimal, confidence: f64) -> Opportunity {
        Opportunity::builder()
            .symbol("BTC/USDT")
            .buy(buy, dec!(100))
            .sell(sell, sell_price)
            .estimated_fees(dec!(0.2))
            .confidence(confidence)
            .strategy(StrategyKind::Direct)
            .build()
            .unwrap()
    }

    #[test]
    fn rank_drops_thin_margins() {
        // net 0.1 on 100 = 0.1% < 0.2%
        let ranked = rank(vec![candidate("a", "b", dec!(100.3), 1.0)], dec!(0.002), 10);
        assert!(ranked.is_empty());
    }

    #[test]
    fn rank_keeps_best_per_route() {
        let ranked = rank(
            vec![
                candidate("a", "b", dec!(101), 0.5),
                candidate("a", "b", dec!(101), 0.9),
                candidate("a", "c", dec!(102), 0.5),
            ],
            dec!(0.002),
            10,
        );

        assert_eq!(ranked.len(), 2);
        // a->c: 1.8 * 0.5 = 0.9 beats a->b: 0.8 * 0.9 = 0.72
        assert_eq!(ranked[0].sell_venue().as_str(), "c");
        assert_eq!(ranked[1].confidence(), 0.9);
    }

    #[test]
    fn rank_truncates_to_top_k() {
        let ranked = rank(
            vec![
                candidate("a", "b", dec!(101), 0.5),
                candidate("a", "c", dec!(102), 0.5),
                candidate("b", "c", dec!(103), 0.5),
            ],
            dec!(0.002),
            2,
        );

        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].sell_price(), dec!(103));
    }

    #[test]
    fn detector_skips_stale_snapshots() {
        let now = Utc::now();
        let mut snapshots = SnapshotMap::new();
        for snap in [
            MarketSnapshot::new("a", "BTC/USDT")
                .with_quote(dec!(100.0), dec!(100.5))
                .at(now - Duration::seconds(60)),
            MarketSnapshot::new("b", "BTC/USDT")
                .with_quote(dec!(101.0), dec!(101.2))
                .at(now),
        ] {
            snapshots.insert(snap.key(), snap);
        }

        let mut detector = Detector::new(DetectorConfig::default(), Duration::seconds(10));

        assert!(detector.detect(&snapshots, now).is_empty());
    }

    #[test]
    fn detector_emits_fresh_direct_spread() {
        let now = Utc::now();
        let mut snapshots = SnapshotMap::new();
        for snap in [
            MarketSnapshot::new("a", "BTC/USDT")
                .with_quote(dec!(100.0), dec!(100.5))
                .with_volume(dec!(4))
                .at(now),
            MarketSnapshot::new("b", "BTC/USDT")
                .with_quote(dec!(101.0), dec!(101.2))
                .with_volume(dec!(4))
                .at(now),
        ] {
            snapshots.insert(snap.key(), snap);
        }

        let mut detector = Detector::new(DetectorConfig::default(), Duration::seconds(10));
        let found = detector.detect(&snapshots, now);

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].net_profit(), dec!(0.2985));
        assert_eq!(detector.strategies().len(), 2);
    }
}
