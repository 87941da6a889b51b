//! Integration tests for opportunity detection across venues and symbols.

use arbitron::application::detector::{Detector, DetectorConfig};
use arbitron::domain::time::seconds;
use arbitron::domain::{MarketSnapshot, StrategyKind};
use arbitron::testkit::domain::{quote, snapshot_map, worked_example, SYMBOL};
use chrono::Utc;
use rust_decimal_macros::dec;

fn detector(config: DetectorConfig) -> Detector {
    Detector::new(config, seconds(10))
}

#[test]
fn worked_example_yields_one_direct_candidate() {
    let now = Utc::now();
    let found = detector(DetectorConfig::default()).detect(&worked_example(now), now);

    assert_eq!(found.len(), 1);
    let opp = &found[0];
    assert_eq!(opp.buy_venue().as_str(), "a");
    assert_eq!(opp.sell_venue().as_str(), "b");
    assert_eq!(opp.buy_price(), dec!(100.5));
    assert_eq!(opp.sell_price(), dec!(101.0));
    assert_eq!(opp.gross_profit(), dec!(0.5));
    assert_eq!(opp.estimated_fees(), dec!(0.2015));
    assert_eq!(opp.net_profit(), dec!(0.2985));
    assert_eq!(opp.strategy(), StrategyKind::Direct);
    assert_eq!(opp.volume_available(), dec!(1000));
    assert_eq!(opp.detected_at(), now);
}

#[test]
fn routes_are_ranked_and_thin_margins_dropped() {
    let now = Utc::now();
    let snapshots = snapshot_map([
        quote("a", SYMBOL, dec!(100.0), dec!(100.5), dec!(10), now),
        quote("b", SYMBOL, dec!(101.0), dec!(101.2), dec!(10), now),
        quote("c", SYMBOL, dec!(101.5), dec!(101.8), dec!(10), now),
    ]);

    let found = detector(DetectorConfig::default()).detect(&snapshots, now);

    // b -> c nets 0.0973 on 101.2, under the 0.2% floor.
    let routes: Vec<(&str, &str)> = found
        .iter()
        .map(|o| (o.buy_venue().as_str(), o.sell_venue().as_str()))
        .collect();
    assert_eq!(routes, vec![("a", "c"), ("a", "b")]);
    assert_eq!(found[0].net_profit(), dec!(0.798));
    for opp in &found {
        assert_eq!(opp.net_profit(), opp.gross_profit() - opp.estimated_fees());
    }
}

#[test]
fn symbols_never_cross() {
    let now = Utc::now();
    let snapshots = snapshot_map([
        quote("a", "BTC/USDT", dec!(100.0), dec!(100.5), dec!(10), now),
        quote("b", "ETH/USDT", dec!(101.0), dec!(101.2), dec!(10), now),
    ]);

    assert!(detector(DetectorConfig::default())
        .detect(&snapshots, now)
        .is_empty());
}

#[test]
fn one_sided_and_stale_quotes_are_ignored() {
    let now = Utc::now();
    let snapshots = snapshot_map([
        quote("a", SYMBOL, dec!(100.0), dec!(100.5), dec!(10), now),
        MarketSnapshot::new("b", SYMBOL).with_last(dec!(101)).at(now),
        quote("c", SYMBOL, dec!(101.0), dec!(101.2), dec!(10), now - seconds(11)),
    ]);

    assert!(detector(DetectorConfig::default())
        .detect(&snapshots, now)
        .is_empty());
}

#[test]
fn top_k_caps_the_result() {
    let now = Utc::now();
    let snapshots = snapshot_map([
        quote("a", SYMBOL, dec!(100.0), dec!(100.5), dec!(10), now),
        quote("b", SYMBOL, dec!(101.0), dec!(101.2), dec!(10), now),
        quote("c", SYMBOL, dec!(101.5), dec!(101.8), dec!(10), now),
    ]);
    let config = DetectorConfig {
        top_k: 1,
        ..DetectorConfig::default()
    };

    let found = detector(config).detect(&snapshots, now);

    assert_eq!(found.len(), 1);
    assert_eq!(found[0].sell_venue().as_str(), "c");
}

#[test]
fn disabled_strategies_detect_nothing() {
    let now = Utc::now();
    let mut detector = detector(DetectorConfig {
        direct_enabled: false,
        statistical_enabled: false,
        ..DetectorConfig::default()
    });

    assert!(detector.strategies().is_empty());
    assert!(detector.detect(&worked_example(now), now).is_empty());
}

#[test]
fn higher_fees_raise_the_bar() {
    let now = Utc::now();
    let config = DetectorConfig {
        fee_rate_per_leg: dec!(0.002),
        ..DetectorConfig::default()
    };

    // 0.5 gross against 0.403 fees leaves under 0.2% of 100.5.
    assert!(detector(config).detect(&worked_example(now), now).is_empty());
}
