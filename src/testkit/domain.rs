//! Builders for domain primitives used across tests.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::domain::{MarketSnapshot, Opportunity, SnapshotMap, StrategyKind};

/// The symbol every builder defaults to.
pub const SYMBOL: &str = "BTC/USDT";

/// A quoted snapshot with volume, stamped `at`.
pub fn quote(
    venue: &str,
    symbol: &str,
    bid: Decimal,
    ask: Decimal,
    volume: Decimal,
    at: DateTime<Utc>,
) -> MarketSnapshot {
    MarketSnapshot::new(venue, symbol)
        .with_quote(bid, ask)
        .with_volume(volume)
        .at(at)
}

/// Collect snapshots into a map keyed by (venue, symbol).
pub fn snapshot_map(snapshots: impl IntoIterator<Item = MarketSnapshot>) -> SnapshotMap {
    snapshots.into_iter().map(|s| (s.key(), s)).collect()
}

/// Venue `a` bid 100.0 ask 100.5, venue `b` bid 101.0 ask 101.2, both with
/// 1000 volume.
pub fn worked_example(at: DateTime<Utc>) -> SnapshotMap {
    snapshot_map([
        quote("a", SYMBOL, dec!(100.0), dec!(100.5), dec!(1000), at),
        quote("b", SYMBOL, dec!(101.0), dec!(101.2), dec!(1000), at),
    ])
}

/// The opportunity detected from [`worked_example`] at 0.1% fee per leg.
pub fn worked_opportunity(volume: Decimal) -> Opportunity {
    opportunity("a", dec!(100.5), "b", dec!(101.0), dec!(0.2015), volume)
}

/// A direct-spread opportunity with confidence 0.8.
pub fn opportunity(
    buy_venue: &str,
    buy_price: Decimal,
    sell_venue: &str,
    sell_price: Decimal,
    fees: Decimal,
    volume: Decimal,
) -> Opportunity {
    Opportunity::builder()
        .symbol(SYMBOL)
        .buy(buy_venue, buy_price)
        .sell(sell_venue, sell_price)
        .estimated_fees(fees)
        .confidence(0.8)
        .volume_available(volume)
        .strategy(StrategyKind::Direct)
        .build()
        .expect("valid test opportunity")
}
