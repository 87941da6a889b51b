//! Latest quote per (venue, symbol).

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use super::id::{Symbol, VenueId};
use super::money::{Price, Volume};

/// Key of a snapshot in a [`SnapshotMap`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SnapshotKey {
    pub venue: VenueId,
    pub symbol: Symbol,
}

impl SnapshotKey {
    pub fn new(venue: impl Into<VenueId>, symbol: impl Into<Symbol>) -> Self {
        Self {
            venue: venue.into(),
            symbol: symbol.into(),
        }
    }
}

/// All snapshots of one poll.
pub type SnapshotMap = HashMap<SnapshotKey, MarketSnapshot>;

/// Top-of-book quote and traded volume for one symbol on one venue.
///
/// A missing or non-positive bid or ask means "no quote" on that side.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarketSnapshot {
    pub venue: VenueId,
    pub symbol: Symbol,
    pub bid: Option<Price>,
    pub ask: Option<Price>,
    pub last: Option<Price>,
    pub volume: Volume,
    pub timestamp: DateTime<Utc>,
}

fn positive(price: Option<Price>) -> Option<Price> {
    price.filter(|p| *p > Decimal::ZERO)
}

impl MarketSnapshot {
    pub fn new(venue: impl Into<VenueId>, symbol: impl Into<Symbol>) -> Self {
        Self {
            venue: venue.into(),
            symbol: symbol.into(),
            bid: None,
            ask: None,
            last: None,
            volume: Decimal::ZERO,
            timestamp: Utc::now(),
        }
    }

    #[must_use]
    pub fn with_quote(mut self, bid: Price, ask: Price) -> Self {
        self.bid = Some(bid);
        self.ask = Some(ask);
        self
    }

    #[must_use]
    pub fn with_last(mut self, last: Price) -> Self {
        self.last = Some(last);
        self
    }

    #[must_use]
    pub fn with_volume(mut self, volume: Volume) -> Self {
        self.volume = volume;
        self
    }

    #[must_use]
    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn key(&self) -> SnapshotKey {
        SnapshotKey::new(self.venue.clone(), self.symbol.clone())
    }

    /// Usable bid, if any.
    pub fn bid(&self) -> Option<Price> {
        positive(self.bid)
    }

    /// Usable ask, if any.
    pub fn ask(&self) -> Option<Price> {
        positive(self.ask)
    }

    /// Midpoint of a two-sided quote.
    pub fn mid(&self) -> Option<Price> {
        Some((self.bid()? + self.ask()?) / Decimal::TWO)
    }

    /// Last traded price, falling back to the mid.
    pub fn reference_price(&self) -> Option<Price> {
        positive(self.last).or_else(|| self.mid())
    }

    /// Returns true if the snapshot is not older than `max_age` at `now`.
    pub fn is_fresh(&self, now: DateTime<Utc>, max_age: Duration) -> bool {
        now.signed_duration_since(self.timestamp) <= max_age
    }
}

/// Group fresh snapshots by symbol, venues in lexical order.
pub fn fresh_by_symbol(
    snapshots: &SnapshotMap,
    now: DateTime<Utc>,
    max_age: Duration,
) -> BTreeMap<Symbol, Vec<&MarketSnapshot>> {
    let mut grouped: BTreeMap<Symbol, Vec<&MarketSnapshot>> = BTreeMap::new();
    for snapshot in snapshots.values().filter(|s| s.is_fresh(now, max_age)) {
        grouped
            .entry(snapshot.symbol.clone())
            .or_default()
            .push(snapshot);
    }
    for venues in grouped.values_mut() {
        venues.sort_by(|a, b| a.venue.cmp(&b.venue));
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn non_positive_quotes_are_missing() {
        let snap = MarketSnapshot::new("a", "BTC/USDT").with_quote(dec!(0), dec!(101));

        assert_eq!(snap.bid(), None);
        assert_eq!(snap.ask(), Some(dec!(101)));
        assert_eq!(snap.mid(), None);
    }

    #[test]
    fn reference_price_prefers_last() {
        let snap = MarketSnapshot::new("a", "BTC/USDT").with_quote(dec!(100), dec!(102));
        assert_eq!(snap.reference_price(), Some(dec!(101)));

        let snap = snap.with_last(dec!(100.7));
        assert_eq!(snap.reference_price(), Some(dec!(100.7)));
    }

    #[test]
    fn freshness_cutoff() {
        let now = Utc::now();
        let snap = MarketSnapshot::new("a", "BTC/USDT").at(now - Duration::seconds(10));

        assert!(snap.is_fresh(now, Duration::seconds(10)));
        assert!(!snap.is_fresh(now, Duration::seconds(9)));
    }

    #[test]
    fn grouping_skips_stale_and_sorts_venues() {
        let now = Utc::now();
        let mut map = SnapshotMap::new();
        for (venue, age) in [("c", 1), ("a", 1), ("b", 60)] {
            let snap = MarketSnapshot::new(venue, "BTC/USDT").at(now - Duration::seconds(age));
            map.insert(snap.key(), snap);
        }

        let grouped = fresh_by_symbol(&map, now, Duration::seconds(5));
        let venues: Vec<_> = grouped[&Symbol::from("BTC/USDT")]
            .iter()
            .map(|s| s.venue.as_str())
            .collect();

        assert_eq!(venues, vec!["a", "c"]);
    }
}
