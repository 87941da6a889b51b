//! In-memory market data.
//!
//! [`MemorySnapshotStore`] keeps the latest quote per (venue, symbol) and
//! implements the snapshot port. [`SimulatedFeed`] drives it with a random
//! walk so paper mode runs without a live feed.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use rand::Rng;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::debug;

use crate::domain::money::{from_f64, to_f64};
use crate::domain::{MarketSnapshot, SnapshotKey, SnapshotMap, Symbol, VenueId};
use crate::error::Result;
use crate::port::SnapshotStore;

/// Latest snapshot per (venue, symbol).
#[derive(Default)]
pub struct MemorySnapshotStore {
    snapshots: DashMap<SnapshotKey, MarketSnapshot>,
}

impl MemorySnapshotStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the snapshot for its (venue, symbol).
    pub fn upsert(&self, snapshot: MarketSnapshot) {
        self.snapshots.insert(snapshot.key(), snapshot);
    }

    /// Current snapshot for one (venue, symbol).
    #[must_use]
    pub fn get(&self, venue: &VenueId, symbol: &Symbol) -> Option<MarketSnapshot> {
        self.snapshots
            .get(&SnapshotKey::new(venue.clone(), symbol.clone()))
            .map(|s| s.value().clone())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}

#[async_trait]
impl SnapshotStore for MemorySnapshotStore {
    async fn latest(&self) -> Result<SnapshotMap> {
        Ok(self
            .snapshots
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect())
    }
}

/// Random-walk parameters for the simulated feed.
#[derive(Debug, Clone, Deserialize)]
pub struct SimulationConfig {
    /// Starting mid price per symbol; symbols not listed start at 100.
    #[serde(default)]
    pub start_prices: HashMap<String, Decimal>,

    /// Standard step of the shared walk, as a fraction of price.
    #[serde(default = "default_volatility")]
    pub volatility: f64,

    /// Largest per-venue deviation from the shared mid, as a fraction.
    #[serde(default = "default_venue_dispersion")]
    pub venue_dispersion: f64,

    /// Bid/ask spread, as a fraction of mid.
    #[serde(default = "default_spread")]
    pub spread: f64,

    /// Quoted volume per venue.
    #[serde(default = "default_volume")]
    pub volume: Decimal,
}

const fn default_volatility() -> f64 {
    0.001
}

const fn default_venue_dispersion() -> f64 {
    0.004
}

const fn default_spread() -> f64 {
    0.0005
}

fn default_volume() -> Decimal {
    Decimal::from(1000)
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            start_prices: HashMap::new(),
            volatility: default_volatility(),
            venue_dispersion: default_venue_dispersion(),
            spread: default_spread(),
            volume: default_volume(),
        }
    }
}

/// Random-walk quote generator writing into a [`MemorySnapshotStore`].
pub struct SimulatedFeed {
    config: SimulationConfig,
    venues: Vec<VenueId>,
    mids: Vec<(Symbol, f64)>,
    store: Arc<MemorySnapshotStore>,
}

impl SimulatedFeed {
    #[must_use]
    pub fn new(
        config: SimulationConfig,
        venues: Vec<VenueId>,
        symbols: Vec<Symbol>,
        store: Arc<MemorySnapshotStore>,
    ) -> Self {
        let mids = symbols
            .into_iter()
            .map(|symbol| {
                let start = config
                    .start_prices
                    .get(symbol.as_str())
                    .map_or(100.0, |p| to_f64(*p));
                (symbol, start)
            })
            .collect();
        Self {
            config,
            venues,
            mids,
            store,
        }
    }

    /// Advance every walk one step and publish fresh quotes.
    pub fn tick(&mut self) {
        let now = Utc::now();
        let mut rng = rand::thread_rng();
        let vol = self.config.volatility.max(0.0);
        let dispersion = self.config.venue_dispersion.max(0.0);
        let half_spread = self.config.spread.max(0.0) / 2.0;

        for (symbol, mid) in &mut self.mids {
            let step = if vol > 0.0 { rng.gen_range(-vol..=vol) } else { 0.0 };
            *mid = (*mid * (1.0 + step)).max(0.01);

            for venue in &self.venues {
                let skew = if dispersion > 0.0 {
                    rng.gen_range(-dispersion..=dispersion)
                } else {
                    0.0
                };
                let venue_mid = *mid * (1.0 + skew);
                let bid = from_f64(venue_mid * (1.0 - half_spread)).round_dp(8);
                let ask = from_f64(venue_mid * (1.0 + half_spread)).round_dp(8);
                self.store.upsert(
                    MarketSnapshot::new(venue.clone(), symbol.clone())
                        .with_quote(bid, ask)
                        .with_last(from_f64(venue_mid).round_dp(8))
                        .with_volume(self.config.volume)
                        .at(now),
                );
            }
            debug!(symbol = %symbol, mid = *mid, "Simulated tick");
        }
    }
}
