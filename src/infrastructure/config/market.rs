//! Market universe configuration.

use serde::Deserialize;

use crate::adapter::market::SimulationConfig;
use crate::domain::{Symbol, VenueId};

/// Venues and symbols traded, and snapshot freshness.
#[derive(Debug, Clone, Deserialize)]
pub struct MarketConfig {
    #[serde(default = "default_venues")]
    pub venues: Vec<String>,

    #[serde(default = "default_symbols")]
    pub symbols: Vec<String>,

    /// Snapshots older than this are ignored.
    #[serde(default = "default_max_snapshot_age_secs")]
    pub max_snapshot_age_secs: u64,

    /// Random-walk feed used in paper mode.
    #[serde(default)]
    pub simulation: SimulationConfig,
}

fn default_venues() -> Vec<String> {
    vec!["binance".into(), "coinbase".into(), "kraken".into()]
}

fn default_symbols() -> Vec<String> {
    vec!["BTC/USDT".into(), "ETH/USDT".into()]
}

const fn default_max_snapshot_age_secs() -> u64 {
    10
}

impl MarketConfig {
    #[must_use]
    pub fn venue_ids(&self) -> Vec<VenueId> {
        self.venues.iter().map(|v| VenueId::from(v.as_str())).collect()
    }

    #[must_use]
    pub fn symbol_ids(&self) -> Vec<Symbol> {
        self.symbols.iter().map(|s| Symbol::from(s.as_str())).collect()
    }
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            venues: default_venues(),
            symbols: default_symbols(),
            max_snapshot_age_secs: default_max_snapshot_age_secs(),
            simulation: SimulationConfig::default(),
        }
    }
}
