//! Runtime loop configuration.

use serde::Deserialize;

/// Cycle cadence and bounds.
#[derive(Debug, Clone, Deserialize)]
pub struct RuntimeConfig {
    /// Delay between trading cycles.
    #[serde(default = "default_cycle_interval_ms")]
    pub cycle_interval_ms: u64,

    /// Emit a portfolio snapshot every this many cycles (0 disables).
    #[serde(default = "default_snapshot_every")]
    pub snapshot_every: u64,

    /// Stop after this many cycles. Runs until interrupted when unset.
    #[serde(default)]
    pub max_cycles: Option<u64>,
}

const fn default_cycle_interval_ms() -> u64 {
    1_000
}

const fn default_snapshot_every() -> u64 {
    50
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            cycle_interval_ms: default_cycle_interval_ms(),
            snapshot_every: default_snapshot_every(),
            max_cycles: None,
        }
    }
}
