//! Signal scoring configuration.

use serde::Deserialize;

use crate::adapter::scorer::HeuristicConfig;

/// Scoring settings.
#[derive(Debug, Clone, Deserialize)]
pub struct ScoringConfig {
    /// Scored candidates below this confidence are dropped before the gate.
    #[serde(default = "default_min_confidence")]
    pub min_confidence: f64,

    #[serde(default)]
    pub heuristic: HeuristicConfig,
}

const fn default_min_confidence() -> f64 {
    0.7
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            min_confidence: default_min_confidence(),
            heuristic: HeuristicConfig::default(),
        }
    }
}
