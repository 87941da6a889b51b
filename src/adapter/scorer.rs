//! Heuristic signal scorer.
//!
//! Weighted sum of normalized features mapped to a confidence with
//! `(score + 1) / 2`. Expected profit is `net × confidence`.

use rust_decimal::Decimal;
use serde::Deserialize;

use crate::domain::money::{from_f64, to_f64};
use crate::domain::Opportunity;
use crate::error::ScoreError;
use crate::port::{Score, Scorer};

/// Feature weights for [`HeuristicScorer`].
#[derive(Debug, Clone, Deserialize)]
pub struct HeuristicConfig {
    /// Weight of the gross margin feature.
    #[serde(default = "default_profit_weight")]
    pub profit_weight: f64,

    /// Weight of the detector's own confidence.
    #[serde(default = "default_confidence_weight")]
    pub confidence_weight: f64,

    /// Weight of the liquidity feature.
    #[serde(default = "default_liquidity_weight")]
    pub liquidity_weight: f64,

    /// Gross margin in percent that saturates the margin feature.
    #[serde(default = "default_profit_pct_scale")]
    pub profit_pct_scale: f64,

    /// Available volume that saturates the liquidity feature.
    #[serde(default = "default_volume_scale")]
    pub volume_scale: f64,
}

const fn default_profit_weight() -> f64 {
    0.4
}

const fn default_confidence_weight() -> f64 {
    0.4
}

const fn default_liquidity_weight() -> f64 {
    0.2
}

const fn default_profit_pct_scale() -> f64 {
    1.0
}

const fn default_volume_scale() -> f64 {
    1000.0
}

impl Default for HeuristicConfig {
    fn default() -> Self {
        Self {
            profit_weight: default_profit_weight(),
            confidence_weight: default_confidence_weight(),
            liquidity_weight: default_liquidity_weight(),
            profit_pct_scale: default_profit_pct_scale(),
            volume_scale: default_volume_scale(),
        }
    }
}

/// Scorer built from fixed feature weights.
#[derive(Debug, Clone, Default)]
pub struct HeuristicScorer {
    config: HeuristicConfig,
}

impl HeuristicScorer {
    #[must_use]
    pub const fn new(config: HeuristicConfig) -> Self {
        Self { config }
    }

    fn margin_feature(&self, opportunity: &Opportunity) -> f64 {
        let scale = self.config.profit_pct_scale;
        if scale <= 0.0 {
            return 0.0;
        }
        (to_f64(opportunity.profit_pct()) / scale).clamp(0.0, 1.0)
    }

    fn liquidity_feature(&self, opportunity: &Opportunity) -> f64 {
        let volume = to_f64(opportunity.volume_available()).max(0.0);
        let saturation = self.config.volume_scale.max(0.0).ln_1p();
        if saturation <= 0.0 {
            return 0.0;
        }
        (volume.ln_1p() / saturation).clamp(0.0, 1.0)
    }
}

impl Scorer for HeuristicScorer {
    fn name(&self) -> &'static str {
        "heuristic"
    }

    fn score(&self, opportunity: &Opportunity) -> Result<Score, ScoreError> {
        if opportunity.net_profit() <= Decimal::ZERO {
            return Err(ScoreError::InvalidFeatures(format!(
                "non-positive net profit {}",
                opportunity.net_profit()
            )));
        }

        let raw = self.config.profit_weight * self.margin_feature(opportunity)
            + self.config.confidence_weight * opportunity.confidence()
            + self.config.liquidity_weight * self.liquidity_feature(opportunity);
        if !raw.is_finite() {
            return Err(ScoreError::InvalidFeatures("non-finite score".into()));
        }

        let confidence = ((raw + 1.0) / 2.0).clamp(0.0, 1.0);
        Ok(Score {
            confidence,
            expected_profit: opportunity.net_profit() * from_f64(confidence),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::StrategyKind;
    use rust_decimal_macros::dec;

    fn example(volume: Decimal) -> Opportunity {
        Opportunity::builder()
            .symbol("BTC/USDT")
            .buy("a", dec!(100.5))
            .sell("b", dec!(101.0))
            .estimated_fees(dec!(0.2015))
            .confidence(0.8)
            .volume_available(volume)
            .strategy(StrategyKind::Direct)
            .build()
            .unwrap()
    }

    #[test]
    fn liquid_example_scores_high() {
        let score = HeuristicScorer::default().score(&example(dec!(1000))).unwrap();

        // 0.4 * 0.4975 + 0.4 * 0.8 + 0.2 * 1.0 = 0.719
        assert!((score.confidence - 0.8595).abs() < 1e-3);
        assert!(score.expected_profit > dec!(0.25) && score.expected_profit < dec!(0.26));
    }

    #[test]
    fn no_volume_lowers_confidence() {
        let scorer = HeuristicScorer::default();
        let thin = scorer.score(&example(Decimal::ZERO)).unwrap();
        let deep = scorer.score(&example(dec!(1000))).unwrap();

        assert!(thin.confidence < deep.confidence);
        assert!((thin.confidence - 0.7595).abs() < 1e-3);
    }

    #[test]
    fn unprofitable_candidate_is_invalid() {
        let opp = Opportunity::builder()
            .symbol("BTC/USDT")
            .buy("a", dec!(100))
            .sell("b", dec!(100.1))
            .estimated_fees(dec!(0.2))
            .strategy(StrategyKind::Direct)
            .build()
            .unwrap();

        assert!(matches!(
            HeuristicScorer::default().score(&opp),
            Err(ScoreError::InvalidFeatures(_))
        ));
    }
}
