//! Capped Kelly position sizing.
//!
//! `f = clamp((p·w − (1−p)·l) / w, 0, max_fraction)` with `p` the
//! opportunity confidence, `w` its gross margin and `l` an assumed loss on
//! failure. The gate and the coordinator share one sizer so the notional
//! that was approved is the notional that gets dispatched.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::Deserialize;

use crate::domain::money::{from_f64, to_f64};
use crate::domain::Opportunity;

/// Configuration for position sizing.
#[derive(Debug, Clone, Deserialize)]
pub struct SizingConfig {
    /// Upper bound on the Kelly fraction.
    #[serde(default = "default_max_fraction")]
    pub max_fraction: f64,

    /// Loss fraction assumed when a trade fails.
    #[serde(default = "default_assumed_loss")]
    pub assumed_loss: f64,

    /// Notional used when the portfolio value is unknown or the margin is
    /// not positive.
    #[serde(default = "default_base_notional")]
    pub base_notional: Decimal,
}

const fn default_max_fraction() -> f64 {
    0.05
}

const fn default_assumed_loss() -> f64 {
    0.01
}

fn default_base_notional() -> Decimal {
    Decimal::ONE_HUNDRED
}

impl Default for SizingConfig {
    fn default() -> Self {
        Self {
            max_fraction: default_max_fraction(),
            assumed_loss: default_assumed_loss(),
            base_notional: default_base_notional(),
        }
    }
}

/// Kelly sizer.
#[derive(Debug, Clone)]
pub struct KellySizer {
    config: SizingConfig,
}

impl KellySizer {
    #[must_use]
    pub const fn new(config: SizingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SizingConfig {
        &self.config
    }

    /// Kelly fraction for `opportunity`, or `None` if its margin is not
    /// positive.
    #[must_use]
    pub fn fraction(&self, opportunity: &Opportunity) -> Option<f64> {
        let p = opportunity.confidence();
        let w = to_f64(opportunity.profit_pct()) / 100.0;
        if w <= 0.0 {
            return None;
        }
        let l = self.config.assumed_loss;
        let f = (p * w - (1.0 - p) * l) / w;
        Some(f.clamp(0.0, self.config.max_fraction.max(0.0)))
    }

    /// Quote notional to commit, truncated to 8 places so it never exceeds
    /// `total_value × fraction`.
    ///
    /// Falls back to `base_notional` when `total_value` is unknown or the
    /// margin is not positive.
    #[must_use]
    pub fn notional(&self, opportunity: &Opportunity, total_value: Option<Decimal>) -> Decimal {
        match (total_value, self.fraction(opportunity)) {
            (Some(value), Some(f)) if value > Decimal::ZERO => {
                (value * from_f64(f)).round_dp_with_strategy(8, RoundingStrategy::ToZero)
            }
            _ => self.config.base_notional,
        }
    }

    /// Base-asset quantity for `notional` at the opportunity's buy price.
    #[must_use]
    pub fn quantity(&self, opportunity: &Opportunity, notional: Decimal) -> Decimal {
        if opportunity.buy_price() <= Decimal::ZERO {
            return Decimal::ZERO;
        }
        (notional / opportunity.buy_price()).round_dp_with_strategy(8, RoundingStrategy::ToZero)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::StrategyKind;
    use rust_decimal_macros::dec;

    fn opportunity(sell: Decimal, confidence: f64) -> Opportunity {
        Opportunity::builder()
            .symbol("BTC/USDT")
            .buy("a", dec!(100))
            .sell("b", sell)
            .estimated_fees(dec!(0.2))
            .confidence(confidence)
            .strategy(StrategyKind::Direct)
            .build()
            .unwrap()
    }

    #[test]
    fn fraction_is_capped() {
        let sizer = KellySizer::new(SizingConfig::default());
        // w = 0.005, p = 0.8: (0.004 - 0.002) / 0.005 = 0.4 -> capped to 0.05
        let f = sizer.fraction(&opportunity(dec!(100.5), 0.8)).unwrap();
        assert!((f - 0.05).abs() < 1e-12);
    }

    #[test]
    fn fraction_floors_at_zero() {
        let sizer = KellySizer::new(SizingConfig::default());
        // w = 0.005, p = 0.5: (0.0025 - 0.005) / 0.005 < 0
        assert_eq!(sizer.fraction(&opportunity(dec!(100.5), 0.5)), Some(0.0));
    }

    #[test]
    fn uncapped_fraction() {
        let sizer = KellySizer::new(SizingConfig {
            max_fraction: 1.0,
            ..SizingConfig::default()
        });
        let f = sizer.fraction(&opportunity(dec!(100.5), 0.8)).unwrap();
        assert!((f - 0.4).abs() < 1e-9);
    }

    #[test]
    fn notional_scales_with_value() {
        let sizer = KellySizer::new(SizingConfig::default());
        let opp = opportunity(dec!(100.5), 0.8);

        assert_eq!(sizer.notional(&opp, Some(dec!(10000))), dec!(500));
        assert_eq!(sizer.quantity(&opp, dec!(500)), dec!(5));
    }

    #[test]
    fn sizes_truncate_toward_zero() {
        let sizer = KellySizer::new(SizingConfig::default());
        let opp = opportunity(dec!(100.5), 0.8);
        let total = dec!(9997.995125372985);

        let notional = sizer.notional(&opp, Some(total));
        assert_eq!(notional, dec!(499.89975626));
        assert!(notional <= total * dec!(0.05));

        assert_eq!(sizer.quantity(&opp, dec!(66.666666666)), dec!(0.66666666));
    }

    #[test]
    fn notional_falls_back_to_base() {
        let sizer = KellySizer::new(SizingConfig::default());
        let opp = opportunity(dec!(100.5), 0.8);
        assert_eq!(sizer.notional(&opp, None), dec!(100));

        let flat = opportunity(dec!(100), 0.8);
        assert_eq!(sizer.notional(&flat, Some(dec!(10000))), dec!(100));
    }
}
