//! Historical-simulation VaR and expected shortfall.

use rust_decimal::Decimal;

use crate::application::ledger::metrics::MIN_VAR_OBSERVATIONS;
use crate::domain::money::from_f64;
use crate::domain::stats;

/// Loss fraction of portfolio value assumed for VaR with too little history.
pub const FALLBACK_VAR_FRACTION: f64 = 0.05;

/// Loss fraction assumed for expected shortfall with too little history.
pub const FALLBACK_ES_FRACTION: f64 = 0.07;

/// The `(1 - confidence)` percentile of `returns`, or `None` with fewer than
/// the minimum observations.
#[must_use]
pub fn var_return(returns: &[f64], confidence: f64) -> Option<f64> {
    if returns.len() < MIN_VAR_OBSERVATIONS {
        return None;
    }
    Some(stats::percentile(returns, (1.0 - confidence) * 100.0))
}

/// Mean of the returns at or below the VaR percentile.
#[must_use]
pub fn expected_shortfall_return(returns: &[f64], confidence: f64) -> Option<f64> {
    let cutoff = var_return(returns, confidence)?;
    let tail: Vec<f64> = returns.iter().copied().filter(|r| *r <= cutoff).collect();
    if tail.is_empty() {
        return Some(cutoff);
    }
    Some(stats::mean(&tail))
}

fn loss_amount(ret: f64, value: Decimal) -> Decimal {
    (value * from_f64(-ret)).max(Decimal::ZERO)
}

/// Value at risk in quote currency (a positive loss amount).
#[must_use]
pub fn value_at_risk(returns: &[f64], confidence: f64, value: Decimal) -> Decimal {
    match var_return(returns, confidence) {
        Some(ret) => loss_amount(ret, value),
        None => value * from_f64(FALLBACK_VAR_FRACTION),
    }
}

/// Expected shortfall in quote currency (a positive loss amount).
#[must_use]
pub fn expected_shortfall(returns: &[f64], confidence: f64, value: Decimal) -> Decimal {
    match expected_shortfall_return(returns, confidence) {
        Some(ret) => loss_amount(ret, value),
        None => value * from_f64(FALLBACK_ES_FRACTION),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn returns() -> Vec<f64> {
        let mut r = vec![-0.04, -0.02];
        r.extend((0..18).map(|i| 0.001 * f64::from(i)));
        r
    }

    #[test]
    fn var_percentile_of_twenty_returns() {
        let var = var_return(&returns(), 0.95).unwrap();
        assert!((var - -0.021).abs() < 1e-9);
        assert_eq!(value_at_risk(&returns(), 0.95, dec!(10000)).round_dp(6), dec!(210));
    }

    #[test]
    fn short_history_uses_fallbacks() {
        let short = vec![-0.01; 5];
        assert_eq!(var_return(&short, 0.95), None);
        assert_eq!(value_at_risk(&short, 0.95, dec!(10000)), dec!(500));
        assert_eq!(expected_shortfall(&short, 0.95, dec!(10000)), dec!(700));
    }

    #[test]
    fn shortfall_averages_the_tail() {
        // Only -0.04 sits at or below -0.021.
        let es = expected_shortfall_return(&returns(), 0.95).unwrap();
        assert!((es - -0.04).abs() < 1e-12);
        assert_eq!(expected_shortfall(&returns(), 0.95, dec!(1000)).round_dp(6), dec!(40));
    }

    #[test]
    fn gains_only_history_has_no_loss() {
        let gains: Vec<f64> = (1..=25).map(|i| 0.001 * f64::from(i)).collect();
        assert_eq!(value_at_risk(&gains, 0.95, dec!(10000)), Decimal::ZERO);
    }
}
