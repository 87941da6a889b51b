//! Descriptive statistics over return and spread series.
//!
//! All functions resolve degenerate inputs (empty series, zero variance)
//! to zero instead of producing NaN.

/// Trading days per year used to annualise daily ratios.
pub const TRADING_DAYS: f64 = 252.0;

#[must_use]
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation.
#[must_use]
pub fn std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

/// Percentile `p` in `[0, 100]` with linear interpolation between ranks.
#[must_use]
pub fn percentile(values: &[f64], p: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let rank = (p.clamp(0.0, 100.0) / 100.0) * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let weight = rank - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * weight
}

/// Annualised Sharpe ratio. Zero with fewer than two samples or no variance.
#[must_use]
pub fn sharpe(returns: &[f64]) -> f64 {
    if returns.len() < 2 {
        return 0.0;
    }
    let sd = std_dev(returns);
    if sd == 0.0 {
        return 0.0;
    }
    mean(returns) / sd * TRADING_DAYS.sqrt()
}

/// Annualised Sortino ratio using the deviation of negative returns only.
#[must_use]
pub fn sortino(returns: &[f64]) -> f64 {
    if returns.len() < 2 {
        return 0.0;
    }
    let downside: Vec<f64> = returns.iter().copied().filter(|r| *r < 0.0).collect();
    let sd = std_dev(&downside);
    if sd == 0.0 {
        return 0.0;
    }
    mean(returns) / sd * TRADING_DAYS.sqrt()
}
