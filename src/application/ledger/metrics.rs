//! Performance and risk metrics derived from ledger state.

use rust_decimal::Decimal;
use serde::Serialize;

use crate::domain::money::to_f64;
use crate::domain::{stats, Trade};

use super::Ledger;

/// Minimum daily returns before a historical VaR is reported.
pub const MIN_VAR_OBSERVATIONS: usize = 20;

/// Point-in-time portfolio metrics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PortfolioMetrics {
    pub total_value: Decimal,
    pub initial_value: Decimal,
    /// `total_value / initial_value - 1`.
    pub total_return: f64,
    pub daily_pnl: Decimal,
    pub realized_pnl: Decimal,
    pub unrealized_pnl: Decimal,
    pub available_balance: Decimal,
    /// Share of closing trades with positive realized PnL.
    pub win_rate: f64,
    /// Gross profit over gross loss of closing trades.
    pub profit_factor: f64,
    pub total_trades: usize,
    pub closed_trades: usize,
    pub open_positions: usize,
    pub max_drawdown: f64,
    pub current_drawdown: f64,
    pub sharpe_ratio: f64,
    pub sortino_ratio: f64,
    /// 5th percentile of daily returns (zero below 20 observations).
    pub var_95: f64,
    pub calmar_ratio: f64,
}

/// Win rate and profit factor over closing trades.
///
/// Profit factor is `+∞` whenever gross loss is zero, including when there
/// are no closing trades.
#[must_use]
pub fn trade_stats(trades: &[Trade]) -> (f64, f64) {
    let closes: Vec<&Trade> = trades.iter().filter(|t| t.is_close()).collect();
    if closes.is_empty() {
        return (0.0, f64::INFINITY);
    }

    let wins = closes.iter().filter(|t| t.realized_pnl > Decimal::ZERO).count();
    let gross_profit: Decimal = closes
        .iter()
        .filter(|t| t.realized_pnl > Decimal::ZERO)
        .map(|t| t.realized_pnl)
        .sum();
    let gross_loss: Decimal = closes
        .iter()
        .filter(|t| t.realized_pnl < Decimal::ZERO)
        .map(|t| -t.realized_pnl)
        .sum();

    let win_rate = wins as f64 / closes.len() as f64;
    let profit_factor = if gross_loss.is_zero() {
        f64::INFINITY
    } else {
        to_f64(gross_profit / gross_loss)
    };
    (win_rate, profit_factor)
}

/// Historical 95% VaR of daily returns.
#[must_use]
pub fn var_95(returns: &[f64]) -> f64 {
    if returns.len() < MIN_VAR_OBSERVATIONS {
        return 0.0;
    }
    stats::percentile(returns, 5.0)
}

pub(super) fn compute(ledger: &Ledger) -> PortfolioMetrics {
    let returns = ledger.daily_returns();
    let (win_rate, profit_factor) = trade_stats(ledger.trades());

    let total_return = if ledger.initial_value().is_zero() {
        0.0
    } else {
        to_f64(ledger.total_value() / ledger.initial_value()) - 1.0
    };
    let max_drawdown = ledger.max_drawdown();
    let calmar_ratio = if max_drawdown > 0.0 {
        total_return / max_drawdown
    } else {
        0.0
    };

    PortfolioMetrics {
        total_value: ledger.total_value(),
        initial_value: ledger.initial_value(),
        total_return,
        daily_pnl: ledger.daily_pnl(),
        realized_pnl: ledger.realized_pnl(),
        unrealized_pnl: ledger.unrealized_pnl(),
        available_balance: ledger.available_balance(),
        win_rate,
        profit_factor,
        total_trades: ledger.trades().len(),
        closed_trades: ledger.trades().iter().filter(|t| t.is_close()).count(),
        open_positions: ledger.positions().count(),
        max_drawdown,
        current_drawdown: ledger.current_drawdown(),
        sharpe_ratio: stats::sharpe(returns),
        sortino_ratio: stats::sortino(returns),
        var_95: var_95(returns),
        calmar_ratio,
    }
}
