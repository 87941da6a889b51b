//! Risk gate service.
//!
//! Validates scored opportunities before execution and owns the circuit
//! breaker. Breaker transitions are monotonic: automatic triggers only move
//! towards `EmergencyStopped`; only [`RiskGate::resume`] returns to `Normal`,
//! and the daily reset lifts `Halted` (never `EmergencyStopped`).

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use parking_lot::RwLock;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{info, warn};

use crate::application::execution::sizing::KellySizer;
use crate::application::ledger::{PortfolioMetrics, PortfolioSnapshot};
use crate::domain::money::from_f64;
use crate::domain::time::utc_day;
use crate::domain::{
    BreachAction, BreakerState, LimitKind, Opportunity, RiskEvent, RiskEventKind, RiskLimit,
};
use crate::error::RejectReason;
use crate::port::{Event, NotifierRegistry};

use super::measures;
use super::score::RiskScorer;
use super::RiskLimits;

/// Outcome of [`RiskGate::evaluate`].
#[derive(Debug, Clone, PartialEq)]
pub enum RiskDecision {
    Accept,
    Reject(RejectReason),
}

impl RiskDecision {
    #[must_use]
    pub const fn is_accepted(&self) -> bool {
        matches!(self, Self::Accept)
    }
}

/// Risk report for operators.
#[derive(Debug, Clone, Serialize)]
pub struct RiskReport {
    pub breaker_state: BreakerState,
    pub halt_reason: Option<String>,
    pub daily_trade_count: u32,
    pub limits: Vec<RiskLimit>,
    pub value_at_risk: Decimal,
    pub expected_shortfall: Decimal,
    pub var_confidence: f64,
}

#[derive(Debug)]
struct GateState {
    breaker: BreakerState,
    halt_reason: Option<String>,
    daily_trade_count: u32,
    day: NaiveDate,
}

/// Pre-trade risk gate.
pub struct RiskGate {
    limits: RiskLimits,
    sizer: KellySizer,
    scorer: RiskScorer,
    notifier: Arc<NotifierRegistry>,
    state: RwLock<GateState>,
}

impl RiskGate {
    #[must_use]
    pub fn new(limits: RiskLimits, sizer: KellySizer, notifier: Arc<NotifierRegistry>) -> Self {
        let scorer = RiskScorer::new(limits.venue_risk.clone(), limits.market_risk);
        Self {
            limits,
            sizer,
            scorer,
            notifier,
            state: RwLock::new(GateState {
                breaker: BreakerState::Normal,
                halt_reason: None,
                daily_trade_count: 0,
                day: utc_day(Utc::now()),
            }),
        }
    }

    pub fn limits(&self) -> &RiskLimits {
        &self.limits
    }

    pub fn sizer(&self) -> &KellySizer {
        &self.sizer
    }

    /// Current breaker state.
    #[must_use]
    pub fn state(&self) -> BreakerState {
        self.state.read().breaker
    }

    #[must_use]
    pub fn daily_trade_count(&self) -> u32 {
        self.state.read().daily_trade_count
    }

    /// Validate a scored opportunity against all limits.
    ///
    /// Checks run in order: breaker state, daily loss (a breach also halts
    /// the gate), daily trade count, position size, symbol exposure and
    /// composite risk score. The first failing check decides.
    pub fn evaluate(&self, opportunity: &Opportunity, portfolio: &PortfolioSnapshot) -> RiskDecision {
        match self.check(opportunity, portfolio) {
            Ok(()) => RiskDecision::Accept,
            Err(reason) => {
                warn!(
                    opportunity_id = %opportunity.id(),
                    symbol = %opportunity.symbol(),
                    reason = %reason,
                    "Opportunity rejected by risk gate"
                );
                RiskDecision::Reject(reason)
            }
        }
    }

    fn check(&self, opportunity: &Opportunity, portfolio: &PortfolioSnapshot) -> Result<(), RejectReason> {
        let state = self.state();
        if !state.allows_trading() {
            return Err(RejectReason::TradingHalted { state });
        }

        let daily_pnl = portfolio.daily_pnl();
        if daily_pnl.abs() >= self.limits.max_daily_loss {
            self.escalate(
                BreakerState::Halted,
                RiskEventKind::DailyLossBreached,
                format!("daily pnl {daily_pnl} breached limit {}", self.limits.max_daily_loss),
                portfolio.total_value(),
            );
            return Err(RejectReason::DailyLossExceeded {
                daily_pnl,
                limit: self.limits.max_daily_loss,
            });
        }

        let count = self.daily_trade_count();
        if count >= self.limits.max_daily_trades {
            return Err(RejectReason::DailyTradeLimitExceeded {
                count,
                limit: self.limits.max_daily_trades,
            });
        }

        let total_value = portfolio.total_value();
        let notional = self.sizer.notional(opportunity, Some(total_value));
        let position_limit = (portfolio.available_balance() * self.limits.max_position_size)
            .min(total_value * self.limits.max_position_risk);
        if notional > position_limit {
            return Err(RejectReason::PositionLimitExceeded {
                notional,
                limit: position_limit,
            });
        }

        let current = portfolio.symbol_exposure(opportunity.symbol());
        let exposure_limit = total_value * self.limits.max_symbol_exposure;
        if current + notional > exposure_limit {
            return Err(RejectReason::ExposureLimitExceeded {
                symbol: opportunity.symbol().to_string(),
                current,
                additional: notional,
                limit: exposure_limit,
            });
        }

        let score = self.scorer.score(opportunity).total();
        if score > self.limits.risk_score_threshold {
            return Err(RejectReason::RiskScoreTooHigh {
                score,
                threshold: self.limits.risk_score_threshold,
            });
        }

        Ok(())
    }

    /// Portfolio-level breaker check, run once per cycle.
    ///
    /// Drawdown at or above the limit emergency-stops; a daily loss at or
    /// above the breaker level halts. Returns the resulting state.
    pub fn check_circuit_breakers(&self, metrics: &PortfolioMetrics) -> BreakerState {
        if metrics.max_drawdown >= self.limits.max_drawdown {
            self.escalate(
                BreakerState::EmergencyStopped,
                RiskEventKind::EmergencyStop,
                format!(
                    "max drawdown {:.4} reached limit {:.4}",
                    metrics.max_drawdown, self.limits.max_drawdown
                ),
                metrics.total_value,
            );
        } else if metrics.daily_pnl.abs() >= self.limits.circuit_breaker_loss {
            self.escalate(
                BreakerState::Halted,
                RiskEventKind::CircuitBreakerTriggered,
                format!(
                    "daily pnl {} reached breaker level {}",
                    metrics.daily_pnl, self.limits.circuit_breaker_loss
                ),
                metrics.total_value,
            );
        }
        self.state()
    }

    /// Stop all trading until an explicit [`RiskGate::resume`].
    pub fn emergency_stop(&self, reason: impl Into<String>, portfolio_value: Decimal) {
        self.escalate(
            BreakerState::EmergencyStopped,
            RiskEventKind::EmergencyStop,
            reason.into(),
            portfolio_value,
        );
    }

    /// Manually return the gate to `Normal`.
    pub fn resume(&self, portfolio_value: Decimal) {
        let previous = {
            let mut state = self.state.write();
            let previous = state.breaker;
            state.breaker = BreakerState::Normal;
            state.halt_reason = None;
            previous
        };
        info!(previous = %previous, "Trading resumed");
        self.raise(RiskEvent::new(
            RiskEventKind::Resumed,
            format!("resumed from {previous}"),
            portfolio_value,
        ));
    }

    /// Reset daily counters on a UTC-day rollover.
    ///
    /// Lifts `Halted` back to `Normal`; `EmergencyStopped` is left alone.
    /// Returns false if `now` is not on a later day than the last reset.
    pub fn reset_daily(&self, now: DateTime<Utc>, portfolio_value: Decimal) -> bool {
        let today = utc_day(now);
        let lifted = {
            let mut state = self.state.write();
            if today <= state.day {
                return false;
            }
            state.day = today;
            state.daily_trade_count = 0;
            if state.breaker == BreakerState::Halted {
                state.breaker = BreakerState::Normal;
                state.halt_reason = None;
                true
            } else {
                false
            }
        };
        info!(day = %today, lifted_halt = lifted, "Daily risk counters reset");
        self.raise(RiskEvent::new(
            RiskEventKind::DailyReset,
            format!("daily reset for {today}"),
            portfolio_value,
        ));
        true
    }

    /// Count an execution against the daily trade limit.
    pub fn record_execution(&self) {
        self.state.write().daily_trade_count += 1;
    }

    /// Publish a risk event raised elsewhere (e.g. by the coordinator).
    pub fn raise(&self, event: RiskEvent) {
        self.notifier.notify_all(Event::RiskEventRaised(event));
    }

    /// Limit utilisation rows.
    #[must_use]
    pub fn risk_limits(&self, portfolio: &PortfolioSnapshot) -> Vec<RiskLimit> {
        let metrics = &portfolio.metrics;
        let largest_exposure = portfolio
            .positions
            .iter()
            .map(|p| portfolio.symbol_exposure(&p.symbol))
            .chain(portfolio.reservations_by_symbol.values().copied())
            .max()
            .unwrap_or(Decimal::ZERO);
        let exposure_share = if metrics.total_value > Decimal::ZERO {
            largest_exposure / metrics.total_value
        } else {
            Decimal::ZERO
        };

        vec![
            RiskLimit {
                name: "daily_loss",
                kind: LimitKind::Absolute,
                threshold: self.limits.max_daily_loss,
                current_value: metrics.daily_pnl.abs(),
                breach_action: BreachAction::Halt,
            },
            RiskLimit {
                name: "daily_trades",
                kind: LimitKind::Absolute,
                threshold: Decimal::from(self.limits.max_daily_trades),
                current_value: Decimal::from(self.daily_trade_count()),
                breach_action: BreachAction::Alert,
            },
            RiskLimit {
                name: "symbol_exposure",
                kind: LimitKind::Percentage,
                threshold: self.limits.max_symbol_exposure,
                current_value: exposure_share,
                breach_action: BreachAction::ReducePosition,
            },
            RiskLimit {
                name: "max_drawdown",
                kind: LimitKind::Percentage,
                threshold: from_f64(self.limits.max_drawdown),
                current_value: from_f64(metrics.max_drawdown),
                breach_action: BreachAction::Halt,
            },
            RiskLimit {
                name: "circuit_breaker",
                kind: LimitKind::Absolute,
                threshold: self.limits.circuit_breaker_loss,
                current_value: metrics.daily_pnl.abs(),
                breach_action: BreachAction::Halt,
            },
        ]
    }

    /// VaR at the configured confidence, in quote currency.
    #[must_use]
    pub fn value_at_risk(&self, portfolio: &PortfolioSnapshot) -> Decimal {
        measures::value_at_risk(
            &portfolio.daily_returns,
            self.limits.var_confidence,
            portfolio.total_value(),
        )
    }

    /// Expected shortfall at the configured confidence, in quote currency.
    #[must_use]
    pub fn expected_shortfall(&self, portfolio: &PortfolioSnapshot) -> Decimal {
        measures::expected_shortfall(
            &portfolio.daily_returns,
            self.limits.var_confidence,
            portfolio.total_value(),
        )
    }

    /// Full risk report.
    #[must_use]
    pub fn status(&self, portfolio: &PortfolioSnapshot) -> RiskReport {
        let (breaker_state, halt_reason, daily_trade_count) = {
            let state = self.state.read();
            (state.breaker, state.halt_reason.clone(), state.daily_trade_count)
        };
        RiskReport {
            breaker_state,
            halt_reason,
            daily_trade_count,
            limits: self.risk_limits(portfolio),
            value_at_risk: self.value_at_risk(portfolio),
            expected_shortfall: self.expected_shortfall(portfolio),
            var_confidence: self.limits.var_confidence,
        }
    }

    /// Move the breaker forward to `target`. No-op if already at or past it.
    fn escalate(&self, target: BreakerState, kind: RiskEventKind, reason: String, value: Decimal) {
        {
            let mut state = self.state.write();
            if state.breaker >= target {
                return;
            }
            state.breaker = target;
            state.halt_reason = Some(reason.clone());
        }
        warn!(state = %target, kind = %kind, reason = %reason, "Circuit breaker tripped");
        self.raise(RiskEvent::new(kind, reason, value));
    }
}
