//! Risk vocabulary shared by the gate, the coordinator and notifiers.

use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

/// Circuit breaker state of the risk gate.
///
/// Ordered by severity. Automatic transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BreakerState {
    #[default]
    Normal,
    Halted,
    EmergencyStopped,
}

impl BreakerState {
    /// Returns true if new trades may start.
    #[must_use]
    pub const fn allows_trading(&self) -> bool {
        matches!(self, Self::Normal)
    }
}

impl fmt::Display for BreakerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Normal => write!(f, "normal"),
            Self::Halted => write!(f, "halted"),
            Self::EmergencyStopped => write!(f, "emergency_stopped"),
        }
    }
}

/// How a limit threshold is expressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LimitKind {
    /// Threshold in quote currency.
    Absolute,
    /// Threshold as a fraction of a base amount.
    Percentage,
}

/// What the gate does when a limit is breached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BreachAction {
    Halt,
    ReducePosition,
    Alert,
}

/// One row of the risk limit report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskLimit {
    pub name: &'static str,
    pub kind: LimitKind,
    pub threshold: Decimal,
    pub current_value: Decimal,
    pub breach_action: BreachAction,
}

impl RiskLimit {
    /// `current_value / threshold`, zero for a zero threshold.
    pub fn utilisation(&self) -> Decimal {
        if self.threshold.is_zero() {
            Decimal::ZERO
        } else {
            self.current_value.abs() / self.threshold
        }
    }

    /// Returns true once the current value reaches the threshold.
    pub fn is_breached(&self) -> bool {
        !self.threshold.is_zero() && self.current_value.abs() >= self.threshold
    }
}

/// Category of a risk event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskEventKind {
    /// Daily loss breach seen while gating a candidate.
    DailyLossBreached,
    /// Portfolio-level circuit breaker moved the gate to `Halted`.
    CircuitBreakerTriggered,
    /// Drawdown or an explicit request moved the gate to `EmergencyStopped`.
    EmergencyStop,
    /// Operator resumed trading.
    Resumed,
    /// UTC-day rollover reset the daily counters.
    DailyReset,
    /// A failed execution was unwound with compensating orders.
    LegCompensated,
    /// A compensating order failed and exposure was left open.
    CompensationFailed,
}

impl fmt::Display for RiskEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::DailyLossBreached => "daily_loss_breached",
            Self::CircuitBreakerTriggered => "circuit_breaker_triggered",
            Self::EmergencyStop => "emergency_stop",
            Self::Resumed => "resumed",
            Self::DailyReset => "daily_reset",
            Self::LegCompensated => "leg_compensated",
            Self::CompensationFailed => "compensation_failed",
        };
        f.write_str(name)
    }
}

/// Something the risk layer wants operators to know about.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskEvent {
    pub kind: RiskEventKind,
    pub reason: String,
    pub timestamp: DateTime<Utc>,
    pub portfolio_value: Decimal,
}

impl RiskEvent {
    pub fn new(kind: RiskEventKind, reason: impl Into<String>, portfolio_value: Decimal) -> Self {
        Self {
            kind,
            reason: reason.into(),
            timestamp: Utc::now(),
            portfolio_value,
        }
    }
}
