//! Notifier port for event notifications.
//!
//! This module defines the trait for sending notifications about
//! system events such as detected opportunities, executions, and risk
//! events. Every event is a fixed-field record that serializes to JSON.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::domain::{BreakerState, Opportunity, RiskEvent, StrategyKind};
use crate::error::RejectReason;

/// Events that can trigger notifications.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Event {
    /// A scored candidate reached the risk gate.
    OpportunityDetected(OpportunityEvent),
    /// The risk gate turned a candidate away.
    OpportunityRejected(RejectionEvent),
    /// An execution finished (success or failure).
    TradeExecuted(ExecutionEvent),
    /// Breaker transition, compensation or daily reset.
    RiskEventRaised(RiskEvent),
    /// Periodic portfolio summary.
    PortfolioSnapshotted(PortfolioSummary),
}

impl Event {
    /// Stable event name, matching the serialized tag.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::OpportunityDetected(_) => "opportunity_detected",
            Self::OpportunityRejected(_) => "opportunity_rejected",
            Self::TradeExecuted(_) => "trade_executed",
            Self::RiskEventRaised(_) => "risk_event_raised",
            Self::PortfolioSnapshotted(_) => "portfolio_snapshotted",
        }
    }
}

/// Opportunity detection event.
#[derive(Debug, Clone, Serialize)]
pub struct OpportunityEvent {
    pub opportunity_id: String,
    pub symbol: String,
    pub buy_venue: String,
    pub sell_venue: String,
    pub strategy: StrategyKind,
    pub buy_price: Decimal,
    pub sell_price: Decimal,
    pub net_profit: Decimal,
    pub profit_pct: Decimal,
    pub confidence: f64,
}

impl From<&Opportunity> for OpportunityEvent {
    fn from(opp: &Opportunity) -> Self {
        Self {
            opportunity_id: opp.id().to_string(),
            symbol: opp.symbol().to_string(),
            buy_venue: opp.buy_venue().to_string(),
            sell_venue: opp.sell_venue().to_string(),
            strategy: opp.strategy(),
            buy_price: opp.buy_price(),
            sell_price: opp.sell_price(),
            net_profit: opp.net_profit(),
            profit_pct: opp.profit_pct(),
            confidence: opp.confidence(),
        }
    }
}

/// Risk gate rejection event.
#[derive(Debug, Clone, Serialize)]
pub struct RejectionEvent {
    pub opportunity_id: String,
    pub symbol: String,
    /// Stable reason code, e.g. `daily_loss_exceeded`.
    pub code: &'static str,
    pub reason: String,
}

impl RejectionEvent {
    #[must_use]
    pub fn new(opp: &Opportunity, reason: &RejectReason) -> Self {
        Self {
            opportunity_id: opp.id().to_string(),
            symbol: opp.symbol().to_string(),
            code: reason.code(),
            reason: reason.to_string(),
        }
    }
}

/// Execution outcome event.
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionEvent {
    pub opportunity_id: String,
    pub symbol: String,
    pub success: bool,
    pub amount: Decimal,
    pub net_profit: Decimal,
    pub fees: Decimal,
    pub slippage: f64,
    /// `leg1_timeout`, `leg2_rejected`, ... on failure.
    pub failure_reason: Option<String>,
    pub compensated: bool,
}

/// Portfolio summary event.
#[derive(Debug, Clone, Serialize)]
pub struct PortfolioSummary {
    pub timestamp: DateTime<Utc>,
    pub total_value: Decimal,
    pub available_balance: Decimal,
    pub daily_pnl: Decimal,
    pub realized_pnl: Decimal,
    pub unrealized_pnl: Decimal,
    pub max_drawdown: f64,
    pub open_positions: usize,
    pub breaker_state: BreakerState,
}

/// Trait for notification handlers.
///
/// Implement this trait to receive events from the system.
///
/// # Implementation Notes
///
/// - Implementations must be thread-safe (`Send + Sync`)
/// - The `notify` method should not block or perform slow I/O synchronously
pub trait Notifier: Send + Sync {
    /// Handle an event.
    fn notify(&self, event: Event);
}

/// Registry of notifiers (composite pattern).
///
/// Broadcasts events to all registered notifiers.
pub struct NotifierRegistry {
    notifiers: Vec<Box<dyn Notifier>>,
}

impl NotifierRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self { notifiers: vec![] }
    }

    /// Register a notifier.
    pub fn register(&mut self, notifier: Box<dyn Notifier>) {
        self.notifiers.push(notifier);
    }

    /// Notify all registered notifiers.
    pub fn notify_all(&self, event: Event) {
        for notifier in &self.notifiers {
            notifier.notify(event.clone());
        }
    }

    /// Number of registered notifiers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.notifiers.len()
    }

    /// Check if registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.notifiers.is_empty()
    }
}

impl Default for NotifierRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// A no-op notifier for testing or when notifications are disabled.
pub struct NullNotifier;

impl Notifier for NullNotifier {
    fn notify(&self, _event: Event) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RiskEventKind;
    use parking_lot::Mutex;
    use std::sync::Arc;

    struct Counting(Arc<Mutex<Vec<&'static str>>>);

    impl Notifier for Counting {
        fn notify(&self, event: Event) {
            self.0.lock().push(event.name());
        }
    }

    fn risk_event() -> Event {
        Event::RiskEventRaised(RiskEvent::new(
            RiskEventKind::DailyReset,
            "new day",
            Decimal::ONE_THOUSAND,
        ))
    }

    #[test]
    fn registry_broadcasts_to_all() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut registry = NotifierRegistry::new();
        registry.register(Box::new(Counting(seen.clone())));
        registry.register(Box::new(Counting(seen.clone())));
        registry.register(Box::new(NullNotifier));

        registry.notify_all(risk_event());

        assert_eq!(registry.len(), 3);
        assert_eq!(*seen.lock(), vec!["risk_event_raised", "risk_event_raised"]);
    }

    #[test]
    fn events_serialize_with_tag() {
        let json = serde_json::to_value(risk_event()).unwrap();
        assert_eq!(json["event"], "risk_event_raised");
        assert_eq!(json["kind"], "daily_reset");
    }
}
