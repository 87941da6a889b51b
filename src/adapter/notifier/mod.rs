//! Notification adapters.
//!
//! Implements the `port::Notifier` trait for the log and JSON-lines sinks.

mod jsonl;

pub use jsonl::JsonlNotifier;

use tracing::{info, warn};

use crate::port::{Event, Notifier};

/// A logging notifier that logs events via tracing.
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, event: Event) {
        match event {
            Event::OpportunityDetected(e) => {
                info!(
                    opportunity_id = %e.opportunity_id,
                    symbol = %e.symbol,
                    buy_venue = %e.buy_venue,
                    sell_venue = %e.sell_venue,
                    strategy = %e.strategy,
                    net = %e.net_profit,
                    confidence = e.confidence,
                    "Opportunity detected"
                );
            }
            Event::OpportunityRejected(e) => {
                info!(
                    opportunity_id = %e.opportunity_id,
                    symbol = %e.symbol,
                    code = e.code,
                    reason = %e.reason,
                    "Opportunity rejected"
                );
            }
            Event::TradeExecuted(e) => {
                info!(
                    opportunity_id = %e.opportunity_id,
                    symbol = %e.symbol,
                    success = e.success,
                    amount = %e.amount,
                    net = %e.net_profit,
                    fees = %e.fees,
                    failure = e.failure_reason.as_deref().unwrap_or("-"),
                    compensated = e.compensated,
                    "Trade executed"
                );
            }
            Event::RiskEventRaised(e) => {
                warn!(
                    kind = %e.kind,
                    reason = %e.reason,
                    value = %e.portfolio_value,
                    "Risk event"
                );
            }
            Event::PortfolioSnapshotted(e) => {
                info!(
                    value = %e.total_value,
                    available = %e.available_balance,
                    daily_pnl = %e.daily_pnl,
                    realized = %e.realized_pnl,
                    unrealized = %e.unrealized_pnl,
                    drawdown = e.max_drawdown,
                    positions = e.open_positions,
                    breaker = %e.breaker_state,
                    "Portfolio snapshot"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{RiskEvent, RiskEventKind};
    use rust_decimal_macros::dec;

    #[test]
    fn log_notifier_handles_every_event() {
        LogNotifier.notify(Event::RiskEventRaised(RiskEvent::new(
            RiskEventKind::DailyReset,
            "reset",
            dec!(10000),
        )));
    }
}
