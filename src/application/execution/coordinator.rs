//! Paired-leg execution with compensation.
//!
//! Each approved opportunity becomes a buy on the cheap venue and a sell on
//! the rich venue, placed concurrently and awaited together. Anything short
//! of two complete fills is a failure: every leg that filled is unwound
//! with an opposite order, and the fills plus their unwinds are booked to
//! the ledger in one mutation. A failed unwind leaves exposure open and
//! emergency-stops the gate.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use rust_decimal::Decimal;
use serde::Serialize;
use tokio::task::JoinSet;
use tracing::{error, info, warn};

use crate::application::ledger::{LedgerHandle, ReservationId};
use crate::application::risk::RiskGate;
use crate::domain::money::to_f64;
use crate::domain::{BreakerState, Opportunity, OrderSide, RiskEvent, RiskEventKind, Trade};
use crate::error::{DispatchError, ExecutionError};
use crate::port::{
    Event, ExecutionEvent, Fill, NotifierRegistry, OrderGateway, OrderRequest,
};

use super::sizing::KellySizer;
use super::ExecutionConfig;

/// Which side of the pair a leg is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Leg {
    /// The buy on the cheap venue.
    First,
    /// The sell on the rich venue.
    Second,
}

impl Leg {
    const fn prefix(self) -> &'static str {
        match self {
            Self::First => "leg1",
            Self::Second => "leg2",
        }
    }
}

/// Result of placing one leg.
#[derive(Debug, Clone)]
pub enum LegOutcome {
    Filled(Fill),
    Partial(Fill),
    Rejected,
    Error(ExecutionError),
    Timeout,
}

impl LegOutcome {
    fn from_fill(fill: Fill) -> Self {
        if fill.is_complete() {
            Self::Filled(fill)
        } else if fill.has_fill() {
            Self::Partial(fill)
        } else {
            Self::Rejected
        }
    }

    /// Failure cause used in reason codes. `None` for a complete fill.
    #[must_use]
    pub const fn cause(&self) -> Option<&'static str> {
        match self {
            Self::Filled(_) => None,
            Self::Partial(_) => Some("partial"),
            Self::Rejected => Some("rejected"),
            Self::Error(_) => Some("error"),
            Self::Timeout => Some("timeout"),
        }
    }

    /// The fill that happened, complete or not.
    #[must_use]
    pub fn fill(&self) -> Option<&Fill> {
        match self {
            Self::Filled(fill) | Self::Partial(fill) => Some(fill),
            _ => None,
        }
    }
}

/// Outcome of one execution.
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionReport {
    pub opportunity_id: String,
    pub symbol: String,
    pub success: bool,
    pub amount: Decimal,
    pub notional: Decimal,
    pub net_profit: Decimal,
    pub fees: Decimal,
    /// `(expected − net) / max(expected, 1)`, with `expected` the scored
    /// expected profit for the filled quantity.
    pub slippage: f64,
    /// `leg1_timeout`, `leg2_partial`, ... on failure.
    pub failure_reason: Option<String>,
    pub compensated: bool,
    /// True when an unwind failed and exposure was left open.
    pub stranded: bool,
    #[serde(skip)]
    pub trades: Vec<Trade>,
}

impl From<&ExecutionReport> for ExecutionEvent {
    fn from(report: &ExecutionReport) -> Self {
        Self {
            opportunity_id: report.opportunity_id.clone(),
            symbol: report.symbol.clone(),
            success: report.success,
            amount: report.amount,
            net_profit: report.net_profit,
            fees: report.fees,
            slippage: report.slippage,
            failure_reason: report.failure_reason.clone(),
            compensated: report.compensated,
        }
    }
}

/// Running execution statistics.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExecutionStats {
    pub total: u64,
    pub successful: u64,
    pub failed: u64,
    pub compensated: u64,
    pub total_profit: Decimal,
    pub total_fees: Decimal,
}

impl ExecutionStats {
    #[must_use]
    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.successful as f64 / self.total as f64
        }
    }

    fn record(&mut self, report: &ExecutionReport) {
        self.total += 1;
        if report.success {
            self.successful += 1;
            self.total_profit += report.net_profit;
        } else {
            self.failed += 1;
        }
        if report.compensated {
            self.compensated += 1;
        }
        self.total_fees += report.fees;
    }
}

/// Decrements the in-flight counter when an execution ends.
struct InFlightGuard {
    counter: Arc<AtomicUsize>,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.counter.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Everything decided before dispatch.
struct Ticket {
    quantity: Decimal,
    notional: Decimal,
    reservation: ReservationId,
    _guard: InFlightGuard,
}

/// Dispatches approved opportunities to the order gateway.
pub struct ExecutionCoordinator {
    config: ExecutionConfig,
    sizer: KellySizer,
    gateway: Arc<dyn OrderGateway>,
    ledger: LedgerHandle,
    gate: Arc<RiskGate>,
    notifier: Arc<NotifierRegistry>,
    in_flight: Arc<AtomicUsize>,
    stats: Mutex<ExecutionStats>,
    tasks: Mutex<JoinSet<ExecutionReport>>,
}

impl ExecutionCoordinator {
    #[must_use]
    pub fn new(
        config: ExecutionConfig,
        gateway: Arc<dyn OrderGateway>,
        ledger: LedgerHandle,
        gate: Arc<RiskGate>,
        notifier: Arc<NotifierRegistry>,
    ) -> Self {
        let sizer = gate.sizer().clone();
        Self {
            config,
            sizer,
            gateway,
            ledger,
            gate,
            notifier,
            in_flight: Arc::new(AtomicUsize::new(0)),
            stats: Mutex::new(ExecutionStats::default()),
            tasks: Mutex::new(JoinSet::new()),
        }
    }

    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn stats(&self) -> ExecutionStats {
        self.stats.lock().clone()
    }

    /// Run one execution to completion.
    ///
    /// # Errors
    ///
    /// Returns `DispatchError` if a guard refuses the execution before any
    /// order is placed.
    pub async fn execute(&self, opportunity: &Opportunity) -> Result<ExecutionReport, DispatchError> {
        let ticket = self.prepare(opportunity)?;
        Ok(self.dispatch(opportunity, ticket).await)
    }

    /// Start an execution in the background.
    ///
    /// Guards run before this returns; the legs run on the tracked task set
    /// drained by [`ExecutionCoordinator::shutdown`]. The gate state is read
    /// again when the task starts, and a stopped gate places no orders.
    ///
    /// # Errors
    ///
    /// Returns `DispatchError` if a guard refuses the execution.
    pub fn spawn(self: &Arc<Self>, opportunity: Opportunity) -> Result<(), DispatchError> {
        let ticket = self.prepare(&opportunity)?;
        let this = Arc::clone(self);
        let mut tasks = self.tasks.lock();
        tasks.spawn(async move { this.dispatch(&opportunity, ticket).await });
        while tasks.try_join_next().is_some() {}
        Ok(())
    }

    /// Wait for every background execution to finish.
    pub async fn shutdown(&self) -> Vec<ExecutionReport> {
        let mut tasks = std::mem::take(&mut *self.tasks.lock());
        let pending = tasks.len();
        if pending > 0 {
            info!(pending, "Waiting for in-flight executions");
        }

        let mut reports = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(report) => reports.push(report),
                Err(e) => error!(error = %e, "Execution task failed"),
            }
        }
        reports
    }

    fn prepare(&self, opportunity: &Opportunity) -> Result<Ticket, DispatchError> {
        let max = self.config.max_concurrent;
        self.in_flight
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| (n < max).then_some(n + 1))
            .map_err(|in_flight| DispatchError::TooManyInFlight { in_flight, max })?;
        let guard = InFlightGuard {
            counter: Arc::clone(&self.in_flight),
        };

        let notional = self
            .sizer
            .notional(opportunity, Some(self.ledger.total_value()));
        let quantity = self.sizer.quantity(opportunity, notional);
        if quantity <= Decimal::ZERO || notional <= Decimal::ZERO {
            return Err(DispatchError::NonPositiveSize(quantity));
        }
        if notional > self.config.max_trade_notional {
            return Err(DispatchError::TradeTooLarge {
                notional,
                max: self.config.max_trade_notional,
            });
        }

        let state = self.gate.state();
        if !state.allows_trading() {
            return Err(DispatchError::Halted(state));
        }

        let reservation = self.ledger.reserve(opportunity.symbol(), notional)?;
        Ok(Ticket {
            quantity,
            notional,
            reservation,
            _guard: guard,
        })
    }

    async fn dispatch(&self, opportunity: &Opportunity, ticket: Ticket) -> ExecutionReport {
        let state = self.gate.state();
        let report = if state.allows_trading() {
            self.place_pair(opportunity, &ticket).await
        } else {
            self.abandon(opportunity, &ticket, state)
        };

        self.stats.lock().record(&report);
        self.notifier
            .notify_all(Event::TradeExecuted(ExecutionEvent::from(&report)));
        report
    }

    async fn place_pair(&self, opportunity: &Opportunity, ticket: &Ticket) -> ExecutionReport {
        let buy = OrderRequest::market(
            opportunity.symbol().clone(),
            opportunity.buy_venue().clone(),
            OrderSide::Buy,
            ticket.quantity,
        );
        let sell = OrderRequest::market(
            opportunity.symbol().clone(),
            opportunity.sell_venue().clone(),
            OrderSide::Sell,
            ticket.quantity,
        );

        let (first, second) = tokio::join!(self.place_leg(&buy), self.place_leg(&sell));

        match (&first, &second) {
            (LegOutcome::Filled(buy_fill), LegOutcome::Filled(sell_fill)) => {
                self.settle_success(opportunity, ticket, buy_fill, sell_fill)
            }
            _ => self.unwind(opportunity, ticket, &first, &second).await,
        }
    }

    /// Drop a queued execution whose gate stopped trading before dispatch.
    fn abandon(&self, opportunity: &Opportunity, ticket: &Ticket, state: BreakerState) -> ExecutionReport {
        if let Err(e) = self.ledger.release(ticket.reservation) {
            warn!(error = %e, "Reservation already released");
        }
        warn!(
            opportunity_id = %opportunity.id(),
            symbol = %opportunity.symbol(),
            state = %state,
            "Gate stopped trading before dispatch, no orders placed"
        );

        ExecutionReport {
            opportunity_id: opportunity.id().to_string(),
            symbol: opportunity.symbol().to_string(),
            success: false,
            amount: ticket.quantity,
            notional: ticket.notional,
            net_profit: Decimal::ZERO,
            fees: Decimal::ZERO,
            slippage: 0.0,
            failure_reason: Some("halted".to_string()),
            compensated: false,
            stranded: false,
            trades: Vec::new(),
        }
    }

    async fn place_leg(&self, request: &OrderRequest) -> LegOutcome {
        let timeout = Duration::from_millis(self.config.leg_timeout_ms);
        match tokio::time::timeout(timeout, self.gateway.place(request)).await {
            Err(_) => LegOutcome::Timeout,
            Ok(Err(ExecutionError::OrderRejected(reason))) => {
                warn!(venue = %request.venue, reason = %reason, "Order rejected");
                LegOutcome::Rejected
            }
            Ok(Err(e)) => {
                warn!(venue = %request.venue, error = %e, "Order failed");
                LegOutcome::Error(e)
            }
            Ok(Ok(fill)) => LegOutcome::from_fill(fill),
        }
    }

    fn settle_success(
        &self,
        opportunity: &Opportunity,
        ticket: &Ticket,
        buy: &Fill,
        sell: &Fill,
    ) -> ExecutionReport {
        let fees = buy.fees + sell.fees;
        let net = sell.notional() - buy.notional() - fees;
        let expected = opportunity.expected_profit() * ticket.quantity;
        let slippage = to_f64((expected - net) / expected.max(Decimal::ONE));

        let (released, trades) =
            self.ledger
                .settle_pair(ticket.reservation, buy, sell, Some(opportunity.id()));
        if let Err(e) = released {
            warn!(error = %e, "Reservation already released");
        }
        self.gate.record_execution();

        info!(
            opportunity_id = %opportunity.id(),
            symbol = %opportunity.symbol(),
            amount = %ticket.quantity,
            net = %net,
            slippage,
            "Execution succeeded"
        );

        ExecutionReport {
            opportunity_id: opportunity.id().to_string(),
            symbol: opportunity.symbol().to_string(),
            success: true,
            amount: ticket.quantity,
            notional: ticket.notional,
            net_profit: net,
            fees,
            slippage,
            failure_reason: None,
            compensated: false,
            stranded: false,
            trades,
        }
    }

    async fn unwind(
        &self,
        opportunity: &Opportunity,
        ticket: &Ticket,
        first: &LegOutcome,
        second: &LegOutcome,
    ) -> ExecutionReport {
        let reason = [(Leg::First, first), (Leg::Second, second)]
            .iter()
            .find_map(|(leg, outcome)| {
                outcome
                    .cause()
                    .map(|cause| format!("{}_{}", leg.prefix(), cause))
            })
            .unwrap_or_else(|| "unknown".to_string());

        warn!(
            opportunity_id = %opportunity.id(),
            symbol = %opportunity.symbol(),
            reason = %reason,
            "Execution failed, unwinding filled legs"
        );

        let mut fills = Vec::new();
        let mut compensated = false;
        let mut stranded = Vec::new();

        for fill in [first.fill(), second.fill()].into_iter().flatten() {
            fills.push(fill.clone());
            let unwind = OrderRequest::market(
                fill.symbol.clone(),
                fill.venue.clone(),
                fill.side.opposite(),
                fill.filled_amount,
            );
            match self.place_leg(&unwind).await {
                LegOutcome::Filled(undo) => {
                    compensated = true;
                    fills.push(undo);
                }
                LegOutcome::Partial(undo) => {
                    compensated = true;
                    stranded.push(format!(
                        "{} {} on {} partially unwound",
                        fill.side, fill.filled_amount - undo.filled_amount, fill.venue
                    ));
                    fills.push(undo);
                }
                other => {
                    stranded.push(format!(
                        "{} {} on {} not unwound ({})",
                        fill.side,
                        fill.filled_amount,
                        fill.venue,
                        other.cause().unwrap_or("unknown")
                    ));
                }
            }
        }

        let (released, trades) =
            self.ledger
                .settle(ticket.reservation, &fills, Some(opportunity.id()));
        if let Err(e) = released {
            warn!(error = %e, "Reservation already released");
        }

        let fees: Decimal = fills.iter().map(|f| f.fees).sum();
        let net: Decimal = trades.iter().map(|t| t.realized_pnl).sum::<Decimal>()
            - trades
                .iter()
                .filter(|t| !t.is_close())
                .map(|t| t.fees)
                .sum::<Decimal>();
        let value = self.ledger.total_value();

        if compensated {
            self.gate.raise(RiskEvent::new(
                RiskEventKind::LegCompensated,
                format!("{reason}: filled legs unwound for {}", opportunity.symbol()),
                value,
            ));
        }
        if !stranded.is_empty() {
            let detail = stranded.join("; ");
            error!(
                opportunity_id = %opportunity.id(),
                detail = %detail,
                "Compensation failed, exposure left open"
            );
            self.gate.raise(RiskEvent::new(
                RiskEventKind::CompensationFailed,
                detail.clone(),
                value,
            ));
            self.gate
                .emergency_stop(format!("compensation failed: {detail}"), value);
        }

        ExecutionReport {
            opportunity_id: opportunity.id().to_string(),
            symbol: opportunity.symbol().to_string(),
            success: false,
            amount: ticket.quantity,
            notional: ticket.notional,
            net_profit: net,
            fees,
            slippage: 0.0,
            failure_reason: Some(reason),
            compensated,
            stranded: !stranded.is_empty(),
            trades,
        }
    }
}
