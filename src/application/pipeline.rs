//! One trading cycle: snapshot, detect, score, gate, dispatch.
//!
//! Detection, scoring and gating run on the caller's task over data already
//! fetched. Approved candidates are handed to the coordinator's background
//! set; the cycle never awaits them.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::application::detector::Detector;
use crate::application::execution::ExecutionCoordinator;
use crate::application::ledger::LedgerHandle;
use crate::application::risk::{RiskDecision, RiskGate};
use crate::domain::{BreakerState, Opportunity};
use crate::error::Result;
use crate::port::{
    Event, NotifierRegistry, OpportunityEvent, PortfolioSummary, RejectionEvent, Scorer,
    SnapshotStore,
};

/// Configuration for the trading cycle.
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    /// Scored candidates below this confidence never reach the gate.
    #[serde(default = "default_min_confidence")]
    pub min_confidence: f64,

    /// Emit a portfolio summary every this many cycles (0 disables).
    #[serde(default = "default_snapshot_every")]
    pub snapshot_every: u64,

    /// Detect, score and gate, but never dispatch.
    #[serde(default)]
    pub dry_run: bool,
}

const fn default_min_confidence() -> f64 {
    0.7
}

const fn default_snapshot_every() -> u64 {
    50
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            min_confidence: default_min_confidence(),
            snapshot_every: default_snapshot_every(),
            dry_run: false,
        }
    }
}

/// Counters for one cycle.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CycleReport {
    pub cycle: u64,
    pub breaker_state: BreakerState,
    /// True when the breaker suppressed the whole cycle.
    pub skipped: bool,
    pub snapshots: usize,
    pub detected: usize,
    pub scored: usize,
    pub approved: usize,
    pub rejected: usize,
    pub dispatched: usize,
    pub refused: usize,
}

/// Scheduling path from snapshots to dispatched executions.
pub struct TradingCycle {
    config: PipelineConfig,
    store: Arc<dyn SnapshotStore>,
    detector: Detector,
    scorer: Arc<dyn Scorer>,
    gate: Arc<RiskGate>,
    ledger: LedgerHandle,
    coordinator: Arc<ExecutionCoordinator>,
    notifier: Arc<NotifierRegistry>,
    max_snapshot_age: Duration,
    cycles: u64,
}

impl TradingCycle {
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: PipelineConfig,
        store: Arc<dyn SnapshotStore>,
        detector: Detector,
        scorer: Arc<dyn Scorer>,
        gate: Arc<RiskGate>,
        ledger: LedgerHandle,
        coordinator: Arc<ExecutionCoordinator>,
        notifier: Arc<NotifierRegistry>,
        max_snapshot_age: Duration,
    ) -> Self {
        Self {
            config,
            store,
            detector,
            scorer,
            gate,
            ledger,
            coordinator,
            notifier,
            max_snapshot_age,
            cycles: 0,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn detector(&self) -> &Detector {
        &self.detector
    }

    pub fn gate(&self) -> &Arc<RiskGate> {
        &self.gate
    }

    pub fn ledger(&self) -> &LedgerHandle {
        &self.ledger
    }

    pub fn coordinator(&self) -> &Arc<ExecutionCoordinator> {
        &self.coordinator
    }

    /// Cycles run so far.
    #[must_use]
    pub const fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Run one cycle at `now`.
    ///
    /// # Errors
    ///
    /// Returns an error only if the snapshot store fails; everything after
    /// that degrades per candidate.
    pub async fn run_once(&mut self, now: DateTime<Utc>) -> Result<CycleReport> {
        self.cycles += 1;
        let mut report = CycleReport {
            cycle: self.cycles,
            ..CycleReport::default()
        };

        let snapshots = self.store.latest().await?;
        report.snapshots = snapshots.len();

        self.ledger.mark_prices(&snapshots, now, self.max_snapshot_age);
        if self.ledger.update_value(now) {
            self.gate.reset_daily(now, self.ledger.total_value());
        }

        let metrics = self.ledger.read(|l| l.metrics());
        report.breaker_state = self.gate.check_circuit_breakers(&metrics);
        self.maybe_snapshot(now);

        if report.breaker_state == BreakerState::EmergencyStopped {
            warn!(cycle = report.cycle, "Emergency stop active, cycle skipped");
            report.skipped = true;
            return Ok(report);
        }

        let candidates = self.detector.detect(&snapshots, now);
        report.detected = candidates.len();

        for opportunity in candidates {
            let Some(scored) = self.score(opportunity) else {
                continue;
            };
            report.scored += 1;

            self.notifier
                .notify_all(Event::OpportunityDetected(OpportunityEvent::from(&scored)));

            match self.gate.evaluate(&scored, &self.ledger.snapshot()) {
                RiskDecision::Reject(reason) => {
                    report.rejected += 1;
                    self.notifier.notify_all(Event::OpportunityRejected(
                        RejectionEvent::new(&scored, &reason),
                    ));
                }
                RiskDecision::Accept => {
                    report.approved += 1;
                    self.dispatch(scored, &mut report);
                }
            }
        }

        debug!(
            cycle = report.cycle,
            detected = report.detected,
            approved = report.approved,
            rejected = report.rejected,
            dispatched = report.dispatched,
            "Cycle complete"
        );
        Ok(report)
    }

    fn score(&self, opportunity: Opportunity) -> Option<Opportunity> {
        match self.scorer.score(&opportunity) {
            Ok(score) if score.confidence >= self.config.min_confidence => Some(
                opportunity
                    .with_confidence(score.confidence)
                    .with_expected_profit(score.expected_profit),
            ),
            Ok(score) => {
                debug!(
                    opportunity_id = %opportunity.id(),
                    confidence = score.confidence,
                    "Below minimum confidence"
                );
                None
            }
            Err(e) => {
                warn!(
                    scorer = self.scorer.name(),
                    opportunity_id = %opportunity.id(),
                    error = %e,
                    "Scoring failed, candidate dropped"
                );
                None
            }
        }
    }

    fn dispatch(&self, opportunity: Opportunity, report: &mut CycleReport) {
        if self.config.dry_run {
            info!(
                opportunity_id = %opportunity.id(),
                symbol = %opportunity.symbol(),
                net = %opportunity.net_profit(),
                "Dry run, execution skipped"
            );
            return;
        }

        let id = opportunity.id().clone();
        match self.coordinator.spawn(opportunity) {
            Ok(()) => report.dispatched += 1,
            Err(e) => {
                report.refused += 1;
                warn!(opportunity_id = %id, error = %e, "Execution refused");
            }
        }
    }

    fn maybe_snapshot(&self, now: DateTime<Utc>) {
        let every = self.config.snapshot_every;
        if every == 0 || self.cycles % every != 0 {
            return;
        }

        let snapshot = self.ledger.snapshot();
        let metrics = &snapshot.metrics;
        self.notifier
            .notify_all(Event::PortfolioSnapshotted(PortfolioSummary {
                timestamp: now,
                total_value: metrics.total_value,
                available_balance: metrics.available_balance,
                daily_pnl: metrics.daily_pnl,
                realized_pnl: metrics.realized_pnl,
                unrealized_pnl: metrics.unrealized_pnl,
                max_drawdown: metrics.max_drawdown,
                open_positions: metrics.open_positions,
                breaker_state: self.gate.state(),
            }));
    }
}
