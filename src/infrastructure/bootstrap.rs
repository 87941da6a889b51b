//! Composition root: builds every component from configuration.

use std::sync::Arc;

use tracing::info;

use crate::adapter::market::{MemorySnapshotStore, SimulatedFeed};
use crate::adapter::notifier::{JsonlNotifier, LogNotifier};
use crate::adapter::paper::PaperGateway;
use crate::adapter::scorer::HeuristicScorer;
use crate::application::detector::Detector;
use crate::application::execution::{ExecutionCoordinator, KellySizer};
use crate::application::ledger::{Ledger, LedgerHandle};
use crate::application::pipeline::TradingCycle;
use crate::application::risk::RiskGate;
use crate::error::Result;
use crate::infrastructure::config::settings::Config;
use crate::port::{NotifierRegistry, OrderGateway};

/// Fully wired paper-trading engine.
pub struct Engine {
    pub cycle: TradingCycle,
    pub feed: SimulatedFeed,
    pub store: Arc<MemorySnapshotStore>,
    pub gateway: Arc<PaperGateway>,
    pub ledger: LedgerHandle,
    pub gate: Arc<RiskGate>,
    pub coordinator: Arc<ExecutionCoordinator>,
    pub notifiers: Arc<NotifierRegistry>,
}

/// Build the notifier registry: always the log sink, plus the JSON-lines
/// sink when `events_path` is set.
///
/// # Errors
///
/// Returns an IO error if the events file cannot be opened.
pub fn build_notifier_registry(config: &Config) -> Result<NotifierRegistry> {
    let mut registry = NotifierRegistry::new();
    registry.register(Box::new(LogNotifier));
    if let Some(path) = &config.events_path {
        registry.register(Box::new(JsonlNotifier::open(path)?));
        info!(path = %path.display(), "Event log enabled");
    }
    Ok(registry)
}

/// Build the risk gate with the shared sizer.
#[must_use]
pub fn build_risk_gate(config: &Config, notifiers: Arc<NotifierRegistry>) -> RiskGate {
    RiskGate::new(
        config.risk.clone().into(),
        KellySizer::new(config.execution.sizing.clone()),
        notifiers,
    )
}

/// Wire the paper engine.
///
/// # Errors
///
/// Returns an error if a notifier sink cannot be opened.
pub fn build_engine(config: &Config) -> Result<Engine> {
    let notifiers = Arc::new(build_notifier_registry(config)?);
    info!(notifiers = notifiers.len(), "Notifiers initialized");

    let store = Arc::new(MemorySnapshotStore::new());
    let feed = SimulatedFeed::new(
        config.market.simulation.clone(),
        config.market.venue_ids(),
        config.market.symbol_ids(),
        Arc::clone(&store),
    );
    let gateway = Arc::new(PaperGateway::new(
        config.paper.clone(),
        config.market.venue_ids(),
        Arc::clone(&store),
    ));

    let ledger = LedgerHandle::new(Ledger::new(&config.ledger));
    let gate = Arc::new(build_risk_gate(config, Arc::clone(&notifiers)));
    let coordinator = Arc::new(ExecutionCoordinator::new(
        config.execution.clone(),
        Arc::clone(&gateway) as Arc<dyn OrderGateway>,
        ledger.clone(),
        Arc::clone(&gate),
        Arc::clone(&notifiers),
    ));

    let detector = Detector::new(config.detector.clone(), config.max_snapshot_age());
    info!(
        strategies = ?detector.strategies().strategy_names(),
        venues = config.market.venues.len(),
        symbols = config.market.symbols.len(),
        "Detector initialized"
    );

    let cycle = TradingCycle::new(
        config.pipeline(),
        Arc::clone(&store) as _,
        detector,
        Arc::new(HeuristicScorer::new(config.scoring.heuristic.clone())),
        Arc::clone(&gate),
        ledger.clone(),
        Arc::clone(&coordinator),
        Arc::clone(&notifiers),
        config.max_snapshot_age(),
    );

    Ok(Engine {
        cycle,
        feed,
        store,
        gateway,
        ledger,
        gate,
        coordinator,
        notifiers,
    })
}
