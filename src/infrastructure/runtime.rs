//! Runtime loop: feed tick, trading cycle, graceful shutdown.

use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::application::execution::ExecutionStats;
use crate::application::ledger::PortfolioMetrics;
use crate::domain::BreakerState;
use crate::error::Result;
use crate::infrastructure::bootstrap::{build_engine, Engine};
use crate::infrastructure::config::settings::Config;

/// What a finished run leaves behind.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub cycles: u64,
    pub breaker_state: BreakerState,
    pub execution: ExecutionStats,
    pub portfolio: PortfolioMetrics,
}

/// Run until Ctrl-C or `max_cycles`.
///
/// # Errors
///
/// Returns an error if the engine cannot be built.
pub async fn run(config: Config) -> Result<RunSummary> {
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Shutdown signal received");
            let _ = shutdown_tx.send(true);
        }
    });
    run_with_shutdown(config, shutdown_rx).await
}

/// Run with an externally controlled shutdown signal.
///
/// # Errors
///
/// Returns an error if the engine cannot be built.
pub async fn run_with_shutdown(
    config: Config,
    shutdown: watch::Receiver<bool>,
) -> Result<RunSummary> {
    info!(
        venues = ?config.market.venues,
        symbols = ?config.market.symbols,
        dry_run = config.dry_run,
        "Starting arbitron"
    );
    let engine = build_engine(&config)?;
    Ok(drive(engine, &config, shutdown).await)
}

async fn drive(mut engine: Engine, config: &Config, mut shutdown: watch::Receiver<bool>) -> RunSummary {
    let mut interval = tokio::time::interval(Duration::from_millis(config.runtime.cycle_interval_ms));
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        if config
            .runtime
            .max_cycles
            .is_some_and(|max| engine.cycle.cycles() >= max)
        {
            info!(cycles = engine.cycle.cycles(), "Cycle limit reached");
            break;
        }

        tokio::select! {
            result = shutdown.changed() => {
                if result.is_err() || *shutdown.borrow() {
                    info!("Stopping trading loop");
                    break;
                }
            }
            _ = interval.tick() => {
                engine.feed.tick();
                if let Err(e) = engine.cycle.run_once(Utc::now()).await {
                    warn!(error = %e, "Cycle failed");
                }
            }
        }
    }

    let pending = engine.coordinator.shutdown().await;
    let execution = engine.coordinator.stats();
    let portfolio = engine.ledger.read(|l| l.metrics());
    info!(
        drained = pending.len(),
        executions = execution.total,
        successful = execution.successful,
        profit = %execution.total_profit,
        value = %portfolio.total_value,
        "Shutdown complete"
    );

    RunSummary {
        cycles: engine.cycle.cycles(),
        breaker_state: engine.gate.state(),
        execution,
        portfolio,
    }
}
