//! Integration tests for the execution coordinator.

mod harness;

use std::sync::Arc;
use std::time::Duration;

use arbitron::application::execution::{ExecutionConfig, ExecutionCoordinator, KellySizer};
use arbitron::application::ledger::{Ledger, LedgerConfig, LedgerHandle};
use arbitron::application::risk::{RiskGate, RiskLimits};
use arbitron::domain::{BreakerState, OrderSide, RiskEventKind, VenueId};
use arbitron::error::DispatchError;
use arbitron::port::{NotifierRegistry, OrderGateway};
use arbitron::testkit::domain::worked_opportunity;
use arbitron::testkit::gateway::{Script, ScriptedGateway};
use harness::recording_notifier::RecordingNotifier;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

struct Fixture {
    coordinator: Arc<ExecutionCoordinator>,
    gateway: Arc<ScriptedGateway>,
    ledger: LedgerHandle,
    gate: Arc<RiskGate>,
    events: RecordingNotifier,
}

fn fast_config() -> ExecutionConfig {
    ExecutionConfig {
        leg_timeout_ms: 50,
        ..ExecutionConfig::default()
    }
}

fn fixture(gateway: ScriptedGateway, config: ExecutionConfig) -> Fixture {
    let events = RecordingNotifier::new();
    let mut registry = NotifierRegistry::new();
    registry.register(Box::new(events.clone()));
    let notifiers = Arc::new(registry);

    let gateway = Arc::new(
        gateway
            .with_price("a", dec!(100.5))
            .with_price("b", dec!(101.0)),
    );
    let ledger = LedgerHandle::new(Ledger::new(&LedgerConfig::default()));
    let gate = Arc::new(RiskGate::new(
        RiskLimits::default(),
        KellySizer::new(config.sizing.clone()),
        Arc::clone(&notifiers),
    ));
    let coordinator = Arc::new(ExecutionCoordinator::new(
        config,
        Arc::clone(&gateway) as Arc<dyn OrderGateway>,
        ledger.clone(),
        Arc::clone(&gate),
        notifiers,
    ));

    Fixture {
        coordinator,
        gateway,
        ledger,
        gate,
        events,
    }
}

#[tokio::test]
async fn both_legs_fill_and_book() {
    let fx = fixture(ScriptedGateway::new(), fast_config());

    let report = fx
        .coordinator
        .execute(&worked_opportunity(dec!(1000)))
        .await
        .unwrap();

    assert!(report.success);
    assert_eq!(report.failure_reason, None);
    // 5% Kelly cap of 10000 at 100.5
    assert_eq!(report.notional, dec!(500));
    assert_eq!(report.amount, dec!(4.97512438));
    assert!(report.net_profit > Decimal::ZERO);

    // The hedged legs close against each other and realize the spread.
    let snap = fx.ledger.snapshot();
    assert!(snap.positions.is_empty());
    assert!(snap.reservations_by_symbol.is_empty());
    assert_eq!(report.trades.len(), 3);
    assert!((snap.metrics.realized_pnl - report.net_profit).abs() < dec!(0.000001));
    assert_eq!(snap.total_value(), dec!(10000) + report.net_profit);
    assert_eq!(report.slippage, 0.0);
    assert_eq!(fx.gate.daily_trade_count(), 1);
    assert_eq!(fx.events.count("trade_executed"), 1);

    let stats = fx.coordinator.stats();
    assert_eq!((stats.total, stats.successful), (1, 1));
    assert_eq!(stats.total_profit, report.net_profit);
}

#[tokio::test]
async fn repeated_successes_keep_the_symbol_tradeable() {
    let fx = fixture(ScriptedGateway::new(), fast_config());
    let opp = worked_opportunity(dec!(1000));
    let mut profit = Decimal::ZERO;

    for round in 0..4 {
        let decision = fx.gate.evaluate(&opp, &fx.ledger.snapshot());
        assert!(decision.is_accepted(), "round {round}: {decision:?}");

        let report = fx.coordinator.execute(&opp).await.unwrap();
        assert!(report.success, "round {round}");
        profit += report.net_profit;
    }

    let snap = fx.ledger.snapshot();
    assert!(snap.positions.is_empty());
    assert_eq!(snap.symbol_exposure(opp.symbol()), Decimal::ZERO);
    assert_eq!(snap.metrics.closed_trades, 4);
    assert_eq!(snap.metrics.win_rate, 1.0);
    assert!(snap.metrics.profit_factor.is_infinite());
    assert!((snap.metrics.realized_pnl - profit).abs() < dec!(0.000001));
    assert_eq!(fx.gate.daily_trade_count(), 4);
}

#[tokio::test]
async fn slippage_is_measured_against_scored_profit() {
    let fx = fixture(ScriptedGateway::new(), fast_config());
    let opp = worked_opportunity(dec!(1000)).with_expected_profit(dec!(0.2388));

    let report = fx.coordinator.execute(&opp).await.unwrap();

    // Fills match the quoted spread, beating the confidence-weighted estimate.
    assert!(report.success);
    assert!(report.slippage < -0.2 && report.slippage > -0.3);
}

#[tokio::test]
async fn second_leg_timeout_is_compensated() {
    let fx = fixture(
        ScriptedGateway::new().with_script("b", [Script::Hang]),
        fast_config(),
    );
    let before = fx.ledger.total_value();

    let report = fx
        .coordinator
        .execute(&worked_opportunity(dec!(1000)))
        .await
        .unwrap();

    assert!(!report.success);
    assert_eq!(report.failure_reason.as_deref(), Some("leg2_timeout"));
    assert!(report.compensated);
    assert!(!report.stranded);

    let placed = fx.gateway.placed();
    assert_eq!(placed.len(), 3);
    let unwind = &placed[2];
    assert_eq!(unwind.venue, VenueId::from("a"));
    assert_eq!(unwind.side, OrderSide::Sell);
    assert_eq!(unwind.amount, report.amount);

    // Flat again, poorer by exactly the fees.
    let after = fx.ledger.total_value();
    let snap = fx.ledger.snapshot();
    assert!(snap.positions.is_empty());
    assert!(snap.reservations_by_symbol.is_empty());
    assert_eq!(before - after, report.fees);

    assert_eq!(fx.gate.state(), BreakerState::Normal);
    assert_eq!(fx.gate.daily_trade_count(), 0);
    assert_eq!(fx.events.risk_kinds(), vec![RiskEventKind::LegCompensated]);
}

#[tokio::test]
async fn partial_fill_unwinds_both_legs() {
    let fx = fixture(
        ScriptedGateway::new().with_script("b", [Script::Partial(dec!(0.5))]),
        fast_config(),
    );

    let report = fx
        .coordinator
        .execute(&worked_opportunity(dec!(1000)))
        .await
        .unwrap();

    assert_eq!(report.failure_reason.as_deref(), Some("leg2_partial"));
    assert!(report.compensated);
    assert_eq!(fx.gateway.placed().len(), 4);
    assert!(fx.ledger.snapshot().positions.is_empty());
    assert_eq!(fx.coordinator.stats().compensated, 1);
}

#[tokio::test]
async fn first_leg_failure_is_reported_first() {
    let fx = fixture(
        ScriptedGateway::new()
            .with_script("a", [Script::Reject])
            .with_script("b", [Script::Error]),
        fast_config(),
    );
    let before = fx.ledger.total_value();

    let report = fx
        .coordinator
        .execute(&worked_opportunity(dec!(1000)))
        .await
        .unwrap();

    assert_eq!(report.failure_reason.as_deref(), Some("leg1_rejected"));
    assert!(!report.compensated);
    assert_eq!(fx.gateway.placed().len(), 2);
    assert_eq!(fx.ledger.total_value(), before);
    assert!(fx.ledger.snapshot().reservations_by_symbol.is_empty());
    assert!(fx.events.risk_kinds().is_empty());
}

#[tokio::test]
async fn failed_unwind_emergency_stops() {
    let fx = fixture(
        ScriptedGateway::new()
            .with_script("a", [Script::Fill, Script::Error])
            .with_script("b", [Script::Reject]),
        fast_config(),
    );

    let report = fx
        .coordinator
        .execute(&worked_opportunity(dec!(1000)))
        .await
        .unwrap();

    assert_eq!(report.failure_reason.as_deref(), Some("leg2_rejected"));
    assert!(report.stranded);
    assert!(!report.compensated);
    assert_eq!(fx.gate.state(), BreakerState::EmergencyStopped);

    // The stranded buy stays on the books.
    let snap = fx.ledger.snapshot();
    assert_eq!(snap.positions.len(), 1);
    assert_eq!(snap.positions[0].venue, VenueId::from("a"));

    let kinds = fx.events.risk_kinds();
    assert!(kinds.contains(&RiskEventKind::CompensationFailed));
    assert!(kinds.contains(&RiskEventKind::EmergencyStop));

    let refused = fx.coordinator.execute(&worked_opportunity(dec!(1000))).await;
    assert!(matches!(
        refused,
        Err(DispatchError::Halted(BreakerState::EmergencyStopped))
    ));
}

#[tokio::test]
async fn oversized_trade_is_refused_before_dispatch() {
    let fx = fixture(
        ScriptedGateway::new(),
        ExecutionConfig {
            max_trade_notional: dec!(100),
            ..fast_config()
        },
    );

    let result = fx.coordinator.execute(&worked_opportunity(dec!(1000))).await;

    assert_eq!(
        result.unwrap_err(),
        DispatchError::TradeTooLarge {
            notional: dec!(500),
            max: dec!(100),
        }
    );
    assert!(fx.gateway.placed().is_empty());
    assert_eq!(fx.coordinator.in_flight(), 0);
}

#[tokio::test]
async fn concurrency_limit_and_shutdown_drain() {
    let fx = fixture(
        ScriptedGateway::new().with_script("a", [Script::Delay(Duration::from_millis(30))]),
        ExecutionConfig {
            max_concurrent: 1,
            leg_timeout_ms: 1_000,
            ..ExecutionConfig::default()
        },
    );

    fx.coordinator
        .spawn(worked_opportunity(dec!(1000)))
        .unwrap();
    assert_eq!(fx.coordinator.in_flight(), 1);

    let second = fx.coordinator.spawn(worked_opportunity(dec!(1000)));
    assert_eq!(
        second.unwrap_err(),
        DispatchError::TooManyInFlight {
            in_flight: 1,
            max: 1,
        }
    );

    let drained = fx.coordinator.shutdown().await;
    assert_eq!(drained.len(), 1);
    assert!(drained[0].success);
    assert_eq!(fx.coordinator.in_flight(), 0);
}

#[tokio::test]
async fn queued_execution_stops_with_the_gate() {
    let fx = fixture(ScriptedGateway::new(), fast_config());

    fx.coordinator
        .spawn(worked_opportunity(dec!(1000)))
        .unwrap();
    fx.gate.emergency_stop("manual", fx.ledger.total_value());

    let drained = fx.coordinator.shutdown().await;

    assert_eq!(drained.len(), 1);
    assert!(!drained[0].success);
    assert_eq!(drained[0].failure_reason.as_deref(), Some("halted"));
    assert!(fx.gateway.placed().is_empty());
    assert!(fx.ledger.snapshot().reservations_by_symbol.is_empty());
    assert_eq!(fx.ledger.total_value(), dec!(10000));
    assert_eq!(fx.coordinator.in_flight(), 0);
    assert_eq!(fx.coordinator.stats().failed, 1);
    assert_eq!(fx.gate.daily_trade_count(), 0);
}
