use rust_decimal::Decimal;
use thiserror::Error;

use crate::domain::risk::BreakerState;

/// Configuration-related errors with structured variants.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required field: {field}")]
    MissingField { field: &'static str },

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("failed to read config file: {0}")]
    ReadFile(#[source] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[source] toml::de::Error),
}

/// Order gateway errors with structured variants.
#[derive(Error, Debug, Clone)]
pub enum ExecutionError {
    #[error("unknown venue '{0}'")]
    UnknownVenue(String),

    #[error("order rejected: {0}")]
    OrderRejected(String),

    #[error("failed to submit order: {0}")]
    SubmissionFailed(String),

    #[error("invalid order amount {0}")]
    InvalidAmount(Decimal),
}

/// Reasons the execution coordinator refuses to start an execution.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DispatchError {
    #[error("too many executions in flight: {in_flight} >= {max}")]
    TooManyInFlight { in_flight: usize, max: usize },

    #[error("trade too large: {notional} > {max}")]
    TradeTooLarge { notional: Decimal, max: Decimal },

    #[error("trading halted: breaker is {0}")]
    Halted(BreakerState),

    #[error("non-positive trade size {0}")]
    NonPositiveSize(Decimal),

    #[error("reservation failed: {0}")]
    Reservation(#[from] LedgerError),
}

/// Ledger bookkeeping errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("no {side} position for {symbol} on {venue}")]
    PositionNotFound {
        symbol: String,
        venue: String,
        side: String,
    },

    #[error("insufficient balance: requested {requested}, available {available}")]
    InsufficientBalance {
        requested: Decimal,
        available: Decimal,
    },

    #[error("amount must be positive, got {0}")]
    NonPositiveAmount(Decimal),

    #[error("unknown reservation {0}")]
    UnknownReservation(u64),
}

/// Scoring failures reported by a [`crate::port::outbound::scorer::Scorer`].
#[derive(Error, Debug, Clone)]
pub enum ScoreError {
    #[error("scorer unavailable: {0}")]
    Unavailable(String),

    #[error("invalid features: {0}")]
    InvalidFeatures(String),
}

/// Reason a candidate was turned away by the risk gate.
///
/// Rejections are always surfaced (logged and notified), never dropped.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RejectReason {
    #[error("trading halted: breaker is {state}")]
    TradingHalted { state: BreakerState },

    #[error("daily loss limit exceeded: |{daily_pnl}| >= {limit}")]
    DailyLossExceeded { daily_pnl: Decimal, limit: Decimal },

    #[error("daily trade limit reached: {count} >= {limit}")]
    DailyTradeLimitExceeded { count: u32, limit: u32 },

    #[error("position limit exceeded: {notional} > {limit}")]
    PositionLimitExceeded { notional: Decimal, limit: Decimal },

    #[error("exposure limit exceeded for {symbol}: {current} + {additional} > {limit}")]
    ExposureLimitExceeded {
        symbol: String,
        current: Decimal,
        additional: Decimal,
        limit: Decimal,
    },

    #[error("risk score too high: {score:.3} > {threshold:.3}")]
    RiskScoreTooHigh { score: f64, threshold: f64 },
}

impl RejectReason {
    /// Stable reason code used in events and logs.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::TradingHalted { .. } => "trading_halted",
            Self::DailyLossExceeded { .. } => "daily_loss_exceeded",
            Self::DailyTradeLimitExceeded { .. } => "daily_trade_limit_exceeded",
            Self::PositionLimitExceeded { .. } => "position_limit_exceeded",
            Self::ExposureLimitExceeded { .. } => "exposure_limit_exceeded",
            Self::RiskScoreTooHigh { .. } => "risk_score_too_high",
        }
    }
}

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Execution(#[from] ExecutionError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    #[error(transparent)]
    Score(#[from] ScoreError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("market data error: {0}")]
    MarketData(String),
}

pub type Result<T> = std::result::Result<T, Error>;
