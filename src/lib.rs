//! Arbitron - cross-venue spread arbitrage detection and execution.
//!
//! The core pipeline is **detection → scoring → risk gate → execution →
//! ledger**, laid out hexagonally:
//!
//! - [`domain`] - Venue-agnostic types: snapshots, opportunities, positions,
//!   trades, breaker state
//! - [`port`] - Traits at the edges: strategies, snapshot store, scorer,
//!   order gateway, notifiers
//! - [`application`] - Detector, risk gate, execution coordinator, portfolio
//!   ledger and the trading cycle that drives them
//! - [`adapter`] - Paper gateway, in-memory market data, heuristic scorer,
//!   log and JSON-lines sinks
//! - [`infrastructure`] - Configuration, wiring and the runtime loop
//! - [`cli`] - `arbitron run` and `arbitron check config`
//! - [`error`] - Error types for the crate
//!
//! # Example
//!
//! ```no_run
//! use arbitron::application::detector::{Detector, DetectorConfig};
//! use arbitron::domain::time::seconds;
//!
//! let detector = Detector::new(DetectorConfig::default(), seconds(10));
//! assert_eq!(detector.strategies().len(), 2);
//! ```

pub mod adapter;
pub mod application;
pub mod cli;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod port;

#[cfg(any(test, feature = "testkit"))]
pub mod testkit;
