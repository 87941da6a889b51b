//! Shared test utilities available to both unit and integration tests.
//!
//! Enabled via `#[cfg(test)]` (unit tests) or the `testkit` feature
//! (integration tests).
//!
//! # Modules
//!
//! - [`gateway`] - [`ScriptedGateway`](gateway::ScriptedGateway), an
//!   [`OrderGateway`](crate::port::OrderGateway) whose per-venue responses
//!   are scripted: fill, partial, reject, error or hang.
//! - [`domain`] - Builders for snapshots and opportunities, including the
//!   two-venue worked example.
//! - [`scorer`] - Fixed and failing scorers.

pub mod domain;
pub mod gateway;
pub mod scorer;
