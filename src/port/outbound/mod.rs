//! Outbound ports (driven side): interfaces implemented by outbound adapters.
//!
//! These contracts describe infrastructure dependencies such as order
//! gateways, market data, scoring and notifications.

pub mod gateway;
pub mod notifier;
pub mod scorer;
pub mod snapshot;
