//! Implementations of ports (hexagonal adapters).

pub mod market;
pub mod notifier;
pub mod paper;
pub mod scorer;
