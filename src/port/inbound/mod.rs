//! Inbound (driving) ports consumed by the application core.
//!
//! - [`strategy`]: spread detection strategy interface

pub mod strategy;
