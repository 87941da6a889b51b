//! Infrastructure configuration modules.

pub mod logging;
pub mod market;
pub mod risk;
pub mod runtime;
pub mod scoring;
pub mod settings;

pub use settings::Config;
