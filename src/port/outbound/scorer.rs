//! Signal scorer port.
//!
//! The scorer is opaque: it takes a detected opportunity and returns a
//! confidence and an expected profit. Model internals live behind this trait.

use rust_decimal::Decimal;
use serde::Serialize;

use crate::domain::Opportunity;
use crate::error::ScoreError;

/// Result of scoring one opportunity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Score {
    /// Confidence in `[0, 1]`.
    pub confidence: f64,
    /// Expected per-unit profit.
    pub expected_profit: Decimal,
}

/// Assigns a confidence and expected profit to candidates.
pub trait Scorer: Send + Sync {
    /// Scorer name for logging.
    fn name(&self) -> &'static str;

    /// Score a candidate.
    ///
    /// # Errors
    ///
    /// Returns `ScoreError` if the scorer cannot produce a score; the
    /// candidate is then dropped for this cycle.
    fn score(&self, opportunity: &Opportunity) -> Result<Score, ScoreError>;
}
