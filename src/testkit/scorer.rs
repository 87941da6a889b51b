//! Scorers with fixed behavior.

use crate::domain::Opportunity;
use crate::error::ScoreError;
use crate::port::{Score, Scorer};

/// Returns the same confidence for every candidate.
pub struct FixedScorer {
    confidence: f64,
}

impl FixedScorer {
    pub fn new(confidence: f64) -> Self {
        Self { confidence }
    }
}

impl Scorer for FixedScorer {
    fn name(&self) -> &'static str {
        "fixed"
    }

    fn score(&self, opportunity: &Opportunity) -> Result<Score, ScoreError> {
        Ok(Score {
            confidence: self.confidence,
            expected_profit: opportunity.net_profit(),
        })
    }
}

/// Fails every call.
pub struct FailingScorer;

impl Scorer for FailingScorer {
    fn name(&self) -> &'static str {
        "failing"
    }

    fn score(&self, _opportunity: &Opportunity) -> Result<Score, ScoreError> {
        Err(ScoreError::Unavailable("model offline".into()))
    }
}
