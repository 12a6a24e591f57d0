//! Individual - one modeled student
//!
//! The allocation strategies own `grant`; the feedback loop owns `income`
//! and `score`. A strategy never writes income or score.

use serde::{Deserialize, Serialize};

use crate::{MAX_SCORE, MIN_SCORE};

/// A single modeled student
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Individual {
    /// Personal yearly income for the period (>= 0)
    pub income: f64,

    /// Grant assigned by the active strategy this period (>= 0)
    pub grant: f64,

    /// Academic score in [0, 10], when known
    pub score: Option<f64>,
}

impl Individual {
    /// Create an individual with no score and no grant
    pub fn new(income: f64) -> Self {
        Self {
            income: income.max(0.0),
            grant: 0.0,
            score: None,
        }
    }

    /// Create an individual with a score, clipped to the valid range
    pub fn with_score(income: f64, score: f64) -> Self {
        Self {
            score: Some(clip_score(score)),
            ..Self::new(income)
        }
    }

    /// Income after the grant is paid
    #[inline]
    pub fn total(&self) -> f64 {
        self.income + self.grant
    }

    /// Whether the post-grant income reaches `threshold`
    #[inline]
    pub fn reaches(&self, threshold: f64) -> bool {
        self.total() >= threshold
    }
}

/// Clip a score into [MIN_SCORE, MAX_SCORE]
#[inline]
pub fn clip_score(score: f64) -> f64 {
    score.clamp(MIN_SCORE, MAX_SCORE)
}
