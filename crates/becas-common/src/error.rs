//! Error types for the Becas simulator
//!
//! Provides a unified error type and domain-specific error variants

use thiserror::Error;

/// Result type alias using BecasError
pub type Result<T> = std::result::Result<T, BecasError>;

/// Unified error type for Becas operations
#[derive(Debug, Error)]
pub enum BecasError {
    // Allocation errors
    #[error("Allocation error: {0}")]
    Allocation(#[from] AllocationError),

    // Statistics errors
    #[error("Statistics error: {0}")]
    Stats(#[from] StatsError),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    // Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    // Report output errors
    #[error("Output error: {0}")]
    Output(String),

    // Generic internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl BecasError {
    /// Whether the error is a broken conservation invariant (a logic defect)
    pub fn is_fatal_defect(&self) -> bool {
        matches!(self, BecasError::Allocation(err) if err.is_conservation_defect())
    }
}

/// Allocation strategy errors
#[derive(Debug, Error, Clone, PartialEq)]
pub enum AllocationError {
    #[error("{strategy}: granted {distributed} but budget is {budget} (delta {delta})")]
    ConservationViolated {
        strategy: &'static str,
        budget: f64,
        distributed: f64,
        delta: f64,
    },

    #[error("{strategy}: individual {index} ends at {total}, below level {level}")]
    FloorBreached {
        strategy: &'static str,
        index: usize,
        total: f64,
        level: f64,
    },

    #[error("{strategy}: negative grant {grant} for individual {index}")]
    NegativeGrant {
        strategy: &'static str,
        index: usize,
        grant: f64,
    },

    #[error("Population is empty")]
    EmptyPopulation,

    #[error("Budget must be finite and non-negative, got {0}")]
    InvalidBudget(f64),

    #[error("{strategy}: no eligible individuals for a budget of {budget}")]
    NoEligible { strategy: &'static str, budget: f64 },

    #[error("{strategy}: budget {budget} cannot cover flat grants of {required}")]
    InsufficientBudget {
        strategy: &'static str,
        budget: f64,
        required: f64,
    },

    #[error("{strategy}: weights sum to zero with {remaining} left to distribute")]
    DegenerateWeights { strategy: &'static str, remaining: f64 },

    #[error("{strategy}: eligible individual {index} has no score")]
    MissingScore { strategy: &'static str, index: usize },
}

impl AllocationError {
    /// Conservation and floor breaches point at an implementation bug rather
    /// than at the input data.
    pub fn is_conservation_defect(&self) -> bool {
        matches!(
            self,
            AllocationError::ConservationViolated { .. }
                | AllocationError::FloorBreached { .. }
                | AllocationError::NegativeGrant { .. }
        )
    }
}

/// Statistics primitive errors
#[derive(Debug, Error, Clone, PartialEq)]
pub enum StatsError {
    #[error("Series lengths differ: {left} vs {right}")]
    LengthMismatch { left: usize, right: usize },

    #[error("Statistic undefined: {0}")]
    Degenerate(&'static str),
}

/// Configuration errors
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },

    #[error("Unknown strategy: {0}")]
    UnknownStrategy(String),

    #[error("Parameter out of range: {0}")]
    OutOfRange(String),
}

impl From<serde_json::Error> for BecasError {
    fn from(err: serde_json::Error) -> Self {
        BecasError::Serialization(err.to_string())
    }
}

impl From<std::io::Error> for BecasError {
    fn from(err: std::io::Error) -> Self {
        BecasError::Output(err.to_string())
    }
}

impl From<anyhow::Error> for BecasError {
    fn from(err: anyhow::Error) -> Self {
        BecasError::Internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = BecasError::Allocation(AllocationError::ConservationViolated {
            strategy: "water-level",
            budget: 15.0,
            distributed: 14.5,
            delta: -0.5,
        });
        assert!(err.to_string().contains("water-level"));
        assert!(err.is_fatal_defect());
    }

    #[test]
    fn test_input_errors_are_not_defects() {
        let err: BecasError = AllocationError::EmptyPopulation.into();
        assert!(!err.is_fatal_defect());

        let err = StatsError::LengthMismatch { left: 2, right: 3 };
        assert!(err.to_string().contains("2 vs 3"));
    }
}
