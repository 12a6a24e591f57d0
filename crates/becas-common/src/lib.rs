//! # Becas Common
//!
//! Shared types, errors, and numeric primitives for the Becas grant simulator.
//!
//! ## Core Types
//!
//! - [`Individual`]: income, grant and (optional) academic score of one student
//! - [`Population`]: the ordered, exclusively-owned set of individuals
//! - [`PolicyParameters`]: ceiling, floor, cost of study and flat amount
//!
//! ## Statistics
//!
//! - [`stats::gini`]: Gini coefficient over non-negative values
//! - [`stats::pearson`]: Pearson correlation, undefined on degenerate input
//! - [`stats::coverage`]: fractions below / at-or-above a threshold
//!
//! ## Sampling
//!
//! - [`generator::PopulationGenerator`]: log-normal incomes and clipped
//!   normal scores, drawn from an explicitly passed seedable RNG

pub mod error;
pub mod generator;
pub mod stats;
pub mod types;

// Re-export commonly used types at crate root
pub use error::{AllocationError, BecasError, ConfigError, Result, StatsError};
pub use generator::{IncomeModel, PopulationGenerator, ScoreModel};
pub use types::{
    individual::Individual,
    policy::PolicyParameters,
    population::Population,
};

/// Becas version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Per-capita income ceiling (family of four) above which no variable grant is paid
pub const INCOME_CEILING: f64 = 36421.0 / 4.0;

/// Poverty floor: minimum income needed to live with dignity
pub const POVERTY_FLOOR: f64 = 6000.0;

/// Fixed yearly cost of continuing studies
pub const COST_OF_STUDY: f64 = 3600.0;

/// Flat grant paid to every eligible individual
pub const FLAT_AMOUNT: f64 = 60.0;

/// Grant budget per modeled individual
pub const PER_CAPITA_BUDGET: f64 = 2300.0;

/// Mean per-capita income (2011 survey), used as a reference point
pub const MEDIAN_INCOME: f64 = 9326.0;

/// Mean academic score
pub const MEAN_SCORE: f64 = 6.0;

/// Academic score standard deviation
pub const SCORE_STD_DEV: f64 = 2.0;

/// Highest possible score
pub const MAX_SCORE: f64 = 10.0;

/// Lowest possible score
pub const MIN_SCORE: f64 = 0.0;

/// Default number of modeled individuals
pub const POPULATION_SIZE: usize = 1000;

/// Default number of feedback periods
pub const FEEDBACK_PERIODS: usize = 100;

/// Share of eligible individuals whose mean score normalises the score weight
pub const TOP_SCORE_FRACTION: usize = 10;

/// Absolute tolerance of the grant conservation check
pub const CONSERVATION_TOLERANCE: f64 = 1e-3;

/// Tolerance of the water-level floor guarantee
pub const LEVEL_TOLERANCE: f64 = 1e-6;
