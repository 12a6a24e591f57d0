//! Per-period measurements over the mutated population
//!
//! Everything here is read-only: no function in this module writes to an
//! individual.
pub mod snapshot;

pub use self::snapshot::{CorrelationTarget, MetricsEngine, PeriodMetrics};
