//! # Becas Allocation
//!
//! Grant allocation engine, metrics and feedback loop for the Becas simulator.
//!
//! ## Strategies
//!
//! | strategy | goal | conservation |
//! |---|---|---|
//! | `official` | flat amount + need-weighted remainder | strict |
//! | `water-level` | lift the lowest incomes to a common level (min Gini) | strict + floor guarantee |
//! | `push` | lift whoever is cheapest to bring up to `floor + cost_of_study` | lenient (reported) |
//! | `score-weighted` | `official` with weights scaled by score / top-decile mean | strict |
//!
//! ## Feedback Loop
//!
//! ```text
//! Idle → Allocating → Measuring → ExamUpdate → IncomeUpdate ─┐
//!            ▲                                               │
//!            └───────────────────────────────────────────────┘  × K periods
//! ```
//!
//! Exam scores drift with income, and income drifts with scores, so each
//! period's allocation feeds the next period's inputs.

pub mod feedback;
pub mod metrics;
pub mod strategy;
pub mod telemetry;

pub use feedback::{FeedbackPhase, FeedbackRules, FeedbackSimulator, PeriodRecord, SimulationReport};
pub use metrics::{CorrelationTarget, MetricsEngine, PeriodMetrics};
pub use strategy::{
    AllocationEngine, AllocationStrategy, ConservationPolicy, OfficialAllocation, PostRunInfo,
    PushAllocation, ScoreWeightedAllocation, StrategyKind, StrategyOutcome, WaterLevelAllocation,
};
pub use telemetry::SimulationTelemetry;
