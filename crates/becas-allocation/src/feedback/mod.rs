//! Multi-period feedback loop
pub mod rules;
pub mod simulator;

pub use self::rules::FeedbackRules;
pub use self::simulator::{FeedbackPhase, FeedbackSimulator, PeriodRecord, SimulationReport};
