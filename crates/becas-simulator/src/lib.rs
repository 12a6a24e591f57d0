//! # Becas Simulator
//!
//! Scenario driver: samples a population, records the pre-grant baseline,
//! applies the water-level, push and official strategies once each, then
//! runs the multi-period feedback loop with the configured strategy.
//!
//! Snapshots stream to a [`RecordSink`]; the binary uses [`CsvSink`] on
//! stdout and keeps logs on stderr.

pub mod config;
pub mod scenario;
pub mod sink;

pub use config::{FeedbackSettings, OutputSettings, PolicySettings, PopulationSettings, SimulationConfig};
pub use scenario::{Scenario, ScenarioOutcome, ONE_SHOT_STRATEGIES};
pub use sink::{CsvSink, MemorySink, RecordSink, Stage};

/// Simulator version
pub const SIMULATOR_VERSION: &str = env!("CARGO_PKG_VERSION");
