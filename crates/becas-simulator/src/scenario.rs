//! The full scenario: baseline, three one-shot strategies, then the feedback loop
//!
//! ```text
//! generate ─► baseline ─► water-level ─► push ─► official ─► K × (allocate ─► exam ─► income)
//! ```
//!
//! Every snapshot goes to the sink in that order, three per feedback period.

use std::sync::Arc;

use becas_allocation::{
    AllocationEngine, FeedbackSimulator, MetricsEngine, PostRunInfo, SimulationReport,
    SimulationTelemetry, StrategyKind, StrategyOutcome,
};
use becas_common::{BecasError, Population, Result};
use tracing::{info, instrument, warn};

use crate::config::SimulationConfig;
use crate::sink::{RecordSink, Stage};

/// Strategies applied once, in order, before the feedback loop
pub const ONE_SHOT_STRATEGIES: [StrategyKind; 3] = [
    StrategyKind::WaterLevel,
    StrategyKind::Push,
    StrategyKind::Official,
];

/// What a finished scenario leaves behind
#[derive(Debug)]
pub struct ScenarioOutcome {
    pub population: Population,
    pub one_shot: Vec<PostRunInfo>,
    pub report: SimulationReport,
    pub telemetry: Arc<SimulationTelemetry>,
}

pub struct Scenario {
    config: SimulationConfig,
}

impl Scenario {
    pub fn new(config: SimulationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    #[instrument(skip_all, fields(size = self.config.population.size, strategy = %self.config.feedback.strategy))]
    pub fn run<S: RecordSink>(&self, sink: &mut S) -> Result<ScenarioOutcome> {
        let policy = self.config.policy_parameters();
        let budget = self.config.budget();
        let engine = AllocationEngine::new(policy);
        let metrics = MetricsEngine::new(policy)
            .with_correlation_target(self.config.feedback.correlation_target);
        let telemetry = Arc::new(
            SimulationTelemetry::new().map_err(|e| BecasError::Internal(e.to_string()))?,
        );

        let mut population = self
            .config
            .generator()
            .generate_seeded(self.config.population.seed);

        info!(
            gini_income = metrics.gini_income(&population),
            budget, "Before grants"
        );
        sink.record(Stage::Baseline, &metrics.snapshot(&population))?;

        let mut one_shot = Vec::with_capacity(ONE_SHOT_STRATEGIES.len());
        for kind in ONE_SHOT_STRATEGIES {
            let strategy = kind.build();
            let info = engine.allocate(strategy.as_ref(), budget, &mut population)?;
            log_outcome(&info);
            telemetry.record_allocation(&info);

            sink.record(Stage::OneShot(kind), &metrics.snapshot(&population))?;
            one_shot.push(info);
        }

        let mut simulator = FeedbackSimulator::new(
            engine,
            self.config.feedback.strategy.build(),
            budget,
            self.config.feedback.periods,
            self.config.feedback.seed,
        )
        .with_metrics(metrics)
        .with_telemetry(Arc::clone(&telemetry));

        let mut report = SimulationReport::new(simulator.strategy_name(), simulator.budget());
        while let Some(record) = simulator.step(&mut population)? {
            sink.record(Stage::Allocated(record.period), &record.metrics)?;
            sink.record(Stage::AfterExam(record.period), &record.after_exam)?;
            sink.record(Stage::AfterIncome(record.period), &record.after_income)?;
            report.periods.push(record);
        }
        sink.flush()?;

        info!(
            run_id = %report.run_id,
            periods = report.periods.len(),
            "Scenario finished"
        );
        Ok(ScenarioOutcome {
            population,
            one_shot,
            report,
            telemetry,
        })
    }
}

fn log_outcome(info: &PostRunInfo) {
    match info.outcome {
        StrategyOutcome::WaterLevel { level } => {
            info!(strategy = %info.strategy, level, "Minimum income reached");
        }
        StrategyOutcome::Push { cutoff, funded } => {
            info!(strategy = %info.strategy, cutoff, funded, "Supported from cutoff upwards");
        }
        StrategyOutcome::Official {
            eligible,
            top_score_mean,
        } => {
            info!(strategy = %info.strategy, eligible, ?top_score_mean, "Eligible individuals");
        }
    }
    if let Some(delta) = info.drift {
        warn!(strategy = %info.strategy, delta, "Budget missed");
    }
}
