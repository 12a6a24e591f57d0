//! Feedback simulator: allocate, measure, update scores, update incomes
//!
//! The simulator owns the RNG and borrows the population for one call at a
//! time; every phase gets the population for the duration of its own call.

use std::sync::Arc;

use becas_common::{AllocationError, Population};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};
use uuid::Uuid;

use super::rules::FeedbackRules;
use crate::metrics::{MetricsEngine, PeriodMetrics};
use crate::strategy::{AllocationEngine, AllocationStrategy, PostRunInfo};
use crate::telemetry::SimulationTelemetry;

/// Where the simulator is within a period
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeedbackPhase {
    Idle,
    Allocating,
    Measuring,
    ExamUpdate,
    IncomeUpdate,
    Finished,
}

/// Everything recorded for one period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodRecord {
    /// Zero-based period index
    pub period: usize,
    pub allocation: PostRunInfo,
    /// Snapshot right after allocation (the period's record)
    pub metrics: PeriodMetrics,
    /// Snapshot after the exam update
    pub after_exam: PeriodMetrics,
    /// Snapshot after the income update
    pub after_income: PeriodMetrics,
}

/// Time series produced by a full run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationReport {
    pub run_id: Uuid,
    /// Unix milliseconds
    pub started_at: i64,
    pub strategy: String,
    pub budget: f64,
    pub periods: Vec<PeriodRecord>,
}

impl SimulationReport {
    /// Empty report stamped with a fresh run id and the current time
    pub fn new(strategy: &str, budget: f64) -> Self {
        Self {
            run_id: Uuid::now_v7(),
            started_at: chrono::Utc::now().timestamp_millis(),
            strategy: strategy.to_string(),
            budget,
            periods: Vec::new(),
        }
    }

    /// Per-period post-grant Gini
    pub fn gini_series(&self) -> Vec<f64> {
        self.periods.iter().map(|p| p.metrics.gini_total).collect()
    }

    /// Per-period score correlation (`None` where undefined)
    pub fn correlation_series(&self) -> Vec<Option<f64>> {
        self.periods.iter().map(|p| p.metrics.correlation).collect()
    }

    pub fn last(&self) -> Option<&PeriodRecord> {
        self.periods.last()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Drives the allocate → measure → exam → income loop for a fixed number of periods
pub struct FeedbackSimulator {
    engine: AllocationEngine,
    metrics: MetricsEngine,
    strategy: Box<dyn AllocationStrategy>,
    rules: FeedbackRules,
    budget: f64,
    periods: usize,
    rng: ChaCha8Rng,
    phase: FeedbackPhase,
    completed: usize,
    telemetry: Option<Arc<SimulationTelemetry>>,
}

impl FeedbackSimulator {
    pub fn new(
        engine: AllocationEngine,
        strategy: Box<dyn AllocationStrategy>,
        budget: f64,
        periods: usize,
        seed: u64,
    ) -> Self {
        let metrics = MetricsEngine::new(*engine.policy());
        Self {
            engine,
            metrics,
            strategy,
            rules: FeedbackRules::default(),
            budget,
            periods,
            rng: ChaCha8Rng::seed_from_u64(seed),
            phase: FeedbackPhase::Idle,
            completed: 0,
            telemetry: None,
        }
    }

    pub fn with_rules(mut self, rules: FeedbackRules) -> Self {
        self.rules = rules;
        self
    }

    pub fn with_metrics(mut self, metrics: MetricsEngine) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn with_telemetry(mut self, telemetry: Arc<SimulationTelemetry>) -> Self {
        self.telemetry = Some(telemetry);
        self
    }

    pub fn strategy_name(&self) -> &'static str {
        self.strategy.name()
    }

    pub fn budget(&self) -> f64 {
        self.budget
    }

    pub fn phase(&self) -> FeedbackPhase {
        self.phase
    }

    pub fn completed_periods(&self) -> usize {
        self.completed
    }

    pub fn is_finished(&self) -> bool {
        self.phase == FeedbackPhase::Finished
    }

    fn enter(&mut self, phase: FeedbackPhase) {
        debug!(period = self.completed, from = ?self.phase, to = ?phase, "Phase transition");
        self.phase = phase;
    }

    /// Run one period; `Ok(None)` once all periods are done
    ///
    /// An allocation error ends the simulation.
    pub fn step(
        &mut self,
        population: &mut Population,
    ) -> Result<Option<PeriodRecord>, AllocationError> {
        if self.is_finished() {
            return Ok(None);
        }
        if self.completed >= self.periods {
            self.enter(FeedbackPhase::Finished);
            return Ok(None);
        }

        self.enter(FeedbackPhase::Allocating);
        let allocation = match self
            .engine
            .allocate(self.strategy.as_ref(), self.budget, population)
        {
            Ok(info) => info,
            Err(err) => {
                self.enter(FeedbackPhase::Finished);
                return Err(err);
            }
        };

        self.enter(FeedbackPhase::Measuring);
        let metrics = self.metrics.snapshot(population);
        if let Some(telemetry) = &self.telemetry {
            telemetry.record_allocation(&allocation);
            telemetry.record_period(&metrics);
        }

        self.enter(FeedbackPhase::ExamUpdate);
        let threshold = self.engine.policy().sufficiency_threshold();
        self.rules.apply_exam(population, threshold, &mut self.rng);
        let after_exam = self.metrics.snapshot(population);

        self.enter(FeedbackPhase::IncomeUpdate);
        self.rules.apply_income(population, &mut self.rng);
        let after_income = self.metrics.snapshot(population);

        let record = PeriodRecord {
            period: self.completed,
            allocation,
            metrics,
            after_exam,
            after_income,
        };
        self.completed += 1;

        if self.completed >= self.periods {
            self.enter(FeedbackPhase::Finished);
        }
        Ok(Some(record))
    }

    /// Run every remaining period and collect the time series
    #[instrument(skip(self, population), fields(strategy = self.strategy.name(), periods = self.periods))]
    pub fn run(&mut self, population: &mut Population) -> Result<SimulationReport, AllocationError> {
        let mut report = SimulationReport::new(self.strategy.name(), self.budget);
        report.periods.reserve(self.periods);

        while let Some(record) = self.step(population)? {
            report.periods.push(record);
        }

        info!(
            run_id = %report.run_id,
            periods = report.periods.len(),
            "Feedback simulation finished"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::{ScoreWeightedAllocation, WaterLevelAllocation};
    use becas_common::{PolicyParameters, PopulationGenerator};

    fn simulator(periods: usize, seed: u64) -> FeedbackSimulator {
        FeedbackSimulator::new(
            AllocationEngine::new(PolicyParameters::default()),
            Box::new(ScoreWeightedAllocation::new()),
            2300.0 * 200.0,
            periods,
            seed,
        )
    }

    #[test]
    fn test_phases() {
        let mut population = PopulationGenerator::new(200).generate_seeded(1);
        let mut sim = simulator(2, 1);
        assert_eq!(sim.phase(), FeedbackPhase::Idle);

        let first = sim.step(&mut population).unwrap().unwrap();
        assert_eq!(first.period, 0);
        assert_eq!(sim.phase(), FeedbackPhase::IncomeUpdate);

        sim.step(&mut population).unwrap().unwrap();
        assert!(sim.is_finished());
        assert!(sim.step(&mut population).unwrap().is_none());
        assert_eq!(sim.completed_periods(), 2);
    }

    #[test]
    fn test_run_is_reproducible() {
        let generator = PopulationGenerator::new(200);

        let mut a = generator.generate_seeded(3);
        let mut b = generator.generate_seeded(3);
        let report_a = simulator(5, 11).run(&mut a).unwrap();
        let report_b = simulator(5, 11).run(&mut b).unwrap();

        assert_eq!(a, b);
        assert_eq!(report_a.periods, report_b.periods);
        assert_eq!(report_a.periods.len(), 5);
    }

    #[test]
    fn test_zero_periods() {
        let mut population = PopulationGenerator::new(10).generate_seeded(3);
        let before = population.clone();

        let report = simulator(0, 1).run(&mut population).unwrap();
        assert!(report.periods.is_empty());
        assert_eq!(population, before);
    }

    #[test]
    fn test_allocation_error_stops_run() {
        // Nobody eligible: the official formula cannot place the budget
        let mut population = Population::from_incomes_and_scores(&[1e6, 2e6], &[5.0, 6.0]);
        let mut sim = FeedbackSimulator::new(
            AllocationEngine::default(),
            Box::new(ScoreWeightedAllocation::new()),
            1000.0,
            3,
            0,
        );

        assert!(sim.run(&mut population).is_err());
        assert!(sim.is_finished());
    }

    #[test]
    fn test_each_period_conserves_budget() {
        let mut population = PopulationGenerator::new(300).generate_seeded(8);
        let budget = 2300.0 * 300.0;
        let mut sim = FeedbackSimulator::new(
            AllocationEngine::default(),
            Box::new(WaterLevelAllocation),
            budget,
            10,
            8,
        );

        let report = sim.run(&mut population).unwrap();
        for record in &report.periods {
            assert!((record.allocation.distributed - budget).abs() <= 1e-3);
            assert_eq!(record.allocation.drift, None);
        }
        assert_eq!(report.gini_series().len(), 10);
    }
}
