//! Simulator configuration

use std::path::PathBuf;
use std::str::FromStr;

use becas_allocation::{CorrelationTarget, StrategyKind};
use becas_common::{
    generator::{IncomeModel, ScoreModel},
    ConfigError, PolicyParameters, PopulationGenerator, COST_OF_STUDY, FEEDBACK_PERIODS,
    FLAT_AMOUNT, INCOME_CEILING, MEAN_SCORE, PER_CAPITA_BUDGET, POPULATION_SIZE, POVERTY_FLOOR,
    SCORE_STD_DEV,
};
use serde::{Deserialize, Serialize};

/// Complete run configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Population sampling
    pub population: PopulationSettings,
    /// Policy constants and budget
    pub policy: PolicySettings,
    /// Multi-period loop
    pub feedback: FeedbackSettings,
    /// Extra outputs besides the CSV stream
    pub output: OutputSettings,
}

impl SimulationConfig {
    /// Load configuration from `.env` and `BECAS_*` environment variables
    pub fn load() -> Result<Self, ConfigError> {
        // A missing .env file is fine
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Apply overrides from `lookup` on top of the defaults
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();

        // Population settings
        override_with(&lookup, "BECAS_POPULATION_SIZE", &mut cfg.population.size)?;
        override_with(&lookup, "BECAS_SEED", &mut cfg.population.seed)?;
        override_with(&lookup, "BECAS_INCOME_MU", &mut cfg.population.income_mu)?;
        override_with(&lookup, "BECAS_INCOME_SIGMA", &mut cfg.population.income_sigma)?;
        override_with(&lookup, "BECAS_INCOME_SCALE", &mut cfg.population.income_scale)?;
        override_with(&lookup, "BECAS_SCORE_MEAN", &mut cfg.population.score_mean)?;
        override_with(&lookup, "BECAS_SCORE_STD_DEV", &mut cfg.population.score_std_dev)?;
        override_flag(&lookup, "BECAS_SCORES", &mut cfg.population.scores)?;

        // Policy settings
        override_with(&lookup, "BECAS_CEILING", &mut cfg.policy.ceiling)?;
        override_with(&lookup, "BECAS_FLOOR", &mut cfg.policy.floor)?;
        override_with(&lookup, "BECAS_COST_OF_STUDY", &mut cfg.policy.cost_of_study)?;
        override_with(&lookup, "BECAS_FLAT_AMOUNT", &mut cfg.policy.flat_amount)?;
        override_with(
            &lookup,
            "BECAS_PER_CAPITA_BUDGET",
            &mut cfg.policy.per_capita_budget,
        )?;

        // Feedback settings
        override_with(&lookup, "BECAS_PERIODS", &mut cfg.feedback.periods)?;
        override_with(&lookup, "BECAS_FEEDBACK_SEED", &mut cfg.feedback.seed)?;
        if let Some(val) = lookup("BECAS_STRATEGY") {
            cfg.feedback.strategy = val.parse()?;
        }
        if let Some(val) = lookup("BECAS_CORRELATION_TARGET") {
            cfg.feedback.correlation_target = parse_correlation_target(&val)?;
        }

        // Output settings
        override_flag(&lookup, "BECAS_METRICS_DUMP", &mut cfg.output.metrics_dump)?;
        if let Some(path) = lookup("BECAS_REPORT_JSON").filter(|p| !p.trim().is_empty()) {
            cfg.output.report_json = Some(PathBuf::from(path));
        }

        cfg.validate()?;
        Ok(cfg)
    }

    /// Reject values the simulation cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.population.size == 0 {
            return Err(ConfigError::OutOfRange(
                "population size must be at least 1".to_string(),
            ));
        }

        let non_negative = [
            ("income sigma", self.population.income_sigma),
            ("income scale", self.population.income_scale),
            ("score std dev", self.population.score_std_dev),
            ("ceiling", self.policy.ceiling),
            ("floor", self.policy.floor),
            ("cost of study", self.policy.cost_of_study),
            ("flat amount", self.policy.flat_amount),
            ("per-capita budget", self.policy.per_capita_budget),
        ];
        for (name, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::OutOfRange(format!(
                    "{name} must be finite and non-negative, got {value}"
                )));
            }
        }

        if !self.population.income_mu.is_finite() || !self.population.score_mean.is_finite() {
            return Err(ConfigError::OutOfRange(
                "distribution means must be finite".to_string(),
            ));
        }

        Ok(())
    }

    /// Total budget: per-capita amount times population size
    pub fn budget(&self) -> f64 {
        self.policy.per_capita_budget * self.population.size as f64
    }

    pub fn policy_parameters(&self) -> PolicyParameters {
        PolicyParameters {
            ceiling: self.policy.ceiling,
            floor: self.policy.floor,
            cost_of_study: self.policy.cost_of_study,
            flat_amount: self.policy.flat_amount,
        }
    }

    pub fn generator(&self) -> PopulationGenerator {
        let settings = &self.population;
        PopulationGenerator::new(settings.size)
            .with_income(IncomeModel {
                mu: settings.income_mu,
                sigma: settings.income_sigma,
                scale: settings.income_scale,
            })
            .with_score(settings.scores.then_some(ScoreModel {
                mean: settings.score_mean,
                std_dev: settings.score_std_dev,
            }))
    }
}

/// Population sampling settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PopulationSettings {
    /// Number of modeled individuals (N)
    pub size: usize,
    /// Seed of the population RNG
    pub seed: u64,
    pub income_mu: f64,
    pub income_sigma: f64,
    pub income_scale: f64,
    pub score_mean: f64,
    pub score_std_dev: f64,
    /// Whether individuals get an academic score
    pub scores: bool,
}

impl Default for PopulationSettings {
    fn default() -> Self {
        let income = IncomeModel::default();
        Self {
            size: POPULATION_SIZE,
            seed: 1,
            income_mu: income.mu,
            income_sigma: income.sigma,
            income_scale: income.scale,
            score_mean: MEAN_SCORE,
            score_std_dev: SCORE_STD_DEV,
            scores: true,
        }
    }
}

/// Policy constants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicySettings {
    pub ceiling: f64,
    pub floor: f64,
    pub cost_of_study: f64,
    pub flat_amount: f64,
    /// Budget per modeled individual
    pub per_capita_budget: f64,
}

impl Default for PolicySettings {
    fn default() -> Self {
        Self {
            ceiling: INCOME_CEILING,
            floor: POVERTY_FLOOR,
            cost_of_study: COST_OF_STUDY,
            flat_amount: FLAT_AMOUNT,
            per_capita_budget: PER_CAPITA_BUDGET,
        }
    }
}

/// Feedback loop settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackSettings {
    /// Number of periods (K)
    pub periods: usize,
    /// Strategy applied every period
    pub strategy: StrategyKind,
    /// Seed of the exam / income noise RNG
    pub seed: u64,
    pub correlation_target: CorrelationTarget,
}

impl Default for FeedbackSettings {
    fn default() -> Self {
        Self {
            periods: FEEDBACK_PERIODS,
            strategy: StrategyKind::ScoreWeighted,
            seed: 2,
            correlation_target: CorrelationTarget::Income,
        }
    }
}

/// Optional outputs
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OutputSettings {
    /// Write the Prometheus text exposition to stderr at the end
    pub metrics_dump: bool,
    /// Write the JSON run report to this path
    pub report_json: Option<PathBuf>,
}

fn override_with<F, T>(lookup: &F, key: &str, slot: &mut T) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    if let Some(val) = lookup(key) {
        *slot = val.trim().parse().map_err(|_| ConfigError::InvalidValue {
            key: key.to_string(),
            value: val.clone(),
        })?;
    }
    Ok(())
}

fn override_flag<F>(lookup: &F, key: &str, slot: &mut bool) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(val) = lookup(key) {
        *slot = match val.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => true,
            "0" | "false" | "no" | "off" | "" => false,
            _ => {
                return Err(ConfigError::InvalidValue {
                    key: key.to_string(),
                    value: val.clone(),
                })
            }
        };
    }
    Ok(())
}

fn parse_correlation_target(val: &str) -> Result<CorrelationTarget, ConfigError> {
    match val.trim().to_ascii_lowercase().as_str() {
        "income" => Ok(CorrelationTarget::Income),
        "grant" => Ok(CorrelationTarget::Grant),
        _ => Err(ConfigError::InvalidValue {
            key: "BECAS_CORRELATION_TARGET".to_string(),
            value: val.to_string(),
        }),
    }
}
