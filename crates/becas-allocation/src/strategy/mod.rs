//! Allocation strategies and the engine that runs them
//!
//! Every strategy is driven through [`AllocationEngine::allocate`], which
//! owns the shared pre/post-conditions: budget validation, grant reset,
//! non-negativity, conservation of the budget and the strategy-specific
//! checks of [`AllocationStrategy::verify`].

pub mod official;
pub mod push;
pub mod water_level;

pub use self::official::{OfficialAllocation, ScoreWeightedAllocation, ScoreWeighting};
pub use self::push::PushAllocation;
pub use self::water_level::WaterLevelAllocation;

use std::fmt;
use std::str::FromStr;

use becas_common::{
    AllocationError, ConfigError, PolicyParameters, Population, CONSERVATION_TOLERANCE,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::metrics::MetricsEngine;

/// How a conservation mismatch is treated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConservationPolicy {
    /// Closed-form procedure: any mismatch is a defect and aborts the run
    Strict,
    /// Approximate procedure: mismatch is reported and the run continues
    Lenient,
}

/// Strategy-specific facts about a finished distribution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StrategyOutcome {
    Official {
        /// Individuals at or under the ceiling
        eligible: usize,
        /// Top-decile mean score used as normaliser (score-weighted only)
        top_score_mean: Option<f64>,
    },
    WaterLevel {
        /// Common post-grant income floor
        level: f64,
    },
    Push {
        /// Lowest income still funded
        cutoff: f64,
        /// Individuals that received a grant
        funded: usize,
    },
}

/// Budget distribution procedure
pub trait AllocationStrategy: Send + Sync {
    /// Short, stable name used in logs and configuration
    fn name(&self) -> &'static str;

    /// Failure policy for the conservation check
    fn conservation(&self) -> ConservationPolicy;

    /// Write grants into `population`. Grants are already zero on entry.
    fn distribute(
        &self,
        budget: f64,
        policy: &PolicyParameters,
        population: &mut Population,
    ) -> Result<StrategyOutcome, AllocationError>;

    /// Extra postconditions, run after the conservation check
    fn verify(
        &self,
        _population: &Population,
        _outcome: &StrategyOutcome,
    ) -> Result<(), AllocationError> {
        Ok(())
    }
}

/// Summary returned by every allocation call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostRunInfo {
    pub strategy: String,
    pub budget: f64,
    /// Sum of all grants
    pub distributed: f64,
    pub outcome: StrategyOutcome,
    /// Individuals reaching `floor + cost_of_study`
    pub sufficient: usize,
    /// Individuals still under the poverty floor
    pub poor: usize,
    /// `distributed - budget`, set when a lenient strategy missed the budget
    pub drift: Option<f64>,
}

impl PostRunInfo {
    /// Eligible count, for the official strategies
    pub fn eligible(&self) -> Option<usize> {
        match self.outcome {
            StrategyOutcome::Official { eligible, .. } => Some(eligible),
            _ => None,
        }
    }
}

/// Runs strategies under the shared contract
#[derive(Debug, Clone, Default)]
pub struct AllocationEngine {
    policy: PolicyParameters,
    metrics: MetricsEngine,
}

impl AllocationEngine {
    pub fn new(policy: PolicyParameters) -> Self {
        Self {
            policy,
            metrics: MetricsEngine::new(policy),
        }
    }

    pub fn policy(&self) -> &PolicyParameters {
        &self.policy
    }

    /// Distribute `budget` over `population` with `strategy`
    ///
    /// Strict strategies fail with [`AllocationError::ConservationViolated`]
    /// when the grants miss the budget by more than
    /// [`CONSERVATION_TOLERANCE`]; lenient ones log a warning and report the
    /// delta in [`PostRunInfo::drift`].
    #[instrument(skip(self, strategy, population), fields(strategy = strategy.name()))]
    pub fn allocate(
        &self,
        strategy: &dyn AllocationStrategy,
        budget: f64,
        population: &mut Population,
    ) -> Result<PostRunInfo, AllocationError> {
        if !budget.is_finite() || budget < 0.0 {
            return Err(AllocationError::InvalidBudget(budget));
        }
        if population.is_empty() {
            return Err(AllocationError::EmptyPopulation);
        }

        population.reset_grants();
        let outcome = strategy.distribute(budget, &self.policy, population)?;

        if let Some((index, individual)) = population
            .iter()
            .enumerate()
            .find(|(_, i)| !(i.grant >= 0.0))
        {
            return Err(AllocationError::NegativeGrant {
                strategy: strategy.name(),
                index,
                grant: individual.grant,
            });
        }

        let distributed = population.total_granted();
        let delta = distributed - budget;
        let drift = if delta.abs() > CONSERVATION_TOLERANCE {
            match strategy.conservation() {
                ConservationPolicy::Strict => {
                    return Err(AllocationError::ConservationViolated {
                        strategy: strategy.name(),
                        budget,
                        distributed,
                        delta,
                    });
                }
                ConservationPolicy::Lenient => {
                    warn!(budget, distributed, delta, "Grants do not add up to the budget");
                    Some(delta)
                }
            }
        } else {
            None
        };

        strategy.verify(population, &outcome)?;

        let info = PostRunInfo {
            strategy: strategy.name().to_string(),
            budget,
            distributed,
            outcome,
            sufficient: self.metrics.count_sufficient(population),
            poor: self.metrics.count_poor(population),
            drift,
        };

        debug!(outcome = ?info.outcome, "Strategy outcome");
        info!(
            distributed = info.distributed,
            sufficient = info.sufficient,
            poor = info.poor,
            "Allocation complete"
        );
        Ok(info)
    }
}

/// Selectable strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StrategyKind {
    Official,
    WaterLevel,
    Push,
    ScoreWeighted,
}

impl StrategyKind {
    pub const ALL: [StrategyKind; 4] = [
        StrategyKind::Official,
        StrategyKind::WaterLevel,
        StrategyKind::Push,
        StrategyKind::ScoreWeighted,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyKind::Official => OfficialAllocation::NAME,
            StrategyKind::WaterLevel => WaterLevelAllocation::NAME,
            StrategyKind::Push => PushAllocation::NAME,
            StrategyKind::ScoreWeighted => ScoreWeightedAllocation::NAME,
        }
    }

    /// Instantiate the strategy
    pub fn build(&self) -> Box<dyn AllocationStrategy> {
        match self {
            StrategyKind::Official => Box::new(OfficialAllocation::score_blind()),
            StrategyKind::WaterLevel => Box::new(WaterLevelAllocation),
            StrategyKind::Push => Box::new(PushAllocation),
            StrategyKind::ScoreWeighted => Box::new(ScoreWeightedAllocation::new()),
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StrategyKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('_', "-");
        StrategyKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == normalized)
            .ok_or_else(|| ConfigError::UnknownStrategy(s.to_string()))
    }
}
