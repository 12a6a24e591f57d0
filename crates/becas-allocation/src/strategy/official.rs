//! Official grant formula (2013-2014 academic year, simplified)
//!
//! ```text
//! S      = #{ i : income_i <= ceiling }
//! rest   = C - flat · S
//! w_i    = f_i · (1 - income_i / ceiling)
//! grant  = rest · w_i / Σw + flat                (eligible)
//! ```
//!
//! `f_i = 1` when scores are ignored, `score_i / top-decile mean` otherwise.

use becas_common::{
    stats, AllocationError, PolicyParameters, Population, TOP_SCORE_FRACTION,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{AllocationStrategy, ConservationPolicy, StrategyOutcome};

/// How the need weight is scaled by academic score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScoreWeighting {
    /// Weight depends on income only
    Blind,
    /// Weight is multiplied by score / mean score of the best eligible decile
    TopDecile,
}

/// Flat amount plus need-weighted share of the remainder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OfficialAllocation {
    weighting: ScoreWeighting,
}

impl OfficialAllocation {
    pub const NAME: &'static str = "official";

    pub fn new(weighting: ScoreWeighting) -> Self {
        Self { weighting }
    }

    pub fn score_blind() -> Self {
        Self::new(ScoreWeighting::Blind)
    }

    pub fn weighting(&self) -> ScoreWeighting {
        self.weighting
    }

    fn label(&self) -> &'static str {
        match self.weighting {
            ScoreWeighting::Blind => Self::NAME,
            ScoreWeighting::TopDecile => ScoreWeightedAllocation::NAME,
        }
    }
}

impl AllocationStrategy for OfficialAllocation {
    fn name(&self) -> &'static str {
        self.label()
    }

    fn conservation(&self) -> ConservationPolicy {
        ConservationPolicy::Strict
    }

    fn distribute(
        &self,
        budget: f64,
        policy: &PolicyParameters,
        population: &mut Population,
    ) -> Result<StrategyOutcome, AllocationError> {
        let strategy = self.label();
        let ceiling = policy.ceiling;

        let eligible: Vec<usize> = population
            .iter()
            .enumerate()
            .filter(|(_, individual)| individual.income <= ceiling)
            .map(|(index, _)| index)
            .collect();

        if eligible.is_empty() {
            if budget > 0.0 {
                return Err(AllocationError::NoEligible { strategy, budget });
            }
            return Ok(StrategyOutcome::Official {
                eligible: 0,
                top_score_mean: None,
            });
        }

        let flat_total = policy.flat_amount * eligible.len() as f64;
        if budget < flat_total {
            return Err(AllocationError::InsufficientBudget {
                strategy,
                budget,
                required: flat_total,
            });
        }
        let remaining = budget - flat_total;

        let top_score_mean = match self.weighting {
            ScoreWeighting::Blind => None,
            ScoreWeighting::TopDecile => Some(top_decile_mean(population, &eligible, strategy)?),
        };

        let weights = eligible
            .iter()
            .map(|&index| {
                let individual = &population.as_slice()[index];
                let factor = match top_score_mean {
                    None => 1.0,
                    Some(normaliser) => {
                        let score = individual
                            .score
                            .ok_or(AllocationError::MissingScore { strategy, index })?;
                        score / normaliser
                    }
                };
                Ok(factor * (1.0 - individual.income / ceiling))
            })
            .collect::<Result<Vec<f64>, AllocationError>>()?;

        let weight_sum: f64 = weights.iter().sum();
        if !(weight_sum > 0.0) && remaining > 0.0 {
            return Err(AllocationError::DegenerateWeights {
                strategy,
                remaining,
            });
        }

        for (&index, weight) in eligible.iter().zip(&weights) {
            let share = if weight_sum > 0.0 {
                remaining * weight / weight_sum
            } else {
                0.0
            };
            if let Some(individual) = population.get_mut(index) {
                individual.grant = share + policy.flat_amount;
            }
        }

        debug!(
            eligible = eligible.len(),
            remaining,
            weight_sum,
            "Official distribution"
        );

        Ok(StrategyOutcome::Official {
            eligible: eligible.len(),
            top_score_mean,
        })
    }
}

/// Mean score of the best tenth of the eligible individuals
fn top_decile_mean(
    population: &Population,
    eligible: &[usize],
    strategy: &'static str,
) -> Result<f64, AllocationError> {
    let scores = eligible
        .iter()
        .map(|&index| {
            population.as_slice()[index]
                .score
                .ok_or(AllocationError::MissingScore { strategy, index })
        })
        .collect::<Result<Vec<f64>, AllocationError>>()?;

    let best = (eligible.len() / TOP_SCORE_FRACTION).max(1);
    let top = stats::top_mean(&scores, best).ok_or(AllocationError::DegenerateWeights {
        strategy,
        remaining: 0.0,
    })?;

    debug!(
        eligible = eligible.len(),
        best,
        top_mean = top.mean,
        at_or_above = top.at_or_above,
        "Top-decile score mean"
    );

    if !(top.mean > 0.0) {
        return Err(AllocationError::DegenerateWeights {
            strategy,
            remaining: 0.0,
        });
    }
    Ok(top.mean)
}

/// Official formula with the score weight always on
///
/// Used by the feedback loop to close the score → grant → income chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoreWeightedAllocation {
    inner: OfficialAllocation,
}

impl ScoreWeightedAllocation {
    pub const NAME: &'static str = "score-weighted";

    pub fn new() -> Self {
        Self {
            inner: OfficialAllocation::new(ScoreWeighting::TopDecile),
        }
    }
}

impl Default for ScoreWeightedAllocation {
    fn default() -> Self {
        Self::new()
    }
}

impl AllocationStrategy for ScoreWeightedAllocation {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn conservation(&self) -> ConservationPolicy {
        self.inner.conservation()
    }

    fn distribute(
        &self,
        budget: f64,
        policy: &PolicyParameters,
        population: &mut Population,
    ) -> Result<StrategyOutcome, AllocationError> {
        self.inner.distribute(budget, policy, population)
    }
}
