//! Push-to-threshold allocation
//!
//! Lifts individuals to `T = floor + cost_of_study`, cheapest first: the
//! scan walks the sorted incomes from the top of the below-`T` tier down,
//! paying each deficit until the next one no longer fits the budget. Everyone
//! at or above the resulting cutoff (and still under `T`) is topped up to `T`;
//! everyone under the cutoff gets nothing, so when money runs short the very
//! poorest are the ones left out.
//!
//! The cutoff is an income value, so ties around it and a budget that is
//! never fully used make the grants miss the budget. The mismatch is reported,
//! not treated as a defect.

use becas_common::{AllocationError, PolicyParameters, Population};
use tracing::debug;

use super::{AllocationStrategy, ConservationPolicy, StrategyOutcome};

/// Tops up whoever is closest to the sufficiency threshold
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PushAllocation;

impl PushAllocation {
    pub const NAME: &'static str = "push";
}

/// Lowest income still funded when pushing `sorted` incomes up to `threshold`
///
/// Returns the lowest income when every deficit fits in the budget, and
/// `f64::INFINITY` when not even the richest below-threshold deficit fits at
/// the top of the array.
pub fn push_cutoff(sorted: &[f64], budget: f64, threshold: f64) -> f64 {
    let mut remaining = budget;

    for j in (0..sorted.len()).rev() {
        let deficit = threshold - sorted[j];
        if deficit <= 0.0 {
            continue;
        }
        if remaining < deficit {
            return sorted.get(j + 1).copied().unwrap_or(f64::INFINITY);
        }
        remaining -= deficit;
    }

    sorted.first().copied().unwrap_or(f64::INFINITY)
}

impl AllocationStrategy for PushAllocation {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn conservation(&self) -> ConservationPolicy {
        ConservationPolicy::Lenient
    }

    fn distribute(
        &self,
        budget: f64,
        policy: &PolicyParameters,
        population: &mut Population,
    ) -> Result<StrategyOutcome, AllocationError> {
        let threshold = policy.sufficiency_threshold();
        let cutoff = push_cutoff(&population.sorted_incomes(), budget, threshold);

        let mut funded = 0;
        for individual in population.iter_mut() {
            if individual.income < cutoff {
                continue;
            }
            let deficit = threshold - individual.income;
            if deficit > 0.0 {
                individual.grant = deficit;
                funded += 1;
            }
        }

        debug!(cutoff, funded, threshold, "Push cutoff");
        Ok(StrategyOutcome::Push { cutoff, funded })
    }
}
