//! Water-level ("reservoir") allocation: the Gini-minimising split
//!
//! Picture the sorted incomes as a terrain and the budget as water poured on
//! it. The water settles at the level where filling every lower income up to
//! it costs exactly the budget:
//!
//! ```text
//! cost_i = (h[i] - h[i-1]) · i          i = 1..N-1, h sorted ascending
//! level  = h[i-1] + remaining / i       at the first tier the budget can't fill
//! ```

use becas_common::{AllocationError, PolicyParameters, Population, LEVEL_TOLERANCE};
use tracing::debug;

use super::{AllocationStrategy, ConservationPolicy, StrategyOutcome};

/// Raises the lowest incomes to a common level
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WaterLevelAllocation;

impl WaterLevelAllocation {
    pub const NAME: &'static str = "water-level";
}

/// Level reached by pouring `budget` over `sorted` incomes
///
/// `sorted` must be ascending. `None` for an empty slice.
pub fn water_level(sorted: &[f64], budget: f64) -> Option<f64> {
    sorted.first()?;
    let mut remaining = budget;
    let mut filled = 1;

    while filled < sorted.len() {
        let cost = (sorted[filled] - sorted[filled - 1]) * filled as f64;
        if remaining < cost {
            break;
        }
        remaining -= cost;
        filled += 1;
    }

    Some(sorted[filled - 1] + remaining / filled as f64)
}

/// Slack allowed on `income + grant >= level`
///
/// Absolute for ordinary incomes, a few ULPs of the level for large ones.
fn floor_tolerance(level: f64) -> f64 {
    LEVEL_TOLERANCE.max(level.abs() * f64::EPSILON * 4.0)
}

impl AllocationStrategy for WaterLevelAllocation {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn conservation(&self) -> ConservationPolicy {
        ConservationPolicy::Strict
    }

    fn distribute(
        &self,
        budget: f64,
        _policy: &PolicyParameters,
        population: &mut Population,
    ) -> Result<StrategyOutcome, AllocationError> {
        let level = water_level(&population.sorted_incomes(), budget)
            .ok_or(AllocationError::EmptyPopulation)?;
        debug!(level, budget, "Water level reached");

        // Full deficits in population order; rounding drift in the total is
        // left to the engine's conservation check.
        for individual in population.iter_mut() {
            let deficit = level - individual.income;
            if deficit > 0.0 {
                individual.grant = deficit;
            }
        }

        Ok(StrategyOutcome::WaterLevel { level })
    }

    fn verify(
        &self,
        population: &Population,
        outcome: &StrategyOutcome,
    ) -> Result<(), AllocationError> {
        let StrategyOutcome::WaterLevel { level } = *outcome else {
            return Ok(());
        };

        match population
            .iter()
            .enumerate()
            .find(|(_, individual)| individual.total() < level - floor_tolerance(level))
        {
            Some((index, individual)) => Err(AllocationError::FloorBreached {
                strategy: Self::NAME,
                index,
                total: individual.total(),
                level,
            }),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::AllocationEngine;

    #[test]
    fn test_three_individual_example() {
        let engine = AllocationEngine::default();
        let mut population = Population::from_incomes(&[0.0, 10.0, 20.0]);

        let info = engine
            .allocate(&WaterLevelAllocation, 15.0, &mut population)
            .unwrap();

        assert_eq!(info.outcome, StrategyOutcome::WaterLevel { level: 12.5 });
        assert_eq!(population.grants(), vec![12.5, 2.5, 0.0]);
        assert_eq!(info.distributed, 15.0);
    }

    #[test]
    fn test_unsorted_population_order() {
        let engine = AllocationEngine::default();
        let mut population = Population::from_incomes(&[20.0, 0.0, 10.0]);

        engine
            .allocate(&WaterLevelAllocation, 15.0, &mut population)
            .unwrap();
        assert_eq!(population.grants(), vec![0.0, 12.5, 2.5]);
    }

    #[test]
    fn test_budget_fills_every_tier() {
        // 10 + 20 = 30 fills everyone to 20; 30 more spreads over three
        let level = water_level(&[0.0, 10.0, 20.0], 60.0);
        assert_eq!(level, Some(30.0));
    }

    #[test]
    fn test_empty_incomes_have_no_level() {
        assert_eq!(water_level(&[], 10.0), None);
        assert!(matches!(
            WaterLevelAllocation.distribute(
                10.0,
                &PolicyParameters::default(),
                &mut Population::default()
            ),
            Err(AllocationError::EmptyPopulation)
        ));
    }

    #[test]
    fn test_large_incomes_absorb_rounding_drift() {
        // Incomes in the millions: summed deficits land a few ULPs off the
        // budget, which must not be reported as a floor breach
        let engine = AllocationEngine::default();
        for (seed, scale) in [(4, 1_000.0), (7, 3_000.0), (11, 10_000.0)] {
            let incomes: Vec<f64> = becas_common::PopulationGenerator::new(1_000)
                .generate_seeded(seed)
                .incomes()
                .into_iter()
                .map(|income| income * scale)
                .collect();
            let mut population = Population::from_incomes(&incomes);
            let budget = 2_300.0 * 1_000.0 * scale;

            let info = engine
                .allocate(&WaterLevelAllocation, budget, &mut population)
                .unwrap();
            let StrategyOutcome::WaterLevel { level } = info.outcome else {
                panic!("unexpected outcome");
            };
            assert!((info.distributed - budget).abs() <= 1e-3);
            assert!(population
                .iter()
                .all(|i| i.total() >= level - floor_tolerance(level)));
        }
    }

    #[test]
    fn test_single_individual() {
        let engine = AllocationEngine::default();
        let mut population = Population::from_incomes(&[500.0]);

        let info = engine
            .allocate(&WaterLevelAllocation, 100.0, &mut population)
            .unwrap();
        assert_eq!(info.outcome, StrategyOutcome::WaterLevel { level: 600.0 });
        assert_eq!(population.grants(), vec![100.0]);
    }

    #[test]
    fn test_zero_budget() {
        let engine = AllocationEngine::default();
        let mut population = Population::from_incomes(&[3.0, 3.0, 7.0]);

        let info = engine
            .allocate(&WaterLevelAllocation, 0.0, &mut population)
            .unwrap();
        assert_eq!(info.outcome, StrategyOutcome::WaterLevel { level: 3.0 });
        assert_eq!(info.distributed, 0.0);
    }

    #[test]
    fn test_payable_tail_is_funded() {
        // The last payable individual is owed less than a cent: still paid
        let engine = AllocationEngine::default();
        let mut population = Population::from_incomes(&[0.0, 9.95]);

        let info = engine
            .allocate(&WaterLevelAllocation, 10.05, &mut population)
            .unwrap();
        let StrategyOutcome::WaterLevel { level } = info.outcome else {
            panic!("unexpected outcome");
        };
        assert!((level - 10.0).abs() < 1e-9);
        assert!((population.grants()[1] - 0.05).abs() < 1e-9);
        assert!((info.distributed - 10.05).abs() < 1e-9);
    }

    #[test]
    fn test_floor_breach_detected() {
        let mut population = Population::from_incomes(&[0.0, 10.0]);
        if let Some(first) = population.get_mut(0) {
            first.grant = 4.0;
        }

        let err = WaterLevelAllocation
            .verify(&population, &StrategyOutcome::WaterLevel { level: 5.0 })
            .unwrap_err();
        assert!(matches!(err, AllocationError::FloorBreached { index: 0, .. }));
    }
}
