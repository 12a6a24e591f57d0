//! Population - the ordered set of modeled individuals
//!
//! One `Population` is generated per simulation and owned by the driver.
//! Each phase (allocation, measurement, feedback updates) borrows it for the
//! duration of a single call, so no phase can hold on to it past its turn.

use serde::{Deserialize, Serialize};

use super::individual::Individual;

/// Ordered, mutable sequence of individuals
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Population {
    individuals: Vec<Individual>,
}

impl Population {
    /// Wrap an existing set of individuals
    pub fn new(individuals: Vec<Individual>) -> Self {
        Self { individuals }
    }

    /// Build a score-less population from incomes
    pub fn from_incomes(incomes: &[f64]) -> Self {
        incomes.iter().copied().map(Individual::new).collect()
    }

    /// Build a population from paired incomes and scores
    pub fn from_incomes_and_scores(incomes: &[f64], scores: &[f64]) -> Self {
        incomes
            .iter()
            .zip(scores)
            .map(|(&income, &score)| Individual::with_score(income, score))
            .collect()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.individuals.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.individuals.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Individual> {
        self.individuals.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Individual> {
        self.individuals.iter_mut()
    }

    pub fn as_slice(&self) -> &[Individual] {
        &self.individuals
    }

    pub fn get(&self, index: usize) -> Option<&Individual> {
        self.individuals.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Individual> {
        self.individuals.get_mut(index)
    }

    /// Set every grant back to zero
    pub fn reset_grants(&mut self) {
        for individual in &mut self.individuals {
            individual.grant = 0.0;
        }
    }

    /// Pre-grant incomes, in population order
    pub fn incomes(&self) -> Vec<f64> {
        self.individuals.iter().map(|i| i.income).collect()
    }

    /// Grants, in population order
    pub fn grants(&self) -> Vec<f64> {
        self.individuals.iter().map(|i| i.grant).collect()
    }

    /// Post-grant incomes, in population order
    pub fn totals(&self) -> Vec<f64> {
        self.individuals.iter().map(Individual::total).collect()
    }

    /// Working copy of the incomes sorted ascending
    pub fn sorted_incomes(&self) -> Vec<f64> {
        let mut incomes = self.incomes();
        incomes.sort_by(f64::total_cmp);
        incomes
    }

    /// Sum of all grants
    pub fn total_granted(&self) -> f64 {
        self.individuals.iter().map(|i| i.grant).sum()
    }
}

impl From<Vec<Individual>> for Population {
    fn from(individuals: Vec<Individual>) -> Self {
        Self::new(individuals)
    }
}

impl FromIterator<Individual> for Population {
    fn from_iter<T: IntoIterator<Item = Individual>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Population {
    type Item = &'a Individual;
    type IntoIter = std::slice::Iter<'a, Individual>;

    fn into_iter(self) -> Self::IntoIter {
        self.individuals.iter()
    }
}

impl<'a> IntoIterator for &'a mut Population {
    type Item = &'a mut Individual;
    type IntoIter = std::slice::IterMut<'a, Individual>;

    fn into_iter(self) -> Self::IntoIter {
        self.individuals.iter_mut()
    }
}
