//! Stochastic update rules applied between allocations
//!
//! ```text
//! exam:   score  *= 1 + U(-e, e) + w · (min(income / T, cap) - 1)     clip [0, 10]
//! income: income *= 1 + (score - 5) / d + U(-n, n)                   clip >= 0
//! ```
//!
//! With the defaults a score of 0 costs 10% of income a year and a 10 adds
//! 10%, both with ±10% noise; income at twice `T` lifts scores 10%.

use becas_common::{types::individual::clip_score, Population};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Coefficients of the exam and income update rules
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeedbackRules {
    /// Half-width of the uniform noise on the score factor
    pub exam_noise: f64,
    /// Weight of the income term on the score factor
    pub exam_income_weight: f64,
    /// Cap on income / T in the score factor
    pub exam_income_cap: f64,
    /// Half-width of the uniform noise on the income factor
    pub income_noise: f64,
    /// Score at which income does not drift
    pub neutral_score: f64,
    /// Divisor of the score term on the income factor
    pub income_score_divisor: f64,
}

impl Default for FeedbackRules {
    fn default() -> Self {
        Self {
            exam_noise: 0.1,
            exam_income_weight: 0.1,
            exam_income_cap: 2.0,
            income_noise: 0.1,
            neutral_score: 5.0,
            income_score_divisor: 50.0,
        }
    }
}

impl FeedbackRules {
    /// Scores drift with income relative to the sufficiency threshold
    ///
    /// Individuals without a score are left unchanged.
    pub fn apply_exam<R: Rng + ?Sized>(
        &self,
        population: &mut Population,
        threshold: f64,
        rng: &mut R,
    ) {
        for individual in population.iter_mut() {
            let Some(score) = individual.score else {
                continue;
            };
            let ratio = if threshold > 0.0 {
                (individual.income / threshold).min(self.exam_income_cap)
            } else {
                self.exam_income_cap
            };
            let factor = 1.0
                + symmetric_noise(rng, self.exam_noise)
                + self.exam_income_weight * (ratio - 1.0);
            individual.score = Some(clip_score(score * factor));
        }
    }

    /// Incomes drift with score
    ///
    /// A missing score counts as the neutral score.
    pub fn apply_income<R: Rng + ?Sized>(&self, population: &mut Population, rng: &mut R) {
        for individual in population.iter_mut() {
            let score = individual.score.unwrap_or(self.neutral_score);
            let factor = 1.0
                + (score - self.neutral_score) / self.income_score_divisor
                + symmetric_noise(rng, self.income_noise);
            individual.income = (individual.income * factor).max(0.0);
        }
    }
}

/// Uniform draw in `[-width, width)`; zero when the width is not positive
fn symmetric_noise<R: Rng + ?Sized>(rng: &mut R, width: f64) -> f64 {
    if width > 0.0 {
        rng.gen_range(-width..width)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use becas_common::Individual;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn quiet() -> FeedbackRules {
        FeedbackRules {
            exam_noise: 0.0,
            income_noise: 0.0,
            ..FeedbackRules::default()
        }
    }

    #[test]
    fn test_exam_without_noise() {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let mut population = Population::new(vec![
            Individual::with_score(0.0, 5.0),
            Individual::with_score(100.0, 5.0),
            Individual::with_score(1000.0, 5.0),
            Individual::with_score(1000.0, 9.5),
            Individual::new(1000.0),
        ]);

        quiet().apply_exam(&mut population, 100.0, &mut rng);

        let scores: Vec<Option<f64>> = population.iter().map(|i| i.score).collect();
        // income 0 -> factor 0.9; at T -> 1.0; capped at 2T -> 1.1
        assert!((scores[0].unwrap() - 4.5).abs() < 1e-12);
        assert!((scores[1].unwrap() - 5.0).abs() < 1e-12);
        assert!((scores[2].unwrap() - 5.5).abs() < 1e-12);
        assert_eq!(scores[3], Some(10.0));
        assert_eq!(scores[4], None);
    }

    #[test]
    fn test_income_without_noise() {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let mut population = Population::new(vec![
            Individual::with_score(1000.0, 0.0),
            Individual::with_score(1000.0, 10.0),
            Individual::new(1000.0),
        ]);

        quiet().apply_income(&mut population, &mut rng);

        let incomes = population.incomes();
        assert!((incomes[0] - 900.0).abs() < 1e-9);
        assert!((incomes[1] - 1100.0).abs() < 1e-9);
        assert!((incomes[2] - 1000.0).abs() < 1e-9);
    }

    #[test]
    fn test_noise_stays_in_band() {
        let mut rng = ChaCha8Rng::seed_from_u64(99);
        let rules = FeedbackRules::default();
        let mut population = Population::new(
            (0..500).map(|_| Individual::with_score(1000.0, 5.0)).collect(),
        );

        rules.apply_income(&mut population, &mut rng);
        for income in population.incomes() {
            assert!((900.0..=1100.0).contains(&income));
        }
    }

    #[test]
    fn test_updates_grant_untouched() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let mut population = Population::from_incomes_and_scores(&[10.0, 20.0], &[4.0, 6.0]);
        for individual in population.iter_mut() {
            individual.grant = 3.0;
        }

        let rules = FeedbackRules::default();
        rules.apply_exam(&mut population, 9600.0, &mut rng);
        rules.apply_income(&mut population, &mut rng);
        assert_eq!(population.grants(), vec![3.0, 3.0]);
    }
}
