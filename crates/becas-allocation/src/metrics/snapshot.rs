//! Metrics engine and the per-period record it produces

use becas_common::{stats, PolicyParameters, Population, StatsError};
use serde::{Deserialize, Serialize};

/// Series correlated against the academic score
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CorrelationTarget {
    /// Pre-grant income
    #[default]
    Income,
    /// Grant received this period
    Grant,
}

/// One metrics snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodMetrics {
    /// (below, at or above) `floor + cost_of_study`, over post-grant income
    pub coverage_sufficiency: (f64, f64),
    /// (below, at or above) `floor`, over post-grant income
    pub coverage_floor: (f64, f64),
    /// Gini of post-grant income
    pub gini_total: f64,
    pub count_sufficient: usize,
    pub count_poor: usize,
    /// Pearson correlation with score; `None` when undefined
    pub correlation: Option<f64>,
    pub mean_total: f64,
    pub std_dev_total: f64,
}

impl PeriodMetrics {
    /// Comma-separated line in the historical report layout:
    /// `below_T, above_T, below_floor, above_floor, gini, sufficient, poor, correlation`
    pub fn to_csv_line(&self) -> String {
        let correlation = match self.correlation {
            Some(r) => format!("{:.6}", r),
            None => "NaN".to_string(),
        };
        format!(
            "{:.6}, {:.6}, {:.6}, {:.6}, {:.6}, {}, {}, {}",
            self.coverage_sufficiency.0,
            self.coverage_sufficiency.1,
            self.coverage_floor.0,
            self.coverage_floor.1,
            self.gini_total,
            self.count_sufficient,
            self.count_poor,
            correlation
        )
    }
}

/// Read-only measurements under a fixed policy
#[derive(Debug, Clone, Default)]
pub struct MetricsEngine {
    policy: PolicyParameters,
    correlation_target: CorrelationTarget,
}

impl MetricsEngine {
    pub fn new(policy: PolicyParameters) -> Self {
        Self {
            policy,
            correlation_target: CorrelationTarget::default(),
        }
    }

    pub fn with_correlation_target(mut self, target: CorrelationTarget) -> Self {
        self.correlation_target = target;
        self
    }

    pub fn policy(&self) -> &PolicyParameters {
        &self.policy
    }

    /// Fractions of post-grant incomes below / at or above `level`
    pub fn coverage(&self, population: &Population, level: f64) -> (f64, f64) {
        stats::coverage(&population.totals(), level)
    }

    /// Gini of post-grant income
    pub fn gini_total(&self, population: &Population) -> f64 {
        stats::gini(&population.totals())
    }

    /// Gini of pre-grant income
    pub fn gini_income(&self, population: &Population) -> f64 {
        stats::gini(&population.incomes())
    }

    /// Individuals who can afford to keep studying
    pub fn count_sufficient(&self, population: &Population) -> usize {
        let threshold = self.policy.sufficiency_threshold();
        population.iter().filter(|i| i.reaches(threshold)).count()
    }

    /// Individuals still under the poverty floor
    pub fn count_poor(&self, population: &Population) -> usize {
        population
            .iter()
            .filter(|i| i.total() < self.policy.floor)
            .count()
    }

    /// Total shortfall under the poverty floor
    pub fn poverty_gap(&self, population: &Population) -> f64 {
        population
            .iter()
            .map(|i| (self.policy.floor - i.total()).max(0.0))
            .sum()
    }

    /// Sum of all grants currently assigned
    pub fn total_granted(&self, population: &Population) -> f64 {
        population.total_granted()
    }

    /// Pearson correlation between the configured series and score
    ///
    /// Individuals without a score are left out.
    pub fn correlation(&self, population: &Population) -> Result<f64, StatsError> {
        let (series, scores): (Vec<f64>, Vec<f64>) = population
            .iter()
            .filter_map(|i| {
                let value = match self.correlation_target {
                    CorrelationTarget::Income => i.income,
                    CorrelationTarget::Grant => i.grant,
                };
                i.score.map(|score| (value, score))
            })
            .unzip();
        stats::pearson(&series, &scores)
    }

    /// Mean and population standard deviation of post-grant income
    pub fn mean_and_std_dev(&self, population: &Population) -> (f64, f64) {
        let totals = population.totals();
        (stats::mean(&totals), stats::population_std_dev(&totals))
    }

    /// Full snapshot
    pub fn snapshot(&self, population: &Population) -> PeriodMetrics {
        let (mean_total, std_dev_total) = self.mean_and_std_dev(population);
        PeriodMetrics {
            coverage_sufficiency: self.coverage(population, self.policy.sufficiency_threshold()),
            coverage_floor: self.coverage(population, self.policy.floor),
            gini_total: self.gini_total(population),
            count_sufficient: self.count_sufficient(population),
            count_poor: self.count_poor(population),
            correlation: self.correlation(population).ok(),
            mean_total,
            std_dev_total,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use becas_common::Individual;

    fn policy() -> PolicyParameters {
        PolicyParameters {
            floor: 100.0,
            cost_of_study: 50.0,
            ..PolicyParameters::default()
        }
    }

    fn population() -> Population {
        let mut population = Population::new(vec![
            Individual::with_score(40.0, 3.0),
            Individual::with_score(90.0, 5.0),
            Individual::with_score(160.0, 8.0),
            Individual::with_score(200.0, 9.0),
        ]);
        if let Some(second) = population.get_mut(1) {
            second.grant = 20.0;
        }
        population
    }

    #[test]
    fn test_counts_and_coverage() {
        let metrics = MetricsEngine::new(policy());
        let population = population();

        // Totals: 40, 110, 160, 200
        assert_eq!(metrics.count_poor(&population), 1);
        assert_eq!(metrics.count_sufficient(&population), 2);
        assert_eq!(metrics.coverage(&population, 150.0), (0.5, 0.5));
        assert_eq!(metrics.coverage(&population, 100.0), (0.25, 0.75));
        assert_eq!(metrics.poverty_gap(&population), 60.0);
        assert_eq!(metrics.total_granted(&population), 20.0);
    }

    #[test]
    fn test_correlation_targets() {
        let population = population();

        let income = MetricsEngine::new(policy()).correlation(&population).unwrap();
        assert!(income > 0.9);

        // Only one non-zero grant; still a defined correlation
        let grant = MetricsEngine::new(policy())
            .with_correlation_target(CorrelationTarget::Grant)
            .correlation(&population)
            .unwrap();
        assert!(grant.abs() < 1.0);
    }

    #[test]
    fn test_correlation_undefined_without_scores() {
        let metrics = MetricsEngine::new(policy());
        let population = Population::from_incomes(&[1.0, 2.0, 3.0]);

        assert!(metrics.correlation(&population).is_err());
        assert_eq!(metrics.snapshot(&population).correlation, None);
    }

    #[test]
    fn test_metrics_do_not_mutate() {
        let metrics = MetricsEngine::new(policy());
        let population = population();
        let before = population.clone();

        let _ = metrics.snapshot(&population);
        assert_eq!(population, before);
    }

    #[test]
    fn test_csv_line_layout() {
        let snapshot = PeriodMetrics {
            coverage_sufficiency: (0.25, 0.75),
            coverage_floor: (0.1, 0.9),
            gini_total: 0.3,
            count_sufficient: 750,
            count_poor: 100,
            correlation: None,
            mean_total: 0.0,
            std_dev_total: 0.0,
        };

        assert_eq!(
            snapshot.to_csv_line(),
            "0.250000, 0.750000, 0.100000, 0.900000, 0.300000, 750, 100, NaN"
        );
    }
}
