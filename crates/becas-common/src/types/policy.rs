//! Grant policy parameters

use serde::{Deserialize, Serialize};

use crate::{COST_OF_STUDY, FLAT_AMOUNT, INCOME_CEILING, POVERTY_FLOOR};

/// Policy constants shared by the strategies and the metrics
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PolicyParameters {
    /// Per-capita income ceiling for variable grants
    pub ceiling: f64,
    /// Poverty floor
    pub floor: f64,
    /// Cost of continuing studies
    pub cost_of_study: f64,
    /// Flat amount paid to every eligible individual
    pub flat_amount: f64,
}

impl Default for PolicyParameters {
    fn default() -> Self {
        Self {
            ceiling: INCOME_CEILING,
            floor: POVERTY_FLOOR,
            cost_of_study: COST_OF_STUDY,
            flat_amount: FLAT_AMOUNT,
        }
    }
}

impl PolicyParameters {
    /// Income at which an individual can afford to keep studying
    #[inline]
    pub fn sufficiency_threshold(&self) -> f64 {
        self.floor + self.cost_of_study
    }
}
