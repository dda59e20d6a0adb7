//! Budget plan models

use serde::{Deserialize, Serialize};

/// Total budget split into spending buckets
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BudgetAllocations {
    pub accommodation: f64,
    pub food: f64,
    pub travel: f64,
    pub leisure: f64,
}

impl BudgetAllocations {
    #[must_use]
    pub fn total(&self) -> f64 {
        self.accommodation + self.food + self.travel + self.leisure
    }
}

/// Acceptable nightly price band handed to hotel searches
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceRange {
    pub lower: f64,
    pub upper: f64,
}

impl PriceRange {
    #[must_use]
    pub fn contains(&self, price: f64) -> bool {
        (self.lower..=self.upper).contains(&price)
    }
}

/// Deterministic allocation of a trip budget
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BudgetPlan {
    pub total_budget: f64,
    pub daily_budget: f64,
    pub allocations: BudgetAllocations,
    pub per_night_budget: f64,
    pub per_night_range: PriceRange,
}

/// Budget-vs-estimate verdict
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BudgetStatus {
    pub within_budget: bool,
    pub implied_daily_budget: f64,
    pub estimated_daily_cost: f64,
}

impl BudgetStatus {
    /// Human-readable verdict
    #[must_use]
    pub fn verdict(&self) -> &'static str {
        if self.within_budget {
            "within budget"
        } else {
            "may exceed budget"
        }
    }
}
