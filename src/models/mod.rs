//! Data models for `TripCost`
//!
//! - Trip: raw request and the validated, read-only trip context
//! - Cost: per-category estimates and the aggregated daily cost
//! - Budget: allocation plan and budget-vs-estimate verdict

pub mod budget;
pub mod cost;
pub mod trip;

pub use budget::{BudgetAllocations, BudgetPlan, BudgetStatus, PriceRange};
pub use cost::{AggregatedDailyCost, CostCategory, CostEstimate, CostSource, CostUnit};
pub use trip::{TripContext, TripRequest};

/// Round a monetary amount to cents
#[must_use]
pub fn round_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}
