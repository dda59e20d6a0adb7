use tracing::debug;

use crate::config::BudgetConfig;
use crate::models::{
    AggregatedDailyCost, BudgetAllocations, BudgetPlan, BudgetStatus, PriceRange, TripContext,
    round_cents,
};

/// Splits a total budget into fixed-percentage allocations and judges an
/// estimate against it. Pure; no failure modes.
#[derive(Debug, Clone, Default)]
pub struct BudgetComposer {
    split: BudgetConfig,
}

impl BudgetComposer {
    #[must_use]
    pub fn new(split: BudgetConfig) -> Self {
        Self { split }
    }

    #[must_use]
    pub fn compute_budget_plan(&self, ctx: &TripContext) -> BudgetPlan {
        let total = ctx.total_budget();
        let share = |pct: f64| total * (pct / 100.0);

        let allocations = BudgetAllocations {
            accommodation: share(self.split.accommodation_pct),
            food: share(self.split.food_pct),
            travel: share(self.split.travel_pct),
            leisure: share(self.split.leisure_pct),
        };

        let per_night_budget = allocations.accommodation / f64::from(ctx.num_days());
        let tolerance = self.split.per_night_tolerance;

        debug!(total, per_night_budget, "Composed budget plan");

        BudgetPlan {
            total_budget: total,
            daily_budget: ctx.implied_daily_budget(),
            allocations,
            per_night_budget,
            per_night_range: PriceRange {
                lower: round_cents(per_night_budget * (1.0 - tolerance)),
                upper: round_cents(per_night_budget * (1.0 + tolerance)),
            },
        }
    }

    /// Within budget iff the implied daily budget covers the estimated total
    #[must_use]
    pub fn evaluate_budget_status(
        &self,
        ctx: &TripContext,
        daily_cost: &AggregatedDailyCost,
    ) -> BudgetStatus {
        let implied = ctx.implied_daily_budget();
        let estimated = daily_cost.total_per_day();
        BudgetStatus {
            within_budget: implied >= estimated,
            implied_daily_budget: implied,
            estimated_daily_cost: estimated,
        }
    }
}
