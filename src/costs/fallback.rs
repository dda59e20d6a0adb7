use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::AdjustmentConfig;
use crate::models::{CostSource, TripContext, round_cents};
use crate::sources::baseline::{
    GENERIC_BASELINE, GENERIC_TRANSPORT_PER_DAY, lookup_baseline_costs, lookup_transport_baseline,
};

/// Static baseline for the whole party, scaled towards the user's budget
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BaselineEstimate {
    pub accommodation: f64,
    pub food: f64,
    pub total_per_day: f64,
    pub adjustment_factor: f64,
    pub city_known: bool,
}

impl BaselineEstimate {
    /// Tag reported for figures taken from this estimate
    #[must_use]
    pub fn source(&self) -> CostSource {
        if self.adjustment_factor != 1.0 {
            CostSource::BudgetAdjusted
        } else if self.city_known {
            CostSource::StaticTable
        } else {
            CostSource::GenericDefault
        }
    }
}

/// Resolves static baselines when no live or researched figure exists.
///
/// The implied daily budget (`total_budget / num_days`) is used as a sanity
/// anchor: a budget far above the table pulls the baseline up, one far below
/// pulls it down, within `[min_factor, max_factor]`.
#[derive(Debug, Clone, Default)]
pub struct FallbackResolver {
    adjustment: AdjustmentConfig,
}

impl FallbackResolver {
    #[must_use]
    pub fn new(adjustment: AdjustmentConfig) -> Self {
        Self { adjustment }
    }

    /// Scale factor for a baseline total given the implied daily budget
    #[must_use]
    pub fn adjustment_factor(&self, implied_daily_budget: f64, baseline_total: f64) -> f64 {
        if baseline_total <= 0.0 || !implied_daily_budget.is_finite() {
            return 1.0;
        }

        let a = &self.adjustment;
        let ratio = implied_daily_budget / baseline_total;

        if implied_daily_budget > baseline_total * a.upper_threshold {
            ratio.min(a.max_factor)
        } else if implied_daily_budget < baseline_total * a.lower_threshold {
            ratio.max(a.min_factor)
        } else {
            1.0
        }
    }

    /// Accommodation and food baseline for the party, rounded to cents
    #[must_use]
    pub fn resolve_baseline(&self, ctx: &TripContext) -> BaselineEstimate {
        let city_key = ctx.city_key();
        let known = lookup_baseline_costs(&city_key);
        let per_person = known.unwrap_or(GENERIC_BASELINE);
        let people = f64::from(ctx.num_people());

        let accommodation = per_person.accommodation * people;
        let food = per_person.food * people;
        let baseline_total = accommodation + food;

        let factor = self.adjustment_factor(ctx.implied_daily_budget(), baseline_total);
        let accommodation = round_cents(accommodation * factor);
        let food = round_cents(food * factor);

        debug!(
            city = %city_key,
            city_known = known.is_some(),
            factor,
            "Resolved static baseline"
        );

        BaselineEstimate {
            accommodation,
            food,
            total_per_day: round_cents(accommodation + food),
            adjustment_factor: factor,
            city_known: known.is_some(),
        }
    }

    /// Daily transport for the party. Never budget-adjusted.
    #[must_use]
    pub fn resolve_transport(&self, ctx: &TripContext) -> (f64, CostSource) {
        let people = f64::from(ctx.num_people());
        match lookup_transport_baseline(&ctx.city_key()) {
            Some(per_person) => (round_cents(per_person * people), CostSource::StaticTable),
            None => (
                round_cents(GENERIC_TRANSPORT_PER_DAY * people),
                CostSource::GenericDefault,
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rstest::rstest;

    fn trip(city: &str, people: u32, budget: f64, days: i64) -> TripContext {
        let start = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let end = start + chrono::Duration::days(days - 1);
        TripContext::new(city, start, end, people, budget, "USD").unwrap()
    }

    #[rstest]
    #[case(10_000.0, 100.0, 2.0)]
    #[case(180.0, 100.0, 1.8)]
    #[case(150.0, 100.0, 1.0)]
    #[case(100.0, 100.0, 1.0)]
    #[case(70.0, 100.0, 1.0)]
    #[case(60.0, 100.0, 0.6)]
    #[case(1.0, 100.0, 0.5)]
    fn test_adjustment_factor(#[case] implied: f64, #[case] baseline: f64, #[case] expected: f64) {
        let resolver = FallbackResolver::default();
        let factor = resolver.adjustment_factor(implied, baseline);
        assert!((factor - expected).abs() < 1e-9, "got {factor}");
    }

    #[test]
    fn test_adjustment_factor_always_within_caps() {
        let resolver = FallbackResolver::default();
        for implied in [0.0, 0.01, 1.0, 50.0, 129.0, 130.0, 500.0, 1e9] {
            for baseline in [0.01, 1.0, 130.0, 370.0, 1e6] {
                let factor = resolver.adjustment_factor(implied, baseline);
                assert!((0.5..=2.0).contains(&factor), "{implied}/{baseline} -> {factor}");
            }
        }
    }

    #[test]
    fn test_paris_budget_floor() {
        // 100/day against a 370 baseline clamps to the 0.5 floor
        let baseline = FallbackResolver::default().resolve_baseline(&trip("Paris", 2, 500.0, 5));
        assert_eq!(baseline.adjustment_factor, 0.5);
        assert_eq!(baseline.accommodation, 140.0);
        assert_eq!(baseline.food, 45.0);
        assert_eq!(baseline.total_per_day, 185.0);
        assert_eq!(baseline.source(), CostSource::BudgetAdjusted);
    }

    #[test]
    fn test_paris_budget_1000_scales_by_ratio() {
        let baseline = FallbackResolver::default().resolve_baseline(&trip("Paris", 2, 1000.0, 5));
        assert!((baseline.adjustment_factor - 200.0 / 370.0).abs() < 1e-9);
        assert_eq!(baseline.accommodation, 151.35);
        assert_eq!(baseline.food, 48.65);
        assert_eq!(baseline.total_per_day, 200.0);
        assert!(baseline.city_known);
    }

    #[test]
    fn test_unknown_city_uses_generic_default() {
        // 130/day matches the 100 + 30 generic baseline exactly
        let baseline =
            FallbackResolver::default().resolve_baseline(&trip("Unknown City", 1, 650.0, 5));
        assert_eq!(baseline.accommodation, 100.0);
        assert_eq!(baseline.food, 30.0);
        assert!(!baseline.city_known);
        assert_eq!(baseline.source(), CostSource::GenericDefault);
    }

    #[test]
    fn test_known_city_in_range_is_static() {
        let baseline =
            FallbackResolver::default().resolve_baseline(&trip(" LONDON ", 1, 1000.0, 5));
        assert_eq!(baseline.adjustment_factor, 1.0);
        assert_eq!(baseline.accommodation, 150.0);
        assert_eq!(baseline.source(), CostSource::StaticTable);
    }

    #[test]
    fn test_custom_thresholds() {
        let resolver = FallbackResolver::new(AdjustmentConfig {
            upper_threshold: 1.1,
            lower_threshold: 0.9,
            max_factor: 3.0,
            min_factor: 0.25,
        });
        assert_eq!(resolver.adjustment_factor(300.0, 100.0), 3.0);
        assert_eq!(resolver.adjustment_factor(10.0, 100.0), 0.25);
        assert_eq!(resolver.adjustment_factor(105.0, 100.0), 1.0);
    }

    #[rstest]
    #[case("Dubai", 2, 50.0, CostSource::StaticTable)]
    #[case("Atlantis", 3, 24.0, CostSource::GenericDefault)]
    fn test_transport(
        #[case] city: &str,
        #[case] people: u32,
        #[case] expected: f64,
        #[case] source: CostSource,
    ) {
        let (amount, tag) =
            FallbackResolver::default().resolve_transport(&trip(city, people, 10.0, 1));
        assert_eq!(amount, expected);
        assert_eq!(tag, source);
    }
}
