use std::time::Duration;

use tracing::{debug, info, instrument};

use super::fallback::FallbackResolver;
use crate::config::TripCostConfig;
use crate::models::{
    AggregatedDailyCost, CostCategory, CostEstimate, CostSource, CostUnit, TripContext,
    round_cents,
};
use crate::sources::{self, HotelPriceQuote, LlmCostResearch, RestaurantPrice, SourceSet};

const MEALS_PER_DAY: f64 = 3.0;

/// Combines live, researched and static figures into one daily cost.
///
/// Per category the first available figure wins:
///
/// | category      | 1st              | 2nd          | 3rd                     |
/// |---------------|------------------|--------------|-------------------------|
/// | accommodation | live hotel price | LLM research | static/generic baseline |
/// | food          | restaurant levels| LLM research | static/generic baseline |
/// | transport     | static table     | LLM research | generic default         |
#[derive(Clone)]
pub struct CostAggregator {
    sources: SourceSet,
    timeout: Duration,
    resolver: FallbackResolver,
}

impl CostAggregator {
    pub fn new(sources: SourceSet, timeout: Duration, resolver: FallbackResolver) -> Self {
        Self {
            sources,
            timeout,
            resolver,
        }
    }

    pub fn from_config(config: &TripCostConfig, sources: SourceSet) -> Self {
        Self::new(
            sources,
            Duration::from_secs(config.http.adapter_timeout_seconds.into()),
            FallbackResolver::new(config.adjustment.clone()),
        )
    }

    /// Never fails: every category resolves, at worst to the generic default
    #[instrument(
        skip(self, ctx),
        fields(city = %ctx.city(), people = ctx.num_people(), days = ctx.num_days())
    )]
    pub async fn compute_aggregated_daily_cost(&self, ctx: &TripContext) -> AggregatedDailyCost {
        let (hotel, restaurants, research) = tokio::join!(
            self.live_hotel_price(ctx),
            self.restaurant_prices(ctx),
            self.llm_research(ctx),
        );

        let people = f64::from(ctx.num_people());
        let baseline = self.resolver.resolve_baseline(ctx);
        let baseline_source = baseline.source();

        let accommodation = hotel
            .map(|quote| (quote.avg_price_per_night, CostSource::LiveApi))
            .or_else(|| {
                research
                    .as_ref()
                    .map(|r| (r.accommodation_per_night, CostSource::LlmResearch))
            })
            .unwrap_or((baseline.accommodation, baseline_source));

        let food = restaurants
            .as_deref()
            .and_then(food_per_person_from_restaurants)
            .map(|per_person| (per_person * people, CostSource::LiveApi))
            .or_else(|| {
                research
                    .as_ref()
                    .map(|r| (r.food_per_day * people, CostSource::LlmResearch))
            })
            .unwrap_or((baseline.food, baseline_source));

        let transport = match self.resolver.resolve_transport(ctx) {
            (amount, CostSource::StaticTable) => (amount, CostSource::StaticTable),
            generic => research
                .as_ref()
                .map(|r| (r.transport_per_day * people, CostSource::LlmResearch))
                .unwrap_or(generic),
        };

        let daily = AggregatedDailyCost::new(
            estimate(CostCategory::Accommodation, accommodation, CostUnit::PerNight),
            estimate(CostCategory::Food, food, CostUnit::PerPersonPerDay),
            estimate(CostCategory::Transport, transport, CostUnit::PerPersonPerDay),
        );

        info!(
            total_per_day = daily.total_per_day(),
            sources = ?daily.contributing_sources(),
            "Aggregated daily cost"
        );
        daily
    }

    async fn live_hotel_price(&self, ctx: &TripContext) -> Option<HotelPriceQuote> {
        let source = self.sources.hotels.as_ref()?;
        let check_out = ctx.end_date().succ_opt().unwrap_or(ctx.end_date());
        sources::query(
            source.name(),
            self.timeout,
            source.fetch_live_hotel_price(
                ctx.city(),
                ctx.start_date(),
                check_out,
                ctx.num_people(),
            ),
        )
        .await
    }

    async fn restaurant_prices(&self, ctx: &TripContext) -> Option<Vec<RestaurantPrice>> {
        let source = self.sources.restaurants.as_ref()?;
        sources::query(
            source.name(),
            self.timeout,
            source.fetch_restaurant_price_levels(ctx.city()),
        )
        .await
    }

    async fn llm_research(&self, ctx: &TripContext) -> Option<LlmCostResearch> {
        let source = self.sources.research.as_ref()?;
        sources::query(
            source.name(),
            self.timeout,
            source.fetch_llm_cost_research(ctx.city(), ctx.num_people(), ctx.num_days()),
        )
        .await
    }
}

/// Mean sampled meal price times three meals
fn food_per_person_from_restaurants(sample: &[RestaurantPrice]) -> Option<f64> {
    if sample.is_empty() {
        return None;
    }
    let mean = sample.iter().map(|r| r.estimated_cost_per_meal).sum::<f64>() / sample.len() as f64;
    debug!(restaurants = sample.len(), mean_meal = mean, "Derived food cost");
    Some(mean * MEALS_PER_DAY)
}

fn estimate(
    category: CostCategory,
    (amount, source): (f64, CostSource),
    unit: CostUnit,
) -> CostEstimate {
    CostEstimate::new(category, round_cents(amount), source, unit)
}
