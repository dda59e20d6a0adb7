//! Request-scoped trip planning
//!
//! [`TripPlanner::plan`] validates the request, then runs cost aggregation,
//! the lodging search, the weather lookup and currency resolution
//! concurrently and folds the results into one [`TripReport`].

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::Result;
use crate::cache::PersistentCache;
use crate::config::TripCostConfig;
use crate::costs::{BudgetComposer, CostAggregator, CurrencyResolver, ExchangeQuote};
use crate::models::{
    AggregatedDailyCost, BudgetPlan, BudgetStatus, PriceRange, TripContext, TripRequest,
    round_cents,
};
use crate::sources::currency::convert_currency;
use crate::sources::{self, LodgingSource, PlaceSummary, SourceSet, WeatherSource};

/// Budgets and estimates are expressed in this currency
pub const BASE_CURRENCY: &str = "USD";

/// Current conditions plus one entry per trip date
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherOutlook {
    pub current: Option<String>,
    /// `None` where the forecast does not reach
    pub daily: Vec<(NaiveDate, Option<String>)>,
}

/// Everything known about one planned trip
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripReport {
    pub context: TripContext,
    pub daily_cost: AggregatedDailyCost,
    pub budget_plan: BudgetPlan,
    pub budget_status: BudgetStatus,
    /// Places whose nightly price falls inside the per-night budget band
    pub hotel_options: Vec<PlaceSummary>,
    pub exchange: ExchangeQuote,
    /// Total budget converted into the target currency
    pub local_total_budget: f64,
    pub weather: WeatherOutlook,
    /// Estimated daily cost times trip days, in USD
    pub total_trip_cost: f64,
}

pub struct TripPlanner {
    aggregator: CostAggregator,
    composer: BudgetComposer,
    currency: CurrencyResolver,
    lodging: Option<Arc<dyn LodgingSource>>,
    weather: Option<Arc<dyn WeatherSource>>,
    timeout: Duration,
}

impl TripPlanner {
    /// Planner over an explicit set of sources
    pub fn new(config: &TripCostConfig, sources: SourceSet) -> Self {
        let timeout = Duration::from_secs(config.http.adapter_timeout_seconds.into());
        Self {
            currency: CurrencyResolver::new(
                sources.search.clone(),
                sources.exchange.clone(),
                timeout,
            ),
            lodging: sources.lodging.clone(),
            weather: sources.weather.clone(),
            aggregator: CostAggregator::from_config(config, sources),
            composer: BudgetComposer::new(config.budget.clone()),
            timeout,
        }
    }

    /// Planner with every configured adapter, plus the response cache when
    /// enabled. A cache that cannot be opened is skipped.
    pub fn from_config(config: &TripCostConfig) -> Result<Self> {
        let cache = if config.cache.enabled {
            let location = config.cache.resolved_location();
            let ttl = Duration::from_secs(u64::from(config.cache.ttl_hours) * 3600);
            match PersistentCache::open(&location, ttl) {
                Ok(cache) => Some(cache),
                Err(e) => {
                    warn!("Response cache at {} unavailable: {e}", location.display());
                    None
                }
            }
        } else {
            None
        };

        let sources = SourceSet::from_config(config, cache)?;
        Ok(Self::new(config, sources))
    }

    /// Validates the request before any adapter is contacted
    #[instrument(skip(self, request), fields(city = %request.city))]
    pub async fn plan(&self, request: TripRequest) -> Result<TripReport> {
        let ctx = request.into_context()?;
        Ok(self.plan_context(ctx).await)
    }

    /// Plans an already validated trip; never fails
    pub async fn plan_context(&self, ctx: TripContext) -> TripReport {
        info!(
            "Planning {} day(s) in {} for {} traveller(s)",
            ctx.num_days(),
            ctx.city(),
            ctx.num_people()
        );

        let budget_plan = self.composer.compute_budget_plan(&ctx);

        let (daily_cost, hotel_options, weather, exchange) = tokio::join!(
            self.aggregator.compute_aggregated_daily_cost(&ctx),
            self.hotel_options(&ctx, budget_plan.per_night_range),
            self.weather_outlook(&ctx),
            self.currency.resolve(BASE_CURRENCY, ctx.target_currency()),
        );

        let budget_status = self.composer.evaluate_budget_status(&ctx, &daily_cost);
        let local_total_budget = convert_currency(ctx.total_budget(), exchange.rate);
        let total_trip_cost = round_cents(daily_cost.total_per_day() * f64::from(ctx.num_days()));

        info!(
            total_trip_cost,
            verdict = budget_status.verdict(),
            "Trip planned"
        );

        TripReport {
            context: ctx,
            daily_cost,
            budget_plan,
            budget_status,
            hotel_options,
            exchange,
            local_total_budget,
            weather,
            total_trip_cost,
        }
    }

    /// Priced places inside `band`; unpriced places are left out
    async fn hotel_options(&self, ctx: &TripContext, band: PriceRange) -> Vec<PlaceSummary> {
        let Some(source) = &self.lodging else {
            return Vec::new();
        };
        let places = sources::query(
            source.name(),
            self.timeout,
            source.fetch_lodging_options(ctx.city()),
        )
        .await
        .unwrap_or_default();

        let options: Vec<PlaceSummary> = places
            .into_iter()
            .filter(|place| place.estimated_cost.is_some_and(|cost| band.contains(cost)))
            .collect();
        debug!(
            matches = options.len(),
            lower = band.lower,
            upper = band.upper,
            "Filtered lodging by nightly budget"
        );
        options
    }

    async fn weather_outlook(&self, ctx: &TripContext) -> WeatherOutlook {
        let (current, forecast) = match &self.weather {
            Some(source) => tokio::join!(
                sources::query(source.name(), self.timeout, source.current_weather(ctx.city())),
                sources::query(source.name(), self.timeout, source.daily_forecast(ctx.city())),
            ),
            None => (None, None),
        };

        let daily = ctx
            .dates()
            .map(|date| {
                let line = forecast.as_ref().and_then(|f| f.get(&date).cloned());
                (date, line)
            })
            .collect();

        WeatherOutlook {
            current: current.map(|c| c.summary()),
            daily,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TripCostError;
    use crate::costs::RateSource;
    use crate::models::CostSource;
    use crate::sources::CurrentWeather;
    use crate::sources::testing::{Behaviour, StubExchange, StubHotels, StubLodging, StubWeather};
    use std::collections::BTreeMap;
    use std::sync::atomic::Ordering;

    fn request(
        city: &str,
        start: &str,
        end: &str,
        people: u32,
        budget: f64,
        currency: &str,
    ) -> TripRequest {
        TripRequest {
            city: city.to_string(),
            start_date: start.to_string(),
            end_date: end.to_string(),
            num_people: people,
            total_budget: budget,
            currency: currency.to_string(),
        }
    }

    fn fast_config() -> TripCostConfig {
        let mut config = TripCostConfig::default();
        config.http.adapter_timeout_seconds = 1;
        config
    }

    #[tokio::test]
    async fn test_inverted_window_rejected_before_adapters() {
        let hotels = StubHotels::priced(100.0);
        let sources = SourceSet {
            hotels: Some(hotels.clone()),
            ..SourceSet::default()
        };
        let planner = TripPlanner::new(&fast_config(), sources);

        let err = planner
            .plan(request("Paris", "2024-06-05", "2024-06-01", 1, 500.0, "EUR"))
            .await
            .unwrap_err();

        assert!(matches!(err, TripCostError::InvalidTripWindow { .. }));
        assert_eq!(hotels.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_plan_with_static_data_only() {
        let planner = TripPlanner::new(&fast_config(), SourceSet::default());
        let report = planner
            .plan(request("Paris", "2024-06-01", "2024-06-05", 2, 500.0, "EUR"))
            .await
            .unwrap();

        assert_eq!(report.context.num_days(), 5);
        assert_eq!(report.daily_cost.total_per_day(), 201.0);
        assert_eq!(report.total_trip_cost, 1005.0);
        assert!(!report.budget_status.within_budget);
        assert_eq!(report.budget_plan.allocations.accommodation, 250.0);
        assert_eq!(report.exchange.rate, 0.92);
        assert_eq!(report.exchange.source, RateSource::StaticTable);
        assert_eq!(report.local_total_budget, 460.0);
        assert!(report.weather.current.is_none());
        assert_eq!(report.weather.daily.len(), 5);
    }

    #[tokio::test]
    async fn test_plan_combines_live_sources() {
        let june_1 = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let forecast = BTreeMap::from([(june_1, "Rain, 19.0°C".to_string())]);
        let sources = SourceSet {
            hotels: Some(StubHotels::priced(180.0)),
            exchange: Some(StubExchange::new(Behaviour::Data(150.5))),
            weather: Some(Arc::new(StubWeather {
                current: Behaviour::Data(CurrentWeather {
                    description: "Clear Sky".to_string(),
                    temperature_c: 24.0,
                }),
                forecast: Behaviour::Data(forecast),
            })),
            ..SourceSet::default()
        };
        let planner = TripPlanner::new(&fast_config(), sources);

        let report = planner
            .plan(request("Tokyo", "2024-06-01", "2024-06-02", 1, 2000.0, "jpy"))
            .await
            .unwrap();

        assert_eq!(report.daily_cost.accommodation().source(), CostSource::LiveApi);
        assert_eq!(report.exchange.to, "JPY");
        assert_eq!(report.exchange.source, RateSource::ExchangeApi);
        assert_eq!(report.local_total_budget, 301_000.0);
        assert_eq!(report.weather.current.as_deref(), Some("Clear Sky, 24.0°C"));
        assert_eq!(
            report.weather.daily,
            vec![
                (june_1, Some("Rain, 19.0°C".to_string())),
                (june_1.succ_opt().unwrap(), None)
            ]
        );
        assert!(report.budget_status.within_budget);
    }

    #[tokio::test]
    async fn test_failing_weather_degrades_to_none() {
        let sources = SourceSet {
            weather: Some(Arc::new(StubWeather {
                current: Behaviour::Fail,
                forecast: Behaviour::Fail,
            })),
            ..SourceSet::default()
        };
        let planner = TripPlanner::new(&fast_config(), sources);
        let report = planner
            .plan(request("Bali", "2024-07-01", "2024-07-01", 1, 300.0, "USD"))
            .await
            .unwrap();

        assert!(report.weather.current.is_none());
        assert_eq!(report.weather.daily.len(), 1);
        assert!(report.weather.daily[0].1.is_none());
        assert_eq!(report.exchange.rate, 1.0);
    }

    #[tokio::test]
    async fn test_hotel_options_follow_nightly_band() {
        let sources = SourceSet {
            lodging: Some(StubLodging::priced(&[
                Some(50.0),
                Some(90.0),
                Some(100.0),
                None,
                Some(110.0),
                Some(200.0),
            ])),
            ..SourceSet::default()
        };
        let planner = TripPlanner::new(&fast_config(), sources);

        // 1000 over 5 days: 500 for accommodation, 100 a night, band 90..=110
        let report = planner
            .plan(request("Paris", "2024-06-01", "2024-06-05", 2, 1000.0, "USD"))
            .await
            .unwrap();

        let prices: Vec<Option<f64>> = report
            .hotel_options
            .iter()
            .map(|place| place.estimated_cost)
            .collect();
        assert_eq!(prices, vec![Some(90.0), Some(100.0), Some(110.0)]);
    }

    #[tokio::test]
    async fn test_failing_lodging_leaves_no_options() {
        let sources = SourceSet {
            lodging: Some(StubLodging::new(Behaviour::Fail)),
            ..SourceSet::default()
        };
        let planner = TripPlanner::new(&fast_config(), sources);
        let report = planner
            .plan(request("Rome", "2024-06-01", "2024-06-02", 1, 400.0, "USD"))
            .await
            .unwrap();

        assert!(report.hotel_options.is_empty());
        assert_eq!(report.budget_plan.per_night_range.lower, 90.0);
    }
}
