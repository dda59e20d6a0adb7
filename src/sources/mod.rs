//! Source adapters
//!
//! Each adapter wraps one external provider behind a small async trait and
//! returns either a typed result or `Ok(None)` for "no data". Adapters never
//! fall back on their own; precedence between sources is decided by the
//! callers in [`crate::costs`] and [`crate::planner`].

pub mod baseline;
pub mod currency;
pub mod hotels;
pub mod llm;
pub mod places;
pub mod search;
pub mod weather;

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{RetryTransientMiddleware, policies::ExponentialBackoff};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::cache::PersistentCache;
use crate::config::{HttpConfig, TripCostConfig};
use crate::{Result, TripCostError};

pub use currency::ExchangeRateApiClient;
pub use hotels::BookingHotelClient;
pub use llm::OpenAiCostResearcher;
pub use places::{GooglePlacesClient, PlaceSummary};
pub use search::DuckDuckGoClient;
pub use weather::OpenWeatherClient;

/// Live hotel price summary for a stay
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HotelPriceQuote {
    pub avg_price_per_night: f64,
    pub range_low: f64,
    pub range_high: f64,
    pub hotel_count: usize,
}

/// One sampled restaurant with its estimated meal price
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RestaurantPrice {
    pub name: String,
    pub estimated_cost_per_meal: f64,
}

/// Cost figures produced by LLM research, all in USD
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmCostResearch {
    /// Mid-range room, whole party
    pub accommodation_per_night: f64,
    /// Per person
    pub food_per_day: f64,
    /// Per person
    pub transport_per_day: f64,
    #[serde(default)]
    pub activities_per_day: Option<f64>,
    #[serde(default)]
    pub source_notes: Option<String>,
}

/// Title and body of one web search hit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchSnippet {
    pub title: String,
    pub body: String,
}

/// Current conditions for a city
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentWeather {
    pub description: String,
    pub temperature_c: f64,
}

impl CurrentWeather {
    /// `"Light Rain, 17.5°C"`; whole degrees keep their `.0`
    #[must_use]
    pub fn summary(&self) -> String {
        format!("{}, {:?}°C", self.description, self.temperature_c)
    }
}

/// One summary line per forecast date
pub type DailyForecast = BTreeMap<NaiveDate, String>;

#[async_trait]
pub trait HotelPriceSource: Send + Sync {
    /// Short identifier used in logs
    fn name(&self) -> &'static str;

    async fn fetch_live_hotel_price(
        &self,
        city: &str,
        check_in: NaiveDate,
        check_out: NaiveDate,
        occupancy: u32,
    ) -> Result<Option<HotelPriceQuote>>;
}

#[async_trait]
pub trait RestaurantPriceSource: Send + Sync {
    fn name(&self) -> &'static str;

    async fn fetch_restaurant_price_levels(
        &self,
        city: &str,
    ) -> Result<Option<Vec<RestaurantPrice>>>;
}

/// Places to stay, with an estimated nightly price where one is known
#[async_trait]
pub trait LodgingSource: Send + Sync {
    fn name(&self) -> &'static str;

    async fn fetch_lodging_options(&self, city: &str) -> Result<Option<Vec<PlaceSummary>>>;
}

#[async_trait]
pub trait CostResearchSource: Send + Sync {
    fn name(&self) -> &'static str;

    async fn fetch_llm_cost_research(
        &self,
        city: &str,
        num_people: u32,
        num_days: u32,
    ) -> Result<Option<LlmCostResearch>>;
}

#[async_trait]
pub trait ExchangeRateSource: Send + Sync {
    fn name(&self) -> &'static str;

    /// Units of `to` per one unit of `from`
    async fn fetch_rate(&self, from: &str, to: &str) -> Result<Option<f64>>;
}

#[async_trait]
pub trait WebSearchSource: Send + Sync {
    fn name(&self) -> &'static str;

    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchSnippet>>;
}

#[async_trait]
pub trait WeatherSource: Send + Sync {
    fn name(&self) -> &'static str;

    async fn current_weather(&self, city: &str) -> Result<Option<CurrentWeather>>;

    async fn daily_forecast(&self, city: &str) -> Result<Option<DailyForecast>>;
}

/// The adapters available to one planner; absent adapters are skipped
#[derive(Clone, Default)]
pub struct SourceSet {
    pub hotels: Option<Arc<dyn HotelPriceSource>>,
    pub restaurants: Option<Arc<dyn RestaurantPriceSource>>,
    pub lodging: Option<Arc<dyn LodgingSource>>,
    pub research: Option<Arc<dyn CostResearchSource>>,
    pub exchange: Option<Arc<dyn ExchangeRateSource>>,
    pub search: Option<Arc<dyn WebSearchSource>>,
    pub weather: Option<Arc<dyn WeatherSource>>,
}

impl SourceSet {
    /// Build every adapter whose credentials are configured
    pub fn from_config(config: &TripCostConfig, cache: Option<PersistentCache>) -> Result<Self> {
        let client = build_http_client(&config.http)?;
        let providers = &config.providers;

        let hotels = providers.rapidapi_key.as_ref().map(|key| {
            Arc::new(BookingHotelClient::new(
                client.clone(),
                &providers.hotels_base_url,
                key,
                cache.clone(),
            )) as Arc<dyn HotelPriceSource>
        });

        let places = providers.google_api_key.as_ref().map(|key| {
            Arc::new(GooglePlacesClient::new(
                client.clone(),
                &providers.google_base_url,
                key,
                cache.clone(),
            ))
        });
        let restaurants = places.clone().map(|p| p as Arc<dyn RestaurantPriceSource>);
        let lodging = places.map(|p| p as Arc<dyn LodgingSource>);

        let research = providers.llm_api_key.as_ref().map(|key| {
            Arc::new(OpenAiCostResearcher::new(
                client.clone(),
                &providers.llm_base_url,
                key,
                &providers.llm_model,
                cache.clone(),
            )) as Arc<dyn CostResearchSource>
        });

        let weather = providers.weather_api_key.as_ref().map(|key| {
            Arc::new(OpenWeatherClient::new(
                client.clone(),
                &providers.weather_base_url,
                key,
            )) as Arc<dyn WeatherSource>
        });

        let search = providers.search_enabled.then(|| {
            Arc::new(DuckDuckGoClient::new(client.clone(), &providers.search_base_url))
                as Arc<dyn WebSearchSource>
        });

        let exchange = Some(Arc::new(ExchangeRateApiClient::new(
            client,
            &providers.exchange_base_url,
            cache,
        )) as Arc<dyn ExchangeRateSource>);

        debug!(
            hotels = hotels.is_some(),
            restaurants = restaurants.is_some(),
            lodging = lodging.is_some(),
            research = research.is_some(),
            weather = weather.is_some(),
            search = search.is_some(),
            "Configured data sources"
        );

        Ok(Self {
            hotels,
            restaurants,
            lodging,
            research,
            exchange,
            search,
            weather,
        })
    }
}

/// Shared HTTP client: per-request timeout plus at most `max_retries`
/// quick re-attempts on transient failures
pub fn build_http_client(http: &HttpConfig) -> Result<ClientWithMiddleware> {
    let timeout = Duration::from_secs(http.adapter_timeout_seconds.into());

    let client = reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("TripCost/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| TripCostError::config(format!("Failed to create HTTP client: {e}")))?;

    let retry_policy = ExponentialBackoff::builder()
        .retry_bounds(Duration::from_millis(100), Duration::from_millis(500))
        .build_with_max_retries(http.max_retries.min(1));

    Ok(ClientBuilder::new(client)
        .with(RetryTransientMiddleware::new_with_policy(retry_policy))
        .build())
}

/// Runs one adapter call under its own deadline. A call that overruns is
/// reported exactly like a failed call.
pub async fn bounded<T, F>(source_name: &str, timeout: Duration, call: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(timeout, call).await {
        Ok(result) => result,
        Err(_) => Err(TripCostError::adapter(
            source_name,
            format!("timed out after {:.1}s", timeout.as_secs_f64()),
        )),
    }
}

/// Like [`bounded`], but absorbs the failure: errors and timeouts are logged
/// and turned into "no data".
pub async fn query<T, F>(source_name: &str, timeout: Duration, call: F) -> Option<T>
where
    F: Future<Output = Result<Option<T>>>,
{
    match bounded(source_name, timeout, call).await {
        Ok(Some(value)) => {
            debug!(source = source_name, "Source returned data");
            Some(value)
        }
        Ok(None) => {
            debug!(source = source_name, "Source returned no data");
            None
        }
        Err(e) => {
            warn!(source = source_name, error = %e, "Source not contributing");
            None
        }
    }
}

/// Turns a non-success HTTP status into an adapter error
pub(crate) fn ensure_success(source_name: &str, response: &reqwest::Response) -> Result<()> {
    let status = response.status();
    if status.is_success() {
        return Ok(());
    }
    let reason = match status.as_u16() {
        401 | 403 => "authentication rejected".to_string(),
        429 => "rate limit exceeded".to_string(),
        _ => format!("unexpected status {status}"),
    };
    Err(TripCostError::adapter(source_name, reason))
}

/// Maps a JSON decoding failure into an adapter error
pub(crate) fn parse_error(source_name: &str, err: reqwest::Error) -> TripCostError {
    TripCostError::adapter(source_name, format!("invalid response payload: {err}"))
}

#[cfg(test)]
pub(crate) mod testing {
    //! In-memory adapters for exercising precedence without a network

    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// What a stub adapter does when called
    #[derive(Clone)]
    pub enum Behaviour<T> {
        Data(T),
        Empty,
        Fail,
        Hang,
    }

    impl<T: Clone> Behaviour<T> {
        async fn run(&self, name: &str) -> Result<Option<T>> {
            match self {
                Behaviour::Data(value) => Ok(Some(value.clone())),
                Behaviour::Empty => Ok(None),
                Behaviour::Fail => Err(TripCostError::adapter(name, "stub failure")),
                Behaviour::Hang => {
                    tokio::time::sleep(Duration::from_secs(30)).await;
                    Ok(None)
                }
            }
        }
    }

    pub struct StubHotels {
        pub behaviour: Behaviour<HotelPriceQuote>,
        pub calls: AtomicUsize,
    }

    impl StubHotels {
        pub fn new(behaviour: Behaviour<HotelPriceQuote>) -> Arc<Self> {
            Arc::new(Self {
                behaviour,
                calls: AtomicUsize::new(0),
            })
        }

        pub fn priced(avg: f64) -> Arc<Self> {
            Self::new(Behaviour::Data(HotelPriceQuote {
                avg_price_per_night: avg,
                range_low: avg * 0.8,
                range_high: avg * 1.2,
                hotel_count: 5,
            }))
        }
    }

    #[async_trait]
    impl HotelPriceSource for StubHotels {
        fn name(&self) -> &'static str {
            "stub-hotels"
        }

        async fn fetch_live_hotel_price(
            &self,
            _city: &str,
            _check_in: NaiveDate,
            _check_out: NaiveDate,
            _occupancy: u32,
        ) -> Result<Option<HotelPriceQuote>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.behaviour.run(self.name()).await
        }
    }

    pub struct StubRestaurants {
        pub behaviour: Behaviour<Vec<RestaurantPrice>>,
    }

    impl StubRestaurants {
        pub fn new(behaviour: Behaviour<Vec<RestaurantPrice>>) -> Arc<Self> {
            Arc::new(Self { behaviour })
        }

        pub fn meals(costs: &[f64]) -> Arc<Self> {
            Self::new(Behaviour::Data(
                costs
                    .iter()
                    .enumerate()
                    .map(|(i, cost)| RestaurantPrice {
                        name: format!("Restaurant {i}"),
                        estimated_cost_per_meal: *cost,
                    })
                    .collect(),
            ))
        }
    }

    #[async_trait]
    impl RestaurantPriceSource for StubRestaurants {
        fn name(&self) -> &'static str {
            "stub-restaurants"
        }

        async fn fetch_restaurant_price_levels(
            &self,
            _city: &str,
        ) -> Result<Option<Vec<RestaurantPrice>>> {
            self.behaviour.run(self.name()).await
        }
    }

    pub struct StubLodging {
        pub behaviour: Behaviour<Vec<PlaceSummary>>,
    }

    impl StubLodging {
        pub fn new(behaviour: Behaviour<Vec<PlaceSummary>>) -> Arc<Self> {
            Arc::new(Self { behaviour })
        }

        /// One place per nightly price; `None` for an unpriced place
        pub fn priced(prices: &[Option<f64>]) -> Arc<Self> {
            Self::new(Behaviour::Data(
                prices
                    .iter()
                    .enumerate()
                    .map(|(i, price)| PlaceSummary {
                        name: format!("Hotel {i}"),
                        rating: None,
                        price_level: None,
                        address: None,
                        estimated_cost: *price,
                    })
                    .collect(),
            ))
        }
    }

    #[async_trait]
    impl LodgingSource for StubLodging {
        fn name(&self) -> &'static str {
            "stub-lodging"
        }

        async fn fetch_lodging_options(&self, _city: &str) -> Result<Option<Vec<PlaceSummary>>> {
            self.behaviour.run(self.name()).await
        }
    }

    pub struct StubResearch {
        pub behaviour: Behaviour<LlmCostResearch>,
    }

    impl StubResearch {
        pub fn new(behaviour: Behaviour<LlmCostResearch>) -> Arc<Self> {
            Arc::new(Self { behaviour })
        }

        pub fn figures(accommodation: f64, food: f64, transport: f64) -> Arc<Self> {
            Self::new(Behaviour::Data(LlmCostResearch {
                accommodation_per_night: accommodation,
                food_per_day: food,
                transport_per_day: transport,
                activities_per_day: None,
                source_notes: None,
            }))
        }
    }

    #[async_trait]
    impl CostResearchSource for StubResearch {
        fn name(&self) -> &'static str {
            "stub-research"
        }

        async fn fetch_llm_cost_research(
            &self,
            _city: &str,
            _num_people: u32,
            _num_days: u32,
        ) -> Result<Option<LlmCostResearch>> {
            self.behaviour.run(self.name()).await
        }
    }

    pub struct StubExchange {
        pub behaviour: Behaviour<f64>,
    }

    impl StubExchange {
        pub fn new(behaviour: Behaviour<f64>) -> Arc<Self> {
            Arc::new(Self { behaviour })
        }
    }

    #[async_trait]
    impl ExchangeRateSource for StubExchange {
        fn name(&self) -> &'static str {
            "stub-exchange"
        }

        async fn fetch_rate(&self, _from: &str, _to: &str) -> Result<Option<f64>> {
            self.behaviour.run(self.name()).await
        }
    }

    pub struct StubSearch {
        pub snippets: Vec<SearchSnippet>,
    }

    impl StubSearch {
        pub fn with_body(body: &str) -> Arc<Self> {
            Arc::new(Self {
                snippets: vec![SearchSnippet {
                    title: "Exchange rate".to_string(),
                    body: body.to_string(),
                }],
            })
        }
    }

    #[async_trait]
    impl WebSearchSource for StubSearch {
        fn name(&self) -> &'static str {
            "stub-search"
        }

        async fn search(&self, _query: &str, max_results: usize) -> Result<Vec<SearchSnippet>> {
            Ok(self.snippets.iter().take(max_results).cloned().collect())
        }
    }

    pub struct StubWeather {
        pub current: Behaviour<CurrentWeather>,
        pub forecast: Behaviour<DailyForecast>,
    }

    #[async_trait]
    impl WeatherSource for StubWeather {
        fn name(&self) -> &'static str {
            "stub-weather"
        }

        async fn current_weather(&self, _city: &str) -> Result<Option<CurrentWeather>> {
            self.current.run(self.name()).await
        }

        async fn daily_forecast(&self, _city: &str) -> Result<Option<DailyForecast>> {
            self.forecast.run(self.name()).await
        }
    }
}
