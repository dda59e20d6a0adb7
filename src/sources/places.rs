//! Google Geocoding + Places Nearby Search
//!
//! Restaurant and lodging price levels are sampled around the city centre
//! and turned into estimated meal and night prices.

use async_trait::async_trait;
use reqwest_middleware::ClientWithMiddleware;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use super::{LodgingSource, RestaurantPrice, RestaurantPriceSource, ensure_success, parse_error};
use crate::cache::{self, PersistentCache};
use crate::{Result, TripCostError};

const SOURCE: &str = "google-places";
const SEARCH_RADIUS_M: u32 = 5000;
const RESTAURANT_SAMPLE: usize = 10;
const LODGING_SAMPLE: usize = 20;

/// Kind of place to search for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaceKind {
    Restaurant,
    Lodging,
}

impl PlaceKind {
    fn as_str(self) -> &'static str {
        match self {
            PlaceKind::Restaurant => "restaurant",
            PlaceKind::Lodging => "lodging",
        }
    }

    /// Typical spend for a Google `price_level` (meal or night, USD)
    #[must_use]
    pub fn estimated_cost(self, price_level: u8) -> Option<f64> {
        let (restaurant, lodging) = match price_level {
            0 => (0.0, 0.0),
            1 => (15.0, 50.0),
            2 => (30.0, 100.0),
            3 => (60.0, 200.0),
            4 => (100.0, 400.0),
            _ => return None,
        };
        Some(match self {
            PlaceKind::Restaurant => restaurant,
            PlaceKind::Lodging => lodging,
        })
    }
}

/// One place returned by a nearby search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceSummary {
    pub name: String,
    pub rating: Option<f64>,
    pub price_level: Option<u8>,
    pub address: Option<String>,
    pub estimated_cost: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    status: String,
    #[serde(default)]
    results: Vec<GeocodeResult>,
}

#[derive(Debug, Deserialize)]
struct GeocodeResult {
    geometry: Geometry,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    location: LatLng,
}

#[derive(Debug, Deserialize)]
struct LatLng {
    lat: f64,
    lng: f64,
}

#[derive(Debug, Deserialize)]
struct NearbyResponse {
    status: String,
    #[serde(default)]
    results: Vec<NearbyPlace>,
}

#[derive(Debug, Deserialize)]
struct NearbyPlace {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    rating: Option<f64>,
    #[serde(default)]
    price_level: Option<u8>,
    #[serde(default)]
    vicinity: Option<String>,
}

/// Google Maps Platform client
pub struct GooglePlacesClient {
    client: ClientWithMiddleware,
    base_url: String,
    api_key: String,
    cache: Option<PersistentCache>,
}

/// Google reports "no results" as a status rather than an HTTP error
fn check_status(status: &str) -> Result<bool> {
    match status {
        "OK" => Ok(true),
        "ZERO_RESULTS" => Ok(false),
        other => Err(TripCostError::adapter(SOURCE, format!("API status {other}"))),
    }
}

impl GooglePlacesClient {
    pub fn new(
        client: ClientWithMiddleware,
        base_url: &str,
        api_key: &str,
        cache: Option<PersistentCache>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            cache,
        }
    }

    async fn geocode(&self, city: &str) -> Result<Option<(f64, f64)>> {
        let url = format!(
            "{}/maps/api/geocode/json?address={}&key={}",
            self.base_url,
            urlencoding::encode(city),
            urlencoding::encode(&self.api_key)
        );

        let response = self.client.get(&url).send().await?;
        ensure_success(SOURCE, &response)?;
        let body: GeocodeResponse = response.json().await.map_err(|e| parse_error(SOURCE, e))?;

        if !check_status(&body.status)? {
            return Ok(None);
        }

        Ok(body
            .results
            .first()
            .map(|r| (r.geometry.location.lat, r.geometry.location.lng)))
    }

    /// Places of `kind` within 5 km of the city centre
    #[instrument(skip(self))]
    pub async fn search_places(
        &self,
        city: &str,
        kind: PlaceKind,
        max_results: usize,
    ) -> Result<Vec<PlaceSummary>> {
        let Some((lat, lng)) = self.geocode(city).await? else {
            debug!("Geocoding found nothing for {}", city);
            return Ok(Vec::new());
        };

        let url = format!(
            "{}/maps/api/place/nearbysearch/json?location={},{}&radius={}&type={}&key={}",
            self.base_url,
            lat,
            lng,
            SEARCH_RADIUS_M,
            kind.as_str(),
            urlencoding::encode(&self.api_key)
        );

        let response = self.client.get(&url).send().await?;
        ensure_success(SOURCE, &response)?;
        let body: NearbyResponse = response.json().await.map_err(|e| parse_error(SOURCE, e))?;

        if !check_status(&body.status)? {
            return Ok(Vec::new());
        }

        let places: Vec<PlaceSummary> = body
            .results
            .into_iter()
            .take(max_results)
            .map(|place| PlaceSummary {
                name: place.name.unwrap_or_else(|| "N/A".to_string()),
                rating: place.rating,
                price_level: place.price_level,
                address: place.vicinity,
                estimated_cost: place.price_level.and_then(|l| kind.estimated_cost(l)),
            })
            .collect();

        info!("Found {} {} places near {}", places.len(), kind.as_str(), city);
        Ok(places)
    }

    async fn sample_restaurants(&self, city: &str) -> Result<Option<Vec<RestaurantPrice>>> {
        let priced: Vec<RestaurantPrice> = self
            .search_places(city, PlaceKind::Restaurant, RESTAURANT_SAMPLE)
            .await?
            .into_iter()
            .filter_map(|place| {
                place.estimated_cost.map(|cost| RestaurantPrice {
                    name: place.name,
                    estimated_cost_per_meal: cost,
                })
            })
            .collect();

        Ok((!priced.is_empty()).then_some(priced))
    }

    async fn list_lodging(&self, city: &str) -> Result<Option<Vec<PlaceSummary>>> {
        let places = self.search_places(city, PlaceKind::Lodging, LODGING_SAMPLE).await?;
        Ok((!places.is_empty()).then_some(places))
    }
}

#[async_trait]
impl RestaurantPriceSource for GooglePlacesClient {
    fn name(&self) -> &'static str {
        SOURCE
    }

    #[instrument(skip(self))]
    async fn fetch_restaurant_price_levels(
        &self,
        city: &str,
    ) -> Result<Option<Vec<RestaurantPrice>>> {
        let key = format!("restaurants:{}", city.trim().to_lowercase());
        cache::cached(self.cache.as_ref(), &key, || self.sample_restaurants(city)).await
    }
}

#[async_trait]
impl LodgingSource for GooglePlacesClient {
    fn name(&self) -> &'static str {
        SOURCE
    }

    #[instrument(skip(self))]
    async fn fetch_lodging_options(&self, city: &str) -> Result<Option<Vec<PlaceSummary>>> {
        let key = format!("lodging:{}", city.trim().to_lowercase());
        cache::cached(self.cache.as_ref(), &key, || self.list_lodging(city)).await
    }
}
