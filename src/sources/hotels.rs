//! Booking.com hotel prices via RapidAPI

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest_middleware::ClientWithMiddleware;
use serde::{Deserialize, Deserializer};
use tracing::{debug, info, instrument};

use super::{HotelPriceQuote, HotelPriceSource, ensure_success, parse_error};
use crate::Result;
use crate::cache::{self, PersistentCache};

const SOURCE: &str = "booking";
const SAMPLE_SIZE: usize = 5;

/// Hotel search client for the Booking.com RapidAPI endpoint
pub struct BookingHotelClient {
    client: ClientWithMiddleware,
    base_url: String,
    api_key: String,
    host: String,
    cache: Option<PersistentCache>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    result: Vec<HotelListing>,
}

#[derive(Debug, Deserialize)]
struct HotelListing {
    #[serde(default)]
    price_breakdown: Option<PriceBreakdown>,
}

#[derive(Debug, Deserialize)]
struct PriceBreakdown {
    #[serde(default, deserialize_with = "lenient_price")]
    gross_price: Option<f64>,
}

/// Prices arrive either as numbers or as numeric strings
fn lenient_price<'de, D>(deserializer: D) -> std::result::Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::Number(n)) => n.as_f64(),
        Some(serde_json::Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

impl HotelListing {
    fn price(&self) -> Option<f64> {
        self.price_breakdown.as_ref()?.gross_price
    }
}

/// Average, low and high of the first few positively priced listings
fn summarise(listings: &[HotelListing]) -> Option<HotelPriceQuote> {
    let prices: Vec<f64> = listings
        .iter()
        .take(SAMPLE_SIZE)
        .filter_map(HotelListing::price)
        .filter(|p| *p > 0.0)
        .collect();

    if prices.is_empty() {
        return None;
    }

    let avg = prices.iter().sum::<f64>() / prices.len() as f64;
    let low = prices.iter().copied().fold(f64::INFINITY, f64::min);
    let high = prices.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    Some(HotelPriceQuote {
        avg_price_per_night: avg,
        range_low: low,
        range_high: high,
        hotel_count: prices.len(),
    })
}

impl BookingHotelClient {
    pub fn new(
        client: ClientWithMiddleware,
        base_url: &str,
        api_key: &str,
        cache: Option<PersistentCache>,
    ) -> Self {
        let base_url = base_url.trim_end_matches('/').to_string();
        let host = base_url
            .split("://")
            .nth(1)
            .unwrap_or(&base_url)
            .split('/')
            .next()
            .unwrap_or_default()
            .to_string();

        Self {
            client,
            base_url,
            api_key: api_key.to_string(),
            host,
            cache,
        }
    }

    async fn search(
        &self,
        city: &str,
        check_in: NaiveDate,
        check_out: NaiveDate,
        occupancy: u32,
    ) -> Result<Option<HotelPriceQuote>> {
        let url = format!(
            "{}/v1/hotels/search?dest_id={}&search_type=city&arrival_date={}&departure_date={}&adults={}&room_number=1&units=metric&currency=USD&locale=en-us",
            self.base_url,
            urlencoding::encode(city),
            check_in.format("%Y-%m-%d"),
            check_out.format("%Y-%m-%d"),
            occupancy
        );

        debug!("Booking hotel search URL: {}", url);

        let response = self
            .client
            .get(&url)
            .header("X-RapidAPI-Key", &self.api_key)
            .header("X-RapidAPI-Host", &self.host)
            .send()
            .await?;
        ensure_success(SOURCE, &response)?;

        let body: SearchResponse = response
            .json()
            .await
            .map_err(|e| parse_error(SOURCE, e))?;

        let quote = summarise(&body.result);
        match &quote {
            Some(q) => info!(
                "Hotel prices for {}: avg {:.2} over {} listings",
                city, q.avg_price_per_night, q.hotel_count
            ),
            None => info!("No priced hotel listings for {}", city),
        }
        Ok(quote)
    }
}

#[async_trait]
impl HotelPriceSource for BookingHotelClient {
    fn name(&self) -> &'static str {
        SOURCE
    }

    #[instrument(skip(self))]
    async fn fetch_live_hotel_price(
        &self,
        city: &str,
        check_in: NaiveDate,
        check_out: NaiveDate,
        occupancy: u32,
    ) -> Result<Option<HotelPriceQuote>> {
        let key = format!(
            "hotels:{}:{check_in}:{check_out}:{occupancy}",
            city.trim().to_lowercase()
        );
        cache::cached(self.cache.as_ref(), &key, || {
            self.search(city, check_in, check_out, occupancy)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TripCostError;
    use crate::config::HttpConfig;
    use crate::sources::build_http_client;
    use mockito::Matcher;

    fn http() -> ClientWithMiddleware {
        build_http_client(&HttpConfig {
            adapter_timeout_seconds: 5,
            max_retries: 0,
        })
        .unwrap()
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_summarise_uses_first_five_positive_prices() {
        let listings: SearchResponse = serde_json::from_value(serde_json::json!({
            "result": [
                {"price_breakdown": {"gross_price": 100.0}},
                {"price_breakdown": {"gross_price": 0}},
                {"price_breakdown": {"gross_price": "200"}},
                {},
                {"price_breakdown": {"gross_price": 300.0}},
                {"price_breakdown": {"gross_price": 10000.0}}
            ]
        }))
        .unwrap();

        let quote = summarise(&listings.result).unwrap();
        assert_eq!(quote.hotel_count, 3);
        assert_eq!(quote.avg_price_per_night, 200.0);
        assert_eq!(quote.range_low, 100.0);
        assert_eq!(quote.range_high, 300.0);
    }

    #[test]
    fn test_summarise_empty() {
        assert!(summarise(&[]).is_none());
    }

    #[tokio::test]
    async fn test_fetch_live_hotel_price() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/v1/hotels/search")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("dest_id".into(), "New York".into()),
                Matcher::UrlEncoded("arrival_date".into(), "2024-06-01".into()),
                Matcher::UrlEncoded("departure_date".into(), "2024-06-04".into()),
                Matcher::UrlEncoded("adults".into(), "2".into()),
            ]))
            .match_header("x-rapidapi-key", "test-key")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"result":[{"price_breakdown":{"gross_price":150.0}},{"price_breakdown":{"gross_price":250.0}}]}"#)
            .create_async()
            .await;

        let client = BookingHotelClient::new(http(), &server.url(), "test-key", None);
        let quote = client
            .fetch_live_hotel_price("New York", date("2024-06-01"), date("2024-06-04"), 2)
            .await
            .unwrap()
            .unwrap();

        mock.assert_async().await;
        assert_eq!(quote.avg_price_per_night, 200.0);
        assert_eq!(quote.hotel_count, 2);
    }

    #[tokio::test]
    async fn test_fetch_reports_auth_failure() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/v1/hotels/search")
            .match_query(Matcher::Any)
            .with_status(403)
            .create_async()
            .await;

        let client = BookingHotelClient::new(http(), &server.url(), "bad-key", None);
        let err = client
            .fetch_live_hotel_price("Paris", date("2024-06-01"), date("2024-06-02"), 1)
            .await
            .unwrap_err();

        assert!(matches!(err, TripCostError::AdapterUnavailable { .. }));
        assert!(err.to_string().contains("authentication"));
    }

    #[tokio::test]
    async fn test_fetch_without_listings_is_no_data() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/v1/hotels/search")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"result":[]}"#)
            .create_async()
            .await;

        let client = BookingHotelClient::new(http(), &server.url(), "key", None);
        let quote = client
            .fetch_live_hotel_price("Paris", date("2024-06-01"), date("2024-06-02"), 1)
            .await
            .unwrap();
        assert!(quote.is_none());
    }

    #[test]
    fn test_host_header_derived_from_base_url() {
        let client = BookingHotelClient::new(
            http(),
            "https://booking-com.p.rapidapi.com/",
            "key",
            None,
        );
        assert_eq!(client.host, "booking-com.p.rapidapi.com");
        assert_eq!(client.base_url, "https://booking-com.p.rapidapi.com");
    }
}
