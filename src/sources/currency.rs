//! Exchange rates: ExchangeRate-API client, search snippet parsing and the
//! static table of last-resort rates

use async_trait::async_trait;
use regex::Regex;
use reqwest_middleware::ClientWithMiddleware;
use serde::Deserialize;
use std::collections::HashMap;
use tracing::{debug, instrument};

use super::{ExchangeRateSource, ensure_success, parse_error};
use crate::cache::{self, PersistentCache};
use crate::models::round_cents;
use crate::Result;

const SOURCE: &str = "exchangerate-api";

/// Approximate USD rates used when no live source answers
const STATIC_USD_RATES: &[(&str, f64)] = &[
    ("INR", 83.0),
    ("EUR", 0.92),
    ("GBP", 0.79),
    ("JPY", 150.0),
    ("CAD", 1.35),
    ("AUD", 1.52),
    ("CHF", 0.88),
    ("CNY", 7.2),
];

/// Static USD -> `currency` rate, if the currency is in the table
#[must_use]
pub fn static_rate(currency: &str) -> Option<f64> {
    let code = currency.trim().to_uppercase();
    if code == "USD" {
        return Some(1.0);
    }
    STATIC_USD_RATES
        .iter()
        .find(|(c, _)| *c == code)
        .map(|&(_, rate)| rate)
}

/// `amount * rate`, rounded to cents
#[must_use]
pub fn convert_currency(amount: f64, rate: f64) -> f64 {
    round_cents(amount * rate)
}

/// Finds a quoted rate in free text such as `"1 USD = 83.12 INR"`,
/// `"83.12 INR per USD"` or `"83.12 INR = 1 USD"`
#[must_use]
pub fn extract_rate_from_snippet(text: &str, from: &str, to: &str) -> Option<f64> {
    let from = regex::escape(&from.to_uppercase());
    let to = regex::escape(&to.to_uppercase());
    let number = r"([\d,]+\.?\d*)";

    let patterns = [
        format!(r"(?i)1\s*{from}\s*=\s*{number}\s*{to}"),
        format!(r"(?i){number}\s*{to}\s*per\s*{from}"),
        format!(r"(?i){number}\s*{to}\s*=\s*1\s*{from}"),
    ];

    patterns.iter().find_map(|pattern| {
        let re = Regex::new(pattern).ok()?;
        let captured = re.captures(text)?.get(1)?.as_str().replace(',', "");
        captured.parse::<f64>().ok().filter(|r| r.is_finite() && *r > 0.0)
    })
}

#[derive(Debug, Deserialize)]
struct LatestRates {
    #[serde(default)]
    rates: HashMap<String, f64>,
}

/// Client for `https://api.exchangerate-api.com/v4/latest/{base}`
pub struct ExchangeRateApiClient {
    client: ClientWithMiddleware,
    base_url: String,
    cache: Option<PersistentCache>,
}

impl ExchangeRateApiClient {
    pub fn new(
        client: ClientWithMiddleware,
        base_url: &str,
        cache: Option<PersistentCache>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            cache,
        }
    }

    async fn latest(&self, from: &str, to: &str) -> Result<Option<f64>> {
        let url = format!(
            "{}/v4/latest/{}",
            self.base_url,
            urlencoding::encode(from)
        );

        let response = self.client.get(&url).send().await?;
        ensure_success(SOURCE, &response)?;
        let body: LatestRates = response.json().await.map_err(|e| parse_error(SOURCE, e))?;

        let rate = body.rates.get(to).copied();
        debug!("{} -> {}: {:?}", from, to, rate);
        Ok(rate)
    }
}

#[async_trait]
impl ExchangeRateSource for ExchangeRateApiClient {
    fn name(&self) -> &'static str {
        SOURCE
    }

    #[instrument(skip(self))]
    async fn fetch_rate(&self, from: &str, to: &str) -> Result<Option<f64>> {
        let from = from.to_uppercase();
        let to = to.to_uppercase();
        let key = format!("fx:{from}:{to}");
        cache::cached(self.cache.as_ref(), &key, || self.latest(&from, &to)).await
    }
}
