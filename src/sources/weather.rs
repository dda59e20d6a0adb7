//! OpenWeatherMap current conditions and 5-day forecast

use async_trait::async_trait;
use chrono::NaiveDateTime;
use reqwest_middleware::ClientWithMiddleware;
use serde::Deserialize;
use tracing::{debug, instrument};

use super::{CurrentWeather, DailyForecast, WeatherSource, ensure_success, parse_error};
use crate::Result;

const SOURCE: &str = "openweathermap";

pub struct OpenWeatherClient {
    client: ClientWithMiddleware,
    base_url: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct Conditions {
    #[serde(default)]
    weather: Vec<Description>,
    main: MainReadings,
}

#[derive(Debug, Deserialize)]
struct Description {
    description: String,
}

#[derive(Debug, Deserialize)]
struct MainReadings {
    temp: f64,
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    #[serde(default)]
    list: Vec<ForecastEntry>,
}

#[derive(Debug, Deserialize)]
struct ForecastEntry {
    dt_txt: String,
    #[serde(flatten)]
    conditions: Conditions,
}

/// "light rain" -> "Light Rain"
fn title_case(text: &str) -> String {
    text.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

impl Conditions {
    fn into_current(self) -> Option<CurrentWeather> {
        let description = self.weather.into_iter().next()?.description;
        Some(CurrentWeather {
            description: title_case(&description),
            temperature_c: self.main.temp,
        })
    }
}

/// First entry of each calendar day, keyed by date
fn daily_from_entries(entries: Vec<ForecastEntry>) -> DailyForecast {
    let mut daily = DailyForecast::new();
    for entry in entries {
        let Ok(timestamp) = NaiveDateTime::parse_from_str(&entry.dt_txt, "%Y-%m-%d %H:%M:%S") else {
            debug!("Skipping forecast entry with bad timestamp {:?}", entry.dt_txt);
            continue;
        };
        let date = timestamp.date();
        if daily.contains_key(&date) {
            continue;
        }
        if let Some(current) = entry.conditions.into_current() {
            daily.insert(date, current.summary());
        }
    }
    daily
}

impl OpenWeatherClient {
    pub fn new(client: ClientWithMiddleware, base_url: &str, api_key: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }

    fn url(&self, endpoint: &str, city: &str) -> String {
        format!(
            "{}/data/2.5/{}?q={}&appid={}&units=metric",
            self.base_url,
            endpoint,
            urlencoding::encode(city),
            urlencoding::encode(&self.api_key)
        )
    }
}

#[async_trait]
impl WeatherSource for OpenWeatherClient {
    fn name(&self) -> &'static str {
        SOURCE
    }

    #[instrument(skip(self))]
    async fn current_weather(&self, city: &str) -> Result<Option<CurrentWeather>> {
        let response = self.client.get(self.url("weather", city)).send().await?;
        ensure_success(SOURCE, &response)?;
        let conditions: Conditions = response.json().await.map_err(|e| parse_error(SOURCE, e))?;
        Ok(conditions.into_current())
    }

    #[instrument(skip(self))]
    async fn daily_forecast(&self, city: &str) -> Result<Option<DailyForecast>> {
        let response = self.client.get(self.url("forecast", city)).send().await?;
        ensure_success(SOURCE, &response)?;
        let forecast: ForecastResponse = response.json().await.map_err(|e| parse_error(SOURCE, e))?;

        let daily = daily_from_entries(forecast.list);
        debug!("Forecast for {} covers {} days", city, daily.len());
        Ok((!daily.is_empty()).then_some(daily))
    }
}
