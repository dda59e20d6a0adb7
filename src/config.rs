//! Configuration management for `TripCost`
//!
//! Handles loading configuration from files, environment variables,
//! and provides validation for all configuration settings.

use crate::TripCostError;
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure for `TripCost`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TripCostConfig {
    /// External data providers
    #[serde(default)]
    pub providers: ProvidersConfig,
    /// Outbound HTTP behaviour shared by all adapters
    #[serde(default)]
    pub http: HttpConfig,
    /// Budget-anchored baseline adjustment
    #[serde(default)]
    pub adjustment: AdjustmentConfig,
    /// Budget allocation percentages
    #[serde(default)]
    pub budget: BudgetConfig,
    /// Cache configuration
    #[serde(default)]
    pub cache: CacheConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Credentials and endpoints for every data source.
/// A source without its key is simply not queried.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvidersConfig {
    /// RapidAPI key used for Booking.com hotel prices
    pub rapidapi_key: Option<String>,
    #[serde(default = "default_hotels_base_url")]
    pub hotels_base_url: String,
    /// Google Maps Platform key (geocoding + places)
    pub google_api_key: Option<String>,
    #[serde(default = "default_google_base_url")]
    pub google_base_url: String,
    /// OpenAI-compatible key for cost research
    pub llm_api_key: Option<String>,
    #[serde(default = "default_llm_base_url")]
    pub llm_base_url: String,
    #[serde(default = "default_llm_model")]
    pub llm_model: String,
    /// OpenWeatherMap key
    pub weather_api_key: Option<String>,
    #[serde(default = "default_weather_base_url")]
    pub weather_base_url: String,
    /// ExchangeRate-API endpoint (no key required)
    #[serde(default = "default_exchange_base_url")]
    pub exchange_base_url: String,
    /// DuckDuckGo Instant Answer endpoint
    #[serde(default = "default_search_base_url")]
    pub search_base_url: String,
    /// Disable the web search source entirely
    #[serde(default = "default_true")]
    pub search_enabled: bool,
}

/// HTTP settings applied to every adapter call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Per-call timeout in seconds; an expired call counts as a failed one
    #[serde(default = "default_adapter_timeout")]
    pub adapter_timeout_seconds: u32,
    /// Immediate re-attempts after a transient failure (0 or 1)
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

/// Thresholds for anchoring baseline costs to the stated budget
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdjustmentConfig {
    /// Scale up when implied daily budget exceeds baseline by this ratio
    #[serde(default = "default_upper_threshold")]
    pub upper_threshold: f64,
    /// Scale down when implied daily budget falls under baseline by this ratio
    #[serde(default = "default_lower_threshold")]
    pub lower_threshold: f64,
    /// Largest factor ever applied
    #[serde(default = "default_max_factor")]
    pub max_factor: f64,
    /// Smallest factor ever applied
    #[serde(default = "default_min_factor")]
    pub min_factor: f64,
}

/// Percentage split of the total trip budget
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BudgetConfig {
    #[serde(default = "default_accommodation_pct")]
    pub accommodation_pct: f64,
    #[serde(default = "default_food_pct")]
    pub food_pct: f64,
    #[serde(default = "default_travel_pct")]
    pub travel_pct: f64,
    #[serde(default = "default_leisure_pct")]
    pub leisure_pct: f64,
    /// Width of the per-night price band, as a fraction (0.1 = ±10%)
    #[serde(default = "default_night_tolerance")]
    pub per_night_tolerance: f64,
}

/// Cache configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default)]
    pub enabled: bool,
    /// Cache TTL in hours
    #[serde(default = "default_cache_ttl")]
    pub ttl_hours: u32,
    /// Cache directory location
    #[serde(default = "default_cache_location")]
    pub location: String,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (pretty or json)
    #[serde(default = "default_log_format")]
    pub format: String,
    /// OTLP/HTTP collector endpoint; traces are exported only when set
    #[serde(default)]
    pub otlp_endpoint: Option<String>,
}

// Default value functions
fn default_true() -> bool {
    true
}

fn default_hotels_base_url() -> String {
    "https://booking-com.p.rapidapi.com".to_string()
}

fn default_google_base_url() -> String {
    "https://maps.googleapis.com".to_string()
}

fn default_llm_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_llm_model() -> String {
    "gpt-4o".to_string()
}

fn default_weather_base_url() -> String {
    "https://api.openweathermap.org".to_string()
}

fn default_exchange_base_url() -> String {
    "https://api.exchangerate-api.com".to_string()
}

fn default_search_base_url() -> String {
    "https://api.duckduckgo.com".to_string()
}

fn default_adapter_timeout() -> u32 {
    5
}

fn default_max_retries() -> u32 {
    1
}

fn default_upper_threshold() -> f64 {
    1.5
}

fn default_lower_threshold() -> f64 {
    0.7
}

fn default_max_factor() -> f64 {
    2.0
}

fn default_min_factor() -> f64 {
    0.5
}

fn default_accommodation_pct() -> f64 {
    50.0
}

fn default_food_pct() -> f64 {
    20.0
}

fn default_travel_pct() -> f64 {
    10.0
}

fn default_leisure_pct() -> f64 {
    20.0
}

fn default_night_tolerance() -> f64 {
    0.1
}

fn default_cache_ttl() -> u32 {
    6
}

fn default_cache_location() -> String {
    "~/.cache/tripcost".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            rapidapi_key: None,
            hotels_base_url: default_hotels_base_url(),
            google_api_key: None,
            google_base_url: default_google_base_url(),
            llm_api_key: None,
            llm_base_url: default_llm_base_url(),
            llm_model: default_llm_model(),
            weather_api_key: None,
            weather_base_url: default_weather_base_url(),
            exchange_base_url: default_exchange_base_url(),
            search_base_url: default_search_base_url(),
            search_enabled: true,
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            adapter_timeout_seconds: default_adapter_timeout(),
            max_retries: default_max_retries(),
        }
    }
}

impl Default for AdjustmentConfig {
    fn default() -> Self {
        Self {
            upper_threshold: default_upper_threshold(),
            lower_threshold: default_lower_threshold(),
            max_factor: default_max_factor(),
            min_factor: default_min_factor(),
        }
    }
}

impl Default for BudgetConfig {
    fn default() -> Self {
        Self {
            accommodation_pct: default_accommodation_pct(),
            food_pct: default_food_pct(),
            travel_pct: default_travel_pct(),
            leisure_pct: default_leisure_pct(),
            per_night_tolerance: default_night_tolerance(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            ttl_hours: default_cache_ttl(),
            location: default_cache_location(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            otlp_endpoint: None,
        }
    }
}

impl CacheConfig {
    /// Cache directory with a leading `~` expanded to the home directory
    #[must_use]
    pub fn resolved_location(&self) -> PathBuf {
        match self.location.strip_prefix("~/") {
            Some(rest) => dirs::home_dir()
                .map(|home| home.join(rest))
                .unwrap_or_else(|| PathBuf::from(rest)),
            None => PathBuf::from(&self.location),
        }
    }
}

impl TripCostConfig {
    /// Load configuration from file and environment variables
    pub fn load() -> Result<Self> {
        Self::load_from_path(None)
    }

    /// Load configuration from specified path
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        let mut builder = Config::builder();

        let config_file = config_path.unwrap_or_else(|| {
            Self::get_config_path().unwrap_or_else(|| PathBuf::from("config.toml"))
        });

        if config_file.exists() {
            builder = builder.add_source(
                File::from(config_file.clone())
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // Environment overrides, e.g. TRIPCOST_PROVIDERS__RAPIDAPI_KEY
        builder = builder.add_source(
            Environment::with_prefix("TRIPCOST")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let mut config: TripCostConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")?;

        config.apply_defaults();
        config.validate()?;

        Ok(config)
    }

    /// Get the default configuration file path
    #[must_use]
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("tripcost").join("config.toml"))
    }

    /// Apply default values to missing configuration fields
    pub fn apply_defaults(&mut self) {
        let providers = &mut self.providers;
        for (value, default) in [
            (&mut providers.hotels_base_url, default_hotels_base_url as fn() -> String),
            (&mut providers.google_base_url, default_google_base_url),
            (&mut providers.llm_base_url, default_llm_base_url),
            (&mut providers.llm_model, default_llm_model),
            (&mut providers.weather_base_url, default_weather_base_url),
            (&mut providers.exchange_base_url, default_exchange_base_url),
            (&mut providers.search_base_url, default_search_base_url),
        ] {
            if value.is_empty() {
                *value = default();
            }
        }

        // Blank keys from env files mean "not configured"
        for key in [
            &mut providers.rapidapi_key,
            &mut providers.google_api_key,
            &mut providers.llm_api_key,
            &mut providers.weather_api_key,
        ] {
            if key.as_deref().is_some_and(|k| k.trim().is_empty()) {
                *key = None;
            }
        }

        if self.http.adapter_timeout_seconds == 0 {
            self.http.adapter_timeout_seconds = default_adapter_timeout();
        }
        if self.cache.ttl_hours == 0 {
            self.cache.ttl_hours = default_cache_ttl();
        }
        if self.cache.location.is_empty() {
            self.cache.location = default_cache_location();
        }
        if self.logging.level.is_empty() {
            self.logging.level = default_log_level();
        }
        if self.logging.format.is_empty() {
            self.logging.format = default_log_format();
        }
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        self.validate_numeric_ranges()?;
        self.validate_budget_split()?;
        self.validate_string_values()?;
        Ok(())
    }

    /// Validate numeric configuration ranges
    fn validate_numeric_ranges(&self) -> Result<()> {
        if self.http.adapter_timeout_seconds > 60 {
            return Err(
                TripCostError::config("Adapter timeout cannot exceed 60 seconds").into(),
            );
        }

        if self.http.max_retries > 1 {
            return Err(TripCostError::config(
                "Adapters allow at most one re-attempt (max_retries must be 0 or 1)",
            )
            .into());
        }

        let adj = &self.adjustment;
        if adj.lower_threshold <= 0.0 || adj.lower_threshold >= adj.upper_threshold {
            return Err(TripCostError::config(
                "Adjustment lower threshold must be positive and below the upper threshold",
            )
            .into());
        }

        if adj.min_factor <= 0.0 || adj.min_factor > 1.0 || adj.max_factor < 1.0 {
            return Err(TripCostError::config(
                "Adjustment factors must satisfy 0 < min_factor <= 1 <= max_factor",
            )
            .into());
        }

        if self.cache.ttl_hours > 168 {
            return Err(
                TripCostError::config("Cache TTL cannot exceed 168 hours (1 week)").into(),
            );
        }

        Ok(())
    }

    /// Validate that the budget split covers the whole budget
    fn validate_budget_split(&self) -> Result<()> {
        let b = &self.budget;
        let parts = [b.accommodation_pct, b.food_pct, b.travel_pct, b.leisure_pct];
        if parts.iter().any(|p| *p < 0.0) {
            return Err(TripCostError::config("Budget percentages cannot be negative").into());
        }

        let sum: f64 = parts.iter().sum();
        if (sum - 100.0).abs() > 1e-6 {
            return Err(TripCostError::config(format!(
                "Budget percentages must sum to 100, got {sum}"
            ))
            .into());
        }

        if !(0.0..1.0).contains(&b.per_night_tolerance) {
            return Err(TripCostError::config(
                "Per-night tolerance must be a fraction between 0 and 1",
            )
            .into());
        }

        Ok(())
    }

    /// Validate string configuration values
    fn validate_string_values(&self) -> Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(TripCostError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            ))
            .into());
        }

        let valid_log_formats = ["pretty", "json"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(TripCostError::config(format!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_log_formats.join(", ")
            ))
            .into());
        }

        let p = &self.providers;
        for (name, url) in [
            ("hotels", &p.hotels_base_url),
            ("google", &p.google_base_url),
            ("llm", &p.llm_base_url),
            ("weather", &p.weather_base_url),
            ("exchange", &p.exchange_base_url),
            ("search", &p.search_base_url),
        ] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(TripCostError::config(format!(
                    "Base URL for {name} must be a valid HTTP or HTTPS URL"
                ))
                .into());
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = TripCostConfig::default();
        assert_eq!(config.http.adapter_timeout_seconds, 5);
        assert_eq!(config.http.max_retries, 1);
        assert_eq!(config.adjustment.upper_threshold, 1.5);
        assert_eq!(config.adjustment.lower_threshold, 0.7);
        assert_eq!(config.adjustment.max_factor, 2.0);
        assert_eq!(config.adjustment.min_factor, 0.5);
        assert_eq!(config.budget.accommodation_pct, 50.0);
        assert_eq!(config.logging.level, "info");
        assert!(config.providers.rapidapi_key.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation_invalid_log_level() {
        let mut config = TripCostConfig::default();
        config.logging.level = "invalid".to_string();
        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Invalid log level"));
    }

    #[test]
    fn test_config_validation_retry_limit() {
        let mut config = TripCostConfig::default();
        config.http.max_retries = 3;
        let result = config.validate();
        assert!(result.unwrap_err().to_string().contains("at most one re-attempt"));
    }

    #[test]
    fn test_config_validation_budget_split() {
        let mut config = TripCostConfig::default();
        config.budget.leisure_pct = 25.0;
        let result = config.validate();
        assert!(result.unwrap_err().to_string().contains("sum to 100"));
    }

    #[test]
    fn test_config_validation_thresholds() {
        let mut config = TripCostConfig::default();
        config.adjustment.lower_threshold = 2.0;
        assert!(config.validate().is_err());

        let mut config = TripCostConfig::default();
        config.adjustment.max_factor = 0.8;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_base_url() {
        let mut config = TripCostConfig::default();
        config.providers.exchange_base_url = "ftp://rates".to_string();
        let result = config.validate();
        assert!(result.unwrap_err().to_string().contains("exchange"));
    }

    #[test]
    fn test_apply_defaults_clears_blank_keys() {
        let mut config = TripCostConfig::default();
        config.providers.google_api_key = Some("   ".to_string());
        config.providers.llm_model = String::new();
        config.http.adapter_timeout_seconds = 0;
        config.apply_defaults();
        assert!(config.providers.google_api_key.is_none());
        assert_eq!(config.providers.llm_model, "gpt-4o");
        assert_eq!(config.http.adapter_timeout_seconds, 5);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[providers]
rapidapi_key = "rapid-key-123"

[http]
adapter_timeout_seconds = 3
max_retries = 0

[logging]
format = "json"
"#
        )
        .unwrap();

        let config = TripCostConfig::load_from_path(Some(file.path().to_path_buf())).unwrap();
        assert_eq!(config.providers.rapidapi_key.as_deref(), Some("rapid-key-123"));
        assert_eq!(config.http.adapter_timeout_seconds, 3);
        assert_eq!(config.http.max_retries, 0);
        assert_eq!(config.logging.format, "json");
        assert_eq!(config.budget.food_pct, 20.0);
    }

    #[test]
    fn test_cache_location_expansion() {
        let cache = CacheConfig {
            location: "/tmp/tripcost-cache".to_string(),
            ..CacheConfig::default()
        };
        assert_eq!(cache.resolved_location(), PathBuf::from("/tmp/tripcost-cache"));

        let home_relative = CacheConfig::default().resolved_location();
        assert!(home_relative.to_string_lossy().ends_with(".cache/tripcost"));
    }

    #[test]
    fn test_config_path_generation() {
        let path = TripCostConfig::get_config_path();
        if let Some(path) = path {
            assert!(path.to_string_lossy().contains("tripcost"));
            assert!(path.to_string_lossy().contains("config.toml"));
        }
    }
}
