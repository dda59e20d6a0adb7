//! Error types and handling for `TripCost`

use chrono::NaiveDate;
use thiserror::Error;

/// Main error type for the `TripCost` library
#[derive(Error, Debug)]
pub enum TripCostError {
    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// A single data source failed (network, timeout, bad payload).
    /// Absorbed by the aggregator, never returned from planning.
    #[error("Source '{source_name}' unavailable: {message}")]
    AdapterUnavailable {
        source_name: String,
        message: String,
    },

    /// Trip end date precedes its start date
    #[error("Invalid trip window: end date {end} is before start date {start}")]
    InvalidTripWindow { start: NaiveDate, end: NaiveDate },

    /// Input validation errors
    #[error("Invalid input: {message}")]
    Validation { message: String },

    /// I/O operation errors
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

impl TripCostError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new adapter error for the named source
    pub fn adapter<N: Into<String>, S: Into<String>>(source_name: N, message: S) -> Self {
        Self::AdapterUnavailable {
            source_name: source_name.into(),
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Whether this error is a user input problem rather than an infrastructure one
    #[must_use]
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            TripCostError::InvalidTripWindow { .. } | TripCostError::Validation { .. }
        )
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            TripCostError::Config { .. } => {
                "Configuration error. Please check your config file and API keys.".to_string()
            }
            TripCostError::AdapterUnavailable { source_name, .. } => {
                format!("Data source '{source_name}' is currently unavailable.")
            }
            TripCostError::InvalidTripWindow { .. } => {
                "End date must be on or after the start date.".to_string()
            }
            TripCostError::Validation { message } => {
                format!("Invalid input: {message}")
            }
            TripCostError::Io { .. } => {
                "File operation failed. Please check file permissions.".to_string()
            }
        }
    }
}

impl From<reqwest_middleware::Error> for TripCostError {
    fn from(err: reqwest_middleware::Error) -> Self {
        TripCostError::adapter("http", err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let config_err = TripCostError::config("missing API key");
        assert!(matches!(config_err, TripCostError::Config { .. }));

        let adapter_err = TripCostError::adapter("hotels", "connection failed");
        assert!(matches!(
            adapter_err,
            TripCostError::AdapterUnavailable { ref source_name, .. } if source_name == "hotels"
        ));

        let validation_err = TripCostError::validation("city is empty");
        assert!(matches!(validation_err, TripCostError::Validation { .. }));
    }

    #[test]
    fn test_user_messages() {
        let config_err = TripCostError::config("test");
        assert!(config_err.user_message().contains("Configuration error"));

        let adapter_err = TripCostError::adapter("places", "boom");
        assert!(adapter_err.user_message().contains("places"));

        let window_err = TripCostError::InvalidTripWindow {
            start: NaiveDate::from_ymd_opt(2024, 6, 10).unwrap(),
            end: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
        };
        assert!(window_err.user_message().contains("End date"));
        assert!(window_err.to_string().contains("2024-06-01"));
    }

    #[test]
    fn test_user_error_classification() {
        assert!(TripCostError::validation("x").is_user_error());
        assert!(!TripCostError::adapter("llm", "x").is_user_error());
        assert!(!TripCostError::config("x").is_user_error());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: TripCostError = io_err.into();
        assert!(matches!(err, TripCostError::Io { .. }));
    }
}
