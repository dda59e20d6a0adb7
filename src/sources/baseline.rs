//! Static per-city cost tables (USD)
//!
//! Keys are lowercase city names; callers pass [`TripContext::city_key`].
//!
//! [`TripContext::city_key`]: crate::models::TripContext::city_key

use serde::{Deserialize, Serialize};

/// Per-person-per-day accommodation and food baseline
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BaselineCosts {
    pub accommodation: f64,
    pub food: f64,
}

/// Used for cities missing from [`BASELINE_COSTS`]
pub const GENERIC_BASELINE: BaselineCosts = BaselineCosts {
    accommodation: 100.0,
    food: 30.0,
};

/// Per-person daily transport when neither the table nor research knows better
pub const GENERIC_TRANSPORT_PER_DAY: f64 = 8.0;

const BASELINE_COSTS: &[(&str, f64, f64)] = &[
    ("dubai", 120.0, 40.0),
    ("london", 150.0, 50.0),
    ("new york", 180.0, 60.0),
    ("paris", 140.0, 45.0),
    ("tokyo", 130.0, 35.0),
    ("singapore", 140.0, 40.0),
    ("bangkok", 60.0, 20.0),
    ("bali", 80.0, 25.0),
    ("mumbai", 70.0, 15.0),
    ("delhi", 65.0, 15.0),
    ("bangalore", 75.0, 18.0),
    ("chennai", 60.0, 15.0),
    ("kolkata", 55.0, 12.0),
    ("hyderabad", 65.0, 16.0),
    ("pune", 60.0, 15.0),
];

const TRANSPORT_COSTS: &[(&str, f64)] = &[
    ("dubai", 25.0),
    ("london", 15.0),
    ("new york", 12.0),
    ("paris", 8.0),
    ("tokyo", 10.0),
    ("singapore", 8.0),
    ("bangkok", 5.0),
    ("bali", 8.0),
    ("mumbai", 3.0),
    ("delhi", 3.0),
    ("bangalore", 4.0),
    ("chennai", 3.0),
    ("kolkata", 3.0),
    ("hyderabad", 4.0),
    ("pune", 3.0),
];

fn normalise(city_key: &str) -> String {
    city_key.trim().to_lowercase()
}

/// Accommodation/food baseline for a known city
#[must_use]
pub fn lookup_baseline_costs(city_key: &str) -> Option<BaselineCosts> {
    let key = normalise(city_key);
    BASELINE_COSTS
        .iter()
        .find(|(city, _, _)| *city == key)
        .map(|&(_, accommodation, food)| BaselineCosts {
            accommodation,
            food,
        })
}

/// Per-person daily transport cost for a known city
#[must_use]
pub fn lookup_transport_baseline(city_key: &str) -> Option<f64> {
    let key = normalise(city_key);
    TRANSPORT_COSTS
        .iter()
        .find(|(city, _)| *city == key)
        .map(|&(_, cost)| cost)
}
