//! Trip request and validated trip context

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::{Result, TripCostError};

/// Longest trip, in days, that can be planned
pub const MAX_TRIP_DAYS: u32 = 365;

/// Largest accepted total budget (USD)
pub const MAX_TOTAL_BUDGET: f64 = 1_000_000_000.0;

/// Raw planning input as the user typed it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TripRequest {
    pub city: String,
    /// `YYYY-MM-DD`
    pub start_date: String,
    /// `YYYY-MM-DD`, inclusive
    pub end_date: String,
    pub num_people: u32,
    /// Total trip budget in USD
    pub total_budget: f64,
    /// ISO 4217 code the budget should also be shown in
    pub currency: String,
}

/// Validated, read-only description of one planning request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripContext {
    city: String,
    start_date: NaiveDate,
    end_date: NaiveDate,
    num_days: u32,
    num_people: u32,
    total_budget: f64,
    target_currency: String,
}

impl TripRequest {
    /// Parse dates and validate every field, producing a [`TripContext`]
    pub fn into_context(self) -> Result<TripContext> {
        let start = parse_date("start date", &self.start_date)?;
        let end = parse_date("end date", &self.end_date)?;
        TripContext::new(
            self.city,
            start,
            end,
            self.num_people,
            self.total_budget,
            self.currency,
        )
    }
}

fn parse_date(field: &str, value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| {
        TripCostError::validation(format!(
            "{field} '{value}' is not a valid date in YYYY-MM-DD format (e.g., 2024-06-15)"
        ))
    })
}

impl TripContext {
    /// Build a context, rejecting an inverted trip window and nonsensical inputs
    pub fn new(
        city: impl Into<String>,
        start_date: NaiveDate,
        end_date: NaiveDate,
        num_people: u32,
        total_budget: f64,
        target_currency: impl Into<String>,
    ) -> Result<Self> {
        if end_date < start_date {
            return Err(TripCostError::InvalidTripWindow {
                start: start_date,
                end: end_date,
            });
        }

        let city = city.into().trim().to_string();
        if city.is_empty() {
            return Err(TripCostError::validation("City cannot be empty"));
        }

        if num_people == 0 {
            return Err(TripCostError::validation(
                "Number of travellers must be at least 1",
            ));
        }

        if !total_budget.is_finite() || total_budget <= 0.0 {
            return Err(TripCostError::validation(
                "Total budget must be a positive amount",
            ));
        }
        if total_budget > MAX_TOTAL_BUDGET {
            return Err(TripCostError::validation(format!(
                "Total budget cannot exceed {MAX_TOTAL_BUDGET}"
            )));
        }

        let target_currency = target_currency.into().trim().to_ascii_uppercase();
        if target_currency.len() != 3 || !target_currency.chars().all(|c| c.is_ascii_alphabetic())
        {
            return Err(TripCostError::validation(format!(
                "Currency code '{target_currency}' must be a three-letter ISO code"
            )));
        }

        let span = (end_date - start_date).num_days() + 1;
        let num_days = u32::try_from(span)
            .ok()
            .filter(|days| *days <= MAX_TRIP_DAYS)
            .ok_or_else(|| {
                TripCostError::validation(format!(
                    "Trip cannot be longer than {MAX_TRIP_DAYS} days"
                ))
            })?;

        Ok(Self {
            city,
            start_date,
            end_date,
            num_days,
            num_people,
            total_budget,
            target_currency,
        })
    }

    #[must_use]
    pub fn city(&self) -> &str {
        &self.city
    }

    /// Lookup key for static tables: trimmed and lowercased
    #[must_use]
    pub fn city_key(&self) -> String {
        self.city.trim().to_lowercase()
    }

    #[must_use]
    pub fn start_date(&self) -> NaiveDate {
        self.start_date
    }

    #[must_use]
    pub fn end_date(&self) -> NaiveDate {
        self.end_date
    }

    /// Inclusive day count, always at least 1
    #[must_use]
    pub fn num_days(&self) -> u32 {
        self.num_days
    }

    #[must_use]
    pub fn num_people(&self) -> u32 {
        self.num_people
    }

    #[must_use]
    pub fn total_budget(&self) -> f64 {
        self.total_budget
    }

    #[must_use]
    pub fn target_currency(&self) -> &str {
        &self.target_currency
    }

    /// Budget available per trip day
    #[must_use]
    pub fn implied_daily_budget(&self) -> f64 {
        self.total_budget / f64::from(self.num_days)
    }

    /// Every date of the trip, start to end inclusive
    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        (0..u64::from(self.num_days)).filter_map(|offset| {
            self.start_date.checked_add_days(Days::new(offset))
        })
    }
}
