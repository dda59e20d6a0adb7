//! `TripCost` - Multi-source trip cost estimation
//!
//! This library combines live hotel and restaurant prices, LLM cost research
//! and static per-city baselines into a best-effort daily cost estimate,
//! then turns it into a budget plan and verdict for a trip.

pub mod cache;
pub mod config;
pub mod costs;
pub mod error;
pub mod logging;
pub mod models;
pub mod planner;
pub mod sources;

// Re-export core types for public API
pub use cache::PersistentCache;
pub use config::TripCostConfig;
pub use costs::{
    BaselineEstimate, BudgetComposer, CostAggregator, CurrencyResolver, ExchangeQuote,
    FallbackResolver, RateSource,
};
pub use error::TripCostError;
pub use models::{
    AggregatedDailyCost, BudgetPlan, BudgetStatus, CostCategory, CostEstimate, CostSource,
    TripContext, TripRequest,
};
pub use planner::{TripPlanner, TripReport, WeatherOutlook};
pub use sources::SourceSet;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, TripCostError>;
