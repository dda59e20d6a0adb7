//! Cost estimation: ranked-fallback aggregation, budget-anchored baselines,
//! budget allocation and currency resolution

pub mod aggregator;
pub mod budget;
pub mod exchange;
pub mod fallback;

pub use aggregator::CostAggregator;
pub use budget::BudgetComposer;
pub use exchange::{CurrencyResolver, ExchangeQuote, RateSource};
pub use fallback::{BaselineEstimate, FallbackResolver};
