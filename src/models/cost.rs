//! Cost estimate models

use serde::{Deserialize, Serialize};
use std::fmt;

/// Spending category the aggregator resolves independently
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CostCategory {
    Accommodation,
    Food,
    Transport,
}

/// Where an estimate came from, ordered from most to least trusted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CostSource {
    LiveApi,
    LlmResearch,
    StaticTable,
    BudgetAdjusted,
    GenericDefault,
}

impl CostSource {
    /// Stable tag used in reports and logs
    #[must_use]
    pub fn tag(self) -> &'static str {
        match self {
            CostSource::LiveApi => "liveApi",
            CostSource::LlmResearch => "llmResearch",
            CostSource::StaticTable => "staticTable",
            CostSource::BudgetAdjusted => "budgetAdjusted",
            CostSource::GenericDefault => "genericDefault",
        }
    }

    /// True for sources that did not come from any live or LLM lookup
    #[must_use]
    pub fn is_degraded(self) -> bool {
        matches!(
            self,
            CostSource::StaticTable | CostSource::BudgetAdjusted | CostSource::GenericDefault
        )
    }
}

impl fmt::Display for CostSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Billing unit of an estimate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CostUnit {
    PerNight,
    PerPersonPerDay,
}

/// One resolved figure for a category.
///
/// `amount_per_unit` is the daily amount for the whole party: per-person
/// categories are already multiplied by the number of travellers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CostEstimate {
    category: CostCategory,
    amount_per_unit: f64,
    source: CostSource,
    unit: CostUnit,
}

impl CostEstimate {
    /// Negative or non-finite amounts are clamped to zero
    #[must_use]
    pub fn new(category: CostCategory, amount: f64, source: CostSource, unit: CostUnit) -> Self {
        let amount_per_unit = if amount.is_finite() { amount.max(0.0) } else { 0.0 };
        Self {
            category,
            amount_per_unit,
            source,
            unit,
        }
    }

    #[must_use]
    pub fn category(&self) -> CostCategory {
        self.category
    }

    #[must_use]
    pub fn amount(&self) -> f64 {
        self.amount_per_unit
    }

    #[must_use]
    pub fn source(&self) -> CostSource {
        self.source
    }

    #[must_use]
    pub fn unit(&self) -> CostUnit {
        self.unit
    }
}

/// Best-known daily cost for one trip, one estimate per category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedDailyCost {
    accommodation: CostEstimate,
    food: CostEstimate,
    transport: CostEstimate,
    total_per_day: f64,
    contributing_sources: Vec<CostSource>,
}

impl AggregatedDailyCost {
    /// Derives the total and the ordered, de-duplicated source list
    #[must_use]
    pub fn new(accommodation: CostEstimate, food: CostEstimate, transport: CostEstimate) -> Self {
        let total_per_day = accommodation.amount() + food.amount() + transport.amount();

        let mut contributing_sources = Vec::with_capacity(3);
        for source in [accommodation.source(), food.source(), transport.source()] {
            if !contributing_sources.contains(&source) {
                contributing_sources.push(source);
            }
        }

        Self {
            accommodation,
            food,
            transport,
            total_per_day,
            contributing_sources,
        }
    }

    #[must_use]
    pub fn accommodation(&self) -> &CostEstimate {
        &self.accommodation
    }

    #[must_use]
    pub fn food(&self) -> &CostEstimate {
        &self.food
    }

    #[must_use]
    pub fn transport(&self) -> &CostEstimate {
        &self.transport
    }

    #[must_use]
    pub fn get(&self, category: CostCategory) -> &CostEstimate {
        match category {
            CostCategory::Accommodation => &self.accommodation,
            CostCategory::Food => &self.food,
            CostCategory::Transport => &self.transport,
        }
    }

    #[must_use]
    pub fn total_per_day(&self) -> f64 {
        self.total_per_day
    }

    #[must_use]
    pub fn contributing_sources(&self) -> &[CostSource] {
        &self.contributing_sources
    }

    /// True when no category came from a live or LLM source
    #[must_use]
    pub fn is_fully_degraded(&self) -> bool {
        self.contributing_sources.iter().all(|s| s.is_degraded())
    }
}
