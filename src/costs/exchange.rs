use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use crate::sources::currency::{extract_rate_from_snippet, static_rate};
use crate::sources::{self, ExchangeRateSource, WebSearchSource};

const SEARCH_RESULTS: usize = 3;

/// Where an exchange rate came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RateSource {
    WebSearch,
    ExchangeApi,
    StaticTable,
}

/// Units of `to` per one unit of `from`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExchangeQuote {
    pub from: String,
    pub to: String,
    pub rate: f64,
    pub source: RateSource,
}

/// Resolves a rate: web search snippet, then the exchange API, then the
/// static table. Unknown currencies end at 1.0.
#[derive(Clone)]
pub struct CurrencyResolver {
    search: Option<Arc<dyn WebSearchSource>>,
    exchange: Option<Arc<dyn ExchangeRateSource>>,
    timeout: Duration,
}

impl CurrencyResolver {
    pub fn new(
        search: Option<Arc<dyn WebSearchSource>>,
        exchange: Option<Arc<dyn ExchangeRateSource>>,
        timeout: Duration,
    ) -> Self {
        Self {
            search,
            exchange,
            timeout,
        }
    }

    #[instrument(skip(self))]
    pub async fn resolve(&self, from: &str, to: &str) -> ExchangeQuote {
        let from = from.trim().to_uppercase();
        let to = to.trim().to_uppercase();
        let quote = |rate, source| ExchangeQuote {
            from: from.clone(),
            to: to.clone(),
            rate,
            source,
        };

        if from == to {
            return quote(1.0, RateSource::StaticTable);
        }

        if let Some(rate) = self.from_search(&from, &to).await {
            info!("Exchange rate {} -> {} from web search: {}", from, to, rate);
            return quote(rate, RateSource::WebSearch);
        }

        if let Some(rate) = self.from_api(&from, &to).await {
            info!("Exchange rate {} -> {} from API: {}", from, to, rate);
            return quote(rate, RateSource::ExchangeApi);
        }

        let rate = if from == "USD" { static_rate(&to) } else { None };
        match rate {
            Some(rate) => quote(rate, RateSource::StaticTable),
            None => {
                warn!("No exchange rate for {} -> {}, assuming 1.0", from, to);
                quote(1.0, RateSource::StaticTable)
            }
        }
    }

    async fn from_search(&self, from: &str, to: &str) -> Option<f64> {
        let search = self.search.as_ref()?;
        let query = format!("exchange rate {from} {to}");
        let snippets = sources::query(search.name(), self.timeout, async {
            search.search(&query, SEARCH_RESULTS).await.map(Some)
        })
        .await?;

        snippets
            .iter()
            .find_map(|s| extract_rate_from_snippet(&s.body, from, to))
    }

    async fn from_api(&self, from: &str, to: &str) -> Option<f64> {
        let exchange = self.exchange.as_ref()?;
        sources::query(exchange.name(), self.timeout, exchange.fetch_rate(from, to))
            .await
            .filter(|rate| rate.is_finite() && *rate > 0.0)
    }
}
