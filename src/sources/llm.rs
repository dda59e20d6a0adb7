//! LLM cost research over an OpenAI-compatible chat completions endpoint

use async_trait::async_trait;
use reqwest_middleware::ClientWithMiddleware;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info, instrument, warn};

use super::{CostResearchSource, LlmCostResearch, ensure_success, parse_error};
use crate::cache::{self, PersistentCache};
use crate::{Result, TripCostError};

const SOURCE: &str = "llm-research";
const TEMPERATURE: f64 = 0.3;

pub struct OpenAiCostResearcher {
    client: ClientWithMiddleware,
    endpoint: String,
    api_key: String,
    model: String,
    cache: Option<PersistentCache>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: Option<String>,
}

fn research_prompt(city: &str, num_people: u32, num_days: u32) -> String {
    format!(
        r#"Research and provide current average daily costs for {city}.
Focus on mid-range options for {num_people} person(s) for {num_days} days.

Please provide estimates for:
1. Accommodation (mid-range hotel room per night)
2. Food per person (3 meals per day - breakfast, lunch, dinner)
3. Local transportation per person (public transport, taxis, rideshares)
4. Activities/Entertainment per person (attractions, tours, experiences)

Respond in this exact JSON format:
{{
    "accommodation_per_night": number,
    "food_per_day": number,
    "transport_per_day": number,
    "activities_per_day": number,
    "total_per_day": number,
    "source_notes": "brief description of sources considered",
    "currency": "USD"
}}

Only return valid JSON, no additional text."#
    )
}

/// Pulls the JSON object out of a model answer, tolerating code fences and
/// chatter around it
fn extract_json_object(content: &str) -> Option<&str> {
    let start = content.find('{')?;
    let end = content.rfind('}')?;
    (end > start).then(|| &content[start..=end])
}

/// Parses the model answer; figures must be finite and non-negative
fn parse_research(content: &str) -> Result<LlmCostResearch> {
    let object = extract_json_object(content)
        .ok_or_else(|| TripCostError::adapter(SOURCE, "answer contained no JSON object"))?;

    let research: LlmCostResearch = serde_json::from_str(object)
        .map_err(|e| TripCostError::adapter(SOURCE, format!("answer was not valid JSON: {e}")))?;

    let figures = [
        research.accommodation_per_night,
        research.food_per_day,
        research.transport_per_day,
    ];
    if figures.iter().any(|v| !v.is_finite() || *v < 0.0) {
        return Err(TripCostError::adapter(
            SOURCE,
            "answer contained negative or non-numeric figures",
        ));
    }

    Ok(research)
}

impl OpenAiCostResearcher {
    pub fn new(
        client: ClientWithMiddleware,
        base_url: &str,
        api_key: &str,
        model: &str,
        cache: Option<PersistentCache>,
    ) -> Self {
        let trimmed = base_url.trim_end_matches('/');
        let endpoint = if trimmed.ends_with("/chat/completions") {
            trimmed.to_string()
        } else {
            format!("{trimmed}/chat/completions")
        };

        Self {
            client,
            endpoint,
            api_key: api_key.to_string(),
            model: model.to_string(),
            cache,
        }
    }

    async fn research(
        &self,
        city: &str,
        num_people: u32,
        num_days: u32,
    ) -> Result<Option<LlmCostResearch>> {
        let body = json!({
            "model": self.model,
            "messages": [{"role": "user", "content": research_prompt(city, num_people, num_days)}],
            "temperature": TEMPERATURE,
        });

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;
        ensure_success(SOURCE, &response)?;

        let chat: ChatResponse = response.json().await.map_err(|e| parse_error(SOURCE, e))?;

        let Some(content) = chat
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|c| !c.trim().is_empty())
        else {
            warn!("LLM returned an empty answer for {}", city);
            return Ok(None);
        };

        debug!("LLM answer: {}", content);
        let research = parse_research(&content)?;
        info!(
            "LLM research for {}: room {:.2}/night, food {:.2}/day, transport {:.2}/day",
            city,
            research.accommodation_per_night,
            research.food_per_day,
            research.transport_per_day
        );
        Ok(Some(research))
    }
}

#[async_trait]
impl CostResearchSource for OpenAiCostResearcher {
    fn name(&self) -> &'static str {
        SOURCE
    }

    #[instrument(skip(self))]
    async fn fetch_llm_cost_research(
        &self,
        city: &str,
        num_people: u32,
        num_days: u32,
    ) -> Result<Option<LlmCostResearch>> {
        let key = format!(
            "research:{}:{num_people}:{num_days}",
            city.trim().to_lowercase()
        );
        cache::cached(self.cache.as_ref(), &key, || {
            self.research(city, num_people, num_days)
        })
        .await
    }
}
