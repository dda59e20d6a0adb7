//! DuckDuckGo Instant Answer search

use async_trait::async_trait;
use reqwest_middleware::ClientWithMiddleware;
use serde::Deserialize;
use tracing::{debug, instrument};

use super::{SearchSnippet, WebSearchSource, ensure_success, parse_error};
use crate::Result;

const SOURCE: &str = "duckduckgo";

pub struct DuckDuckGoClient {
    client: ClientWithMiddleware,
    base_url: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct InstantAnswer {
    #[serde(default)]
    heading: String,
    #[serde(default)]
    abstract_text: String,
    #[serde(default)]
    related_topics: Vec<RelatedTopic>,
}

/// Topics are either plain hits or named groups of hits
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RelatedTopic {
    Hit {
        #[serde(rename = "Text")]
        text: String,
    },
    Group {
        #[serde(rename = "Name", default)]
        name: String,
        #[serde(rename = "Topics", default)]
        topics: Vec<RelatedTopic>,
    },
}

fn flatten_topics(topics: Vec<RelatedTopic>, heading: &str, out: &mut Vec<SearchSnippet>) {
    for topic in topics {
        match topic {
            RelatedTopic::Hit { text } if !text.trim().is_empty() => out.push(SearchSnippet {
                title: heading.to_string(),
                body: text,
            }),
            RelatedTopic::Hit { .. } => {}
            RelatedTopic::Group { name, topics } => flatten_topics(topics, &name, out),
        }
    }
}

fn into_snippets(answer: InstantAnswer, max_results: usize) -> Vec<SearchSnippet> {
    let mut snippets = Vec::new();
    if !answer.abstract_text.trim().is_empty() {
        snippets.push(SearchSnippet {
            title: answer.heading.clone(),
            body: answer.abstract_text,
        });
    }
    flatten_topics(answer.related_topics, &answer.heading, &mut snippets);
    snippets.truncate(max_results);
    snippets
}

impl DuckDuckGoClient {
    pub fn new(client: ClientWithMiddleware, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl WebSearchSource for DuckDuckGoClient {
    fn name(&self) -> &'static str {
        SOURCE
    }

    #[instrument(skip(self))]
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchSnippet>> {
        let url = format!(
            "{}/?q={}&format=json&no_html=1&skip_disambig=1",
            self.base_url,
            urlencoding::encode(query)
        );

        let response = self.client.get(&url).send().await?;
        ensure_success(SOURCE, &response)?;
        let answer: InstantAnswer = response.json().await.map_err(|e| parse_error(SOURCE, e))?;

        let snippets = into_snippets(answer, max_results);
        debug!("{} snippets for {:?}", snippets.len(), query);
        Ok(snippets)
    }
}
