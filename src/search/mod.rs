//! Client for the external case-search API.
//!
//! One endpoint: `POST {AI_SEARCH_API_URL}/one_percent_search` with
//! `{query}`. Failures are typed here; the search tool handler decides
//! what to do with them (it degrades to an empty payload).

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("search request failed: {0}")]
    Network(#[from] reqwest::Error),
    #[error("search API error {status}: {body}")]
    Api { status: u16, body: String },
}

/// One raw search hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub summary: String,
}

/// Normalized search payload handed to the summarizer. Optional wire
/// fields are filled with their empty values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchPayload {
    pub results: Vec<SearchResult>,
    pub query: String,
    pub images: Vec<Value>,
    pub number_of_results: u64,
}

impl SearchPayload {
    /// Degraded payload used when the search API is unreachable.
    pub fn empty(query: &str) -> Self {
        Self {
            results: Vec::new(),
            query: query.to_string(),
            images: Vec::new(),
            number_of_results: 0,
        }
    }
}

#[derive(Debug, Serialize)]
struct SearchRequest<'a> {
    query: &'a str,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    results: Vec<SearchResult>,
    images: Option<Vec<Value>>,
    number_of_results: Option<u64>,
}

/// HTTP client for the search collaborator.
pub struct SearchClient {
    client: Client,
    endpoint: String,
}

impl SearchClient {
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent("Vantage/0.1")
            .build()
            .unwrap_or_default();

        Self {
            client,
            endpoint: format!("{}/one_percent_search", base_url.trim_end_matches('/')),
        }
    }

    pub async fn search(&self, query: &str) -> Result<SearchPayload, SearchError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&SearchRequest { query })
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response
                .text()
                .await
                .unwrap_or_else(|e| format!("(failed to read body: {})", e));
            return Err(SearchError::Api { status, body });
        }

        let raw: SearchResponse = response.json().await?;
        Ok(SearchPayload {
            results: raw.results,
            query: query.to_string(),
            images: raw.images.unwrap_or_default(),
            number_of_results: raw.number_of_results.unwrap_or(0),
        })
    }
}
