//! SerpAPI Google search client.

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use super::{LlmError, LlmResult, SearchHit, WebSearch};
use crate::config::SearchSettings;
use crate::credentials::ApiKey;

const SERVICE: &str = "SerpAPI";

/// Client for SerpAPI's Google engine.
#[derive(Clone)]
pub struct SerpApiClient {
    api_key: ApiKey,
    base_url: String,
    num_results: u32,
    client: reqwest::Client,
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    organic_results: Vec<OrganicResult>,
    error: Option<String>,
}

#[derive(Deserialize)]
struct OrganicResult {
    title: Option<String>,
    link: Option<String>,
    snippet: Option<String>,
}

impl SerpApiClient {
    pub fn new(api_key: ApiKey, settings: &SearchSettings) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .build()
            .unwrap_or_default();

        Self {
            api_key,
            base_url: settings.serpapi_base_url.trim_end_matches('/').to_string(),
            num_results: settings.num_results,
            client,
        }
    }
}

#[async_trait]
impl WebSearch for SerpApiClient {
    async fn search(&self, query: &str) -> LlmResult<Vec<SearchHit>> {
        debug!(query, "Calling SerpAPI");

        let num = self.num_results.to_string();
        let response = self
            .client
            .get(format!("{}/search.json", self.base_url))
            .query(&[
                ("engine", "google"),
                ("q", query),
                ("num", num.as_str()),
                ("api_key", self.api_key.expose()),
            ])
            .send()
            .await
            .map_err(|source| LlmError::Http { service: SERVICE, source })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|source| LlmError::Http { service: SERVICE, source })?;

        if !status.is_success() {
            return Err(LlmError::Api {
                service: SERVICE,
                status: status.as_u16(),
                body: text,
            });
        }

        let parsed: SearchResponse = serde_json::from_str(&text).map_err(|e| LlmError::Decode {
            service: SERVICE,
            message: e.to_string(),
        })?;

        // SerpAPI reports some failures in a 200 body.
        if let Some(error) = parsed.error {
            if parsed.organic_results.is_empty() {
                return Err(LlmError::Api {
                    service: SERVICE,
                    status: status.as_u16(),
                    body: error,
                });
            }
        }

        let hits: Vec<SearchHit> = parsed
            .organic_results
            .into_iter()
            .filter_map(|result| {
                Some(SearchHit {
                    title: result.title?,
                    link: result.link?,
                    snippet: result.snippet,
                })
            })
            .collect();

        debug!(hits = hits.len(), "SerpAPI results received");
        Ok(hits)
    }
}
