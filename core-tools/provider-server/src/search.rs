//! Search backend over the Serper web search API

use crate::{str_param, BackendError, RpcBackend};
use async_trait::async_trait;
use reqwest::Client;
use sdk::ProviderReply;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use turnstile_engine::config::SearchApiConfig;

/// Source tag on every search reply
pub const SEARCH_SOURCE: &str = "serper-api";

#[derive(Debug, Deserialize)]
struct SerperResponse {
    #[serde(default)]
    organic: Vec<OrganicResult>,
}

#[derive(Debug, Deserialize)]
struct OrganicResult {
    #[serde(default)]
    snippet: Option<String>,
}

pub struct SerperSearch {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    num_results: u32,
}

impl SerperSearch {
    pub fn new(
        base_url: impl Into<String>,
        api_key: Option<String>,
        num_results: u32,
        timeout: Duration,
    ) -> Self {
        Self {
            client: Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_else(|_| Client::new()),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
            num_results,
        }
    }

    pub fn from_config(config: &SearchApiConfig, timeout: Duration) -> Self {
        let api_key = std::env::var(&config.api_key_env)
            .ok()
            .filter(|k| !k.trim().is_empty());
        if api_key.is_none() {
            tracing::warn!("{} is not set; searches will fail", config.api_key_env);
        }
        Self::new(&config.base_url, api_key, config.num_results, timeout)
    }

    /// Run one search and join the organic snippets
    pub async fn search(&self, query: &str) -> Result<ProviderReply, BackendError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| BackendError::Upstream("search API key is not configured".into()))?;

        tracing::info!("Serper search: {}", turnstile_engine::llm::preview(query, 50));

        let response = self
            .client
            .post(format!("{}/search", self.base_url))
            .header("X-API-KEY", api_key)
            .json(&json!({ "q": query, "num": self.num_results }))
            .send()
            .await
            .map_err(|e| BackendError::Upstream(format!("search request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BackendError::Upstream(format!(
                "search API returned {}: {}",
                status, body
            )));
        }

        let parsed: SerperResponse = response
            .json()
            .await
            .map_err(|e| BackendError::Upstream(format!("bad search response: {}", e)))?;

        Ok(ProviderReply::scored(join_snippets(&parsed), SEARCH_SOURCE))
    }
}

fn join_snippets(response: &SerperResponse) -> String {
    response
        .organic
        .iter()
        .filter_map(|r| r.snippet.as_deref())
        .collect::<Vec<_>>()
        .join(" || ")
}

#[async_trait]
impl RpcBackend for SerperSearch {
    fn tools(&self) -> Vec<String> {
        vec!["search".to_string()]
    }

    async fn call(&self, method: &str, params: &Value) -> Result<Value, BackendError> {
        match method {
            "search" => {
                let reply = self.search(str_param(params, "query")?).await?;
                serde_json::to_value(reply).map_err(|e| BackendError::Upstream(e.to_string()))
            }
            other => Err(BackendError::MethodNotFound(other.to_string())),
        }
    }
}
