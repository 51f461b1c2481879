//! JSON-RPC clients for the search and summary provider servers

use super::{check_reply, ProviderError, Result, SearchProvider, SummaryProvider};
use async_trait::async_trait;
use reqwest::Client;
use sdk::{ProviderReply, RpcRequest, RpcResponse};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::{debug, error, info};

/// Minimal JSON-RPC 2.0 client bound to one `/rpc` URL
pub struct RpcClient {
    url: String,
    client: Client,
    next_id: AtomicU64,
}

impl RpcClient {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Self {
        let url = url.into();
        info!("Initialized RPC client for server: {}", url);
        Self {
            url,
            client: Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_else(|_| Client::new()),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Call `method` and return its `result` member
    pub async fn call(&self, method: &str, params: Value) -> Result<Value> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let request = RpcRequest::new(method, params, id);

        debug!("Calling RPC server at {} with method '{}'", self.url, method);

        let response = self
            .client
            .post(&self.url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ProviderError::Timeout
                } else {
                    ProviderError::Network(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let envelope: RpcResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Malformed(e.to_string()))?;

        if let Some(err) = envelope.error {
            error!("RPC server error: {}", err.message);
            return Err(ProviderError::Rpc {
                code: err.code,
                message: err.message,
            });
        }

        debug!("RPC server response received for method '{}'", method);
        envelope
            .result
            .ok_or_else(|| ProviderError::Malformed("response has neither result nor error".into()))
    }

    /// Ask the server which methods it serves
    pub async fn list_tools(&self) -> Result<Vec<String>> {
        let result = self.call("list_tools", json!({})).await?;
        serde_json::from_value(result).map_err(|e| ProviderError::Malformed(e.to_string()))
    }

    async fn call_for_reply(&self, method: &str, params: Value) -> Result<ProviderReply> {
        let result = self.call(method, params).await?;
        let reply: ProviderReply =
            serde_json::from_value(result).map_err(|e| ProviderError::Malformed(e.to_string()))?;
        check_reply(reply)
    }
}

/// Search capability served by the search provider server
pub struct RpcSearchProvider {
    rpc: RpcClient,
}

impl RpcSearchProvider {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            rpc: RpcClient::new(url, timeout),
        }
    }

    pub fn client(&self) -> &RpcClient {
        &self.rpc
    }
}

#[async_trait]
impl SearchProvider for RpcSearchProvider {
    fn name(&self) -> &str {
        "rpc-search"
    }

    async fn search(&self, query: &str) -> Result<ProviderReply> {
        info!(
            "Search: calling {} with query: {}",
            self.rpc.url(),
            crate::llm::preview(query, 50)
        );
        self.rpc.call_for_reply("search", json!({ "query": query })).await
    }
}

/// Summarize capability served by the summary provider server
pub struct RpcSummaryProvider {
    rpc: RpcClient,
}

impl RpcSummaryProvider {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            rpc: RpcClient::new(url, timeout),
        }
    }

    pub fn client(&self) -> &RpcClient {
        &self.rpc
    }
}

#[async_trait]
impl SummaryProvider for RpcSummaryProvider {
    fn name(&self) -> &str {
        "rpc-summary"
    }

    async fn summarize(&self, documents: &[String]) -> Result<ProviderReply> {
        info!(
            "Summary: calling {} with {} documents",
            self.rpc.url(),
            documents.len()
        );
        self.rpc
            .call_for_reply("summarize", json!({ "documents": documents }))
            .await
    }
}
