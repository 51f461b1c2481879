//! Remote capability providers
//!
//! Search and summarization are two independent capabilities behind their
//! own traits. The conductor only ever sees `Arc<dyn SearchProvider>` and
//! `Arc<dyn SummaryProvider>`, so a provider can be swapped (or stubbed in
//! tests) without touching resolution or planning.

use async_trait::async_trait;
use sdk::ProviderReply;

pub mod rpc;

pub use rpc::{RpcClient, RpcSearchProvider, RpcSummaryProvider};

/// Result type for provider calls
pub type Result<T> = std::result::Result<T, ProviderError>;

/// Errors from a single provider round trip
#[derive(Debug, Clone, thiserror::Error)]
pub enum ProviderError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out")]
    Timeout,

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("Malformed reply: {0}")]
    Malformed(String),
}

impl From<ProviderError> for sdk::EngineError {
    fn from(e: ProviderError) -> Self {
        match e {
            ProviderError::Rpc { message, .. } => sdk::EngineError::Rpc(message),
            ProviderError::Network(msg) => sdk::EngineError::Network(msg),
            other => sdk::EngineError::Provider(other.to_string()),
        }
    }
}

/// Looks up information for a query
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Short identifier used in logs
    fn name(&self) -> &str;

    /// Run one search for the raw query text
    async fn search(&self, query: &str) -> Result<ProviderReply>;
}

/// Condenses documents into a summary
#[async_trait]
pub trait SummaryProvider: Send + Sync {
    /// Short identifier used in logs
    fn name(&self) -> &str;

    /// Summarize `documents` in one call
    async fn summarize(&self, documents: &[String]) -> Result<ProviderReply>;
}

/// Reject replies whose confidence is not a number in [0, 1]
pub(crate) fn check_reply(reply: ProviderReply) -> Result<ProviderReply> {
    if reply.confidence.is_finite() && (0.0..=1.0).contains(&reply.confidence) {
        Ok(reply)
    } else {
        Err(ProviderError::Malformed(format!(
            "confidence {} outside [0, 1]",
            reply.confidence
        )))
    }
}
