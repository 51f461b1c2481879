//! LLM Provider Abstraction Layer
//!
//! This module provides a common interface for chat-completion providers.
//! Intent detection, conversation answers and the summary server all talk
//! to an LLM through the `LLMProvider` trait, so tests can swap in a stub
//! and deployments can point at any OpenAI-compatible endpoint.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

pub mod openai;

/// Result type for LLM operations
pub type Result<T> = std::result::Result<T, LLMError>;

/// Errors that can occur during LLM operations
#[derive(Debug, thiserror::Error)]
pub enum LLMError {
    #[error("Provider unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Timeout")]
    Timeout,

    #[error("Parse error: {0}")]
    ParseError(String),
}

impl From<LLMError> for sdk::EngineError {
    fn from(e: LLMError) -> Self {
        match e {
            LLMError::NetworkError(msg) => sdk::EngineError::Network(msg),
            other => sdk::EngineError::LLMProvider(other.to_string()),
        }
    }
}

/// Message in a chat completion request
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    /// Role of the message sender
    pub role: MessageRole,

    /// Content of the message
    pub content: String,
}

impl Message {
    /// Create a new user message
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    /// Create a new system message
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }
}

/// Role of a message sender
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// User message
    User,

    /// Assistant message
    Assistant,

    /// System message
    System,
}

impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageRole::User => write!(f, "user"),
            MessageRole::Assistant => write!(f, "assistant"),
            MessageRole::System => write!(f, "system"),
        }
    }
}

/// LLM Provider trait that all providers must implement
#[async_trait]
pub trait LLMProvider: Send + Sync {
    /// Returns the name of the provider (e.g., "openai")
    fn name(&self) -> &str;

    /// Returns the model the provider sends requests to
    fn model(&self) -> &str;

    /// Generate a completion for the conversation
    ///
    /// # Arguments
    /// * `messages` - System prompt followed by user/assistant turns
    /// * `temperature` - Sampling temperature, provider default when `None`
    ///
    /// # Returns
    /// * `Ok(String)` - The assistant's reply, trimmed
    /// * `Err(LLMError)` - If the request fails
    async fn generate(&self, messages: &[Message], temperature: Option<f32>) -> Result<String>;

    /// Check if the provider is currently usable, without a request.
    /// Default implementation returns true.
    async fn check_health(&self) -> bool {
        true
    }
}

/// Cut `text` to at most `max_chars` characters, appending `...` when cut.
///
/// Counts chars, not bytes, so multi-byte text is never split mid-codepoint.
pub fn preview(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => format!("{}...", &text[..byte_idx]),
        None => text.to_string(),
    }
}
