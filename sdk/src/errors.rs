//! Error types and handling
//!
//! This module provides the error types shared across the Turnstile
//! workspace. All errors implement the `TurnstileErrorExt` trait which
//! provides user-friendly hints and indicates whether errors are recoverable.
//!
//! # Security
//!
//! Hints are static strings. They never echo the underlying message, so
//! upstream payloads and API keys cannot leak into user-facing output.

use thiserror::Error;

/// Trait for Turnstile error extensions
pub trait TurnstileErrorExt {
    /// Returns a user-friendly hint for the error
    fn user_hint(&self) -> &str;

    /// Returns whether the error is recoverable
    ///
    /// Recoverable errors can be retried or worked around. Non-recoverable
    /// errors typically require fixing configuration or the history file.
    fn is_recoverable(&self) -> bool;
}

/// Main engine error type
///
/// # Error Categories
///
/// - **Configuration**: Invalid or missing configuration
/// - **History**: The turn history file could not be read or written
/// - **Provider**: A search or summarize call failed
/// - **LLM Provider**: Chat completion failures
/// - **Query**: The submitted query was rejected before planning
///
/// # Examples
///
/// ```
/// use sdk::errors::{EngineError, TurnstileErrorExt};
///
/// let error = EngineError::Provider("search timed out".to_string());
/// println!("Hint: {}", error.user_hint());
/// assert!(error.is_recoverable());
///
/// let fatal = EngineError::Config("bad log level".to_string());
/// assert!(!fatal.is_recoverable());
/// ```
#[derive(Debug, Error)]
pub enum EngineError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Path canonicalization failed for {0:?}: {1}")]
    PathCanonicalization(std::path::PathBuf, String),

    // History store errors
    #[error("History error: {0}")]
    History(String),

    // Remote capability errors
    #[error("Provider error: {0}")]
    Provider(String),

    #[error("RPC error: {0}")]
    Rpc(String),

    // LLM provider errors
    #[error("LLM provider error: {0}")]
    LLMProvider(String),

    // Network errors
    #[error("Network error: {0}")]
    Network(String),

    // Request errors
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Unknown intent: {0}")]
    UnknownIntent(String),

    // Generic IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl TurnstileErrorExt for EngineError {
    fn user_hint(&self) -> &str {
        match self {
            Self::Config(_) => "Check your config.toml file for errors",
            Self::PathCanonicalization(_, _) => "Invalid path specified",

            Self::History(_) => "The history file could not be used. Check data_dir permissions",

            Self::Provider(_) => "A remote provider failed. Check that the provider servers are running",
            Self::Rpc(_) => "The provider server rejected the request",

            Self::LLMProvider(_) => "LLM provider unavailable. Check your API key and network",

            Self::Network(_) => "Network operation failed. Check your connection",

            Self::InvalidQuery(_) => "Query is required",
            Self::UnknownIntent(_) => "Intent must be one of: search, summarize, conversation_query",

            Self::Io(_) => "File system operation failed",
        }
    }

    fn is_recoverable(&self) -> bool {
        match self {
            // Non-recoverable errors
            Self::Config(_) | Self::PathCanonicalization(_, _) | Self::History(_) => false,

            // All other errors are potentially recoverable
            _ => true,
        }
    }
}
