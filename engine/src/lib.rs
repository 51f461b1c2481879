//! Turnstile Engine Library
//!
//! This library provides the core functionality of the Turnstile engine.
//! It is used by both the main binary and integration tests.

/// Configuration management module
pub mod config;

/// Telemetry and Observability
pub mod telemetry;

/// LLM provider abstraction layer
pub mod llm;

/// Turn history records and the file-backed store
pub mod history;

/// Search and summary capability providers
pub mod providers;

/// Conductor orchestration module
pub mod conductor;

/// CLI interface module
pub mod cli;

/// Command handlers module
pub mod handlers;

/// HTTP API module
pub mod server;
