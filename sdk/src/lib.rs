//! Turnstile SDK
//!
//! Shared library providing the wire types and error types used by both the
//! engine and the provider servers.

/// Error types and handling
pub mod errors;

/// Provider reply and JSON-RPC envelope types
pub mod types;

// Re-export commonly used types
pub use errors::{EngineError, TurnstileErrorExt};
pub use types::{
    confidence_from_text, ProviderReply, RpcErrorBody, RpcRequest, RpcResponse, INVALID_PARAMS,
    JSONRPC_VERSION, METHOD_NOT_FOUND, UPSTREAM_ERROR,
};
