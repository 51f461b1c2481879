//! Provider reply and JSON-RPC envelope types

use serde::{Deserialize, Serialize};

/// JSON-RPC protocol version sent and accepted by every endpoint
pub const JSONRPC_VERSION: &str = "2.0";

/// Error code for an unrecognised RPC method
pub const METHOD_NOT_FOUND: i64 = -32601;

/// Error code for malformed params
pub const INVALID_PARAMS: i64 = -32602;

/// Error code for a failure in the upstream API behind a provider server
pub const UPSTREAM_ERROR: i64 = -32000;

/// Result of a search or summarize call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderReply {
    /// Generated or retrieved text
    pub text: String,

    /// Confidence in [0, 1]
    pub confidence: f64,

    /// Where the text came from (e.g. "serper-api", a model name)
    #[serde(default)]
    pub source: String,
}

impl ProviderReply {
    /// Build a reply, scoring confidence from the text itself
    pub fn scored(text: impl Into<String>, source: impl Into<String>) -> Self {
        let text = text.into();
        let confidence = confidence_from_text(&text);
        Self {
            text,
            confidence,
            source: source.into(),
        }
    }
}

/// JSON-RPC 2.0 request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcRequest {
    pub jsonrpc: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
    pub id: u64,
}

impl RpcRequest {
    /// Create a new request envelope
    pub fn new(method: impl Into<String>, params: serde_json::Value, id: u64) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            method: method.into(),
            params,
            id,
        }
    }
}

/// JSON-RPC 2.0 error object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcErrorBody {
    pub code: i64,
    pub message: String,
}

/// JSON-RPC 2.0 response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcResponse {
    #[serde(default = "default_jsonrpc")]
    pub jsonrpc: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcErrorBody>,
    #[serde(default)]
    pub id: u64,
}

impl RpcResponse {
    /// Successful response carrying `result`
    pub fn success(id: u64, result: serde_json::Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            result: Some(result),
            error: None,
            id,
        }
    }

    /// Error response
    pub fn failure(id: u64, code: i64, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            result: None,
            error: Some(RpcErrorBody {
                code,
                message: message.into(),
            }),
            id,
        }
    }
}

fn default_jsonrpc() -> String {
    JSONRPC_VERSION.to_string()
}

/// Heuristic confidence for generated text: longer answers score higher,
/// clamped to [0.4, 0.95] and rounded to two decimals.
pub fn confidence_from_text(text: &str) -> f64 {
    let words = text.split_whitespace().count() as f64;
    let raw = (words / 200.0).clamp(0.4, 0.95);
    (raw * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_confidence_bounds() {
        assert_eq!(confidence_from_text(""), 0.4);
        assert_eq!(confidence_from_text("one two three"), 0.4);

        let long = "word ".repeat(1000);
        assert_eq!(confidence_from_text(&long), 0.95);

        let mid = "word ".repeat(150);
        assert_eq!(confidence_from_text(&mid), 0.75);
    }

    #[test]
    fn test_rpc_request_envelope() {
        let req = RpcRequest::new("search", json!({"query": "rust"}), 7);
        let value = serde_json::to_value(&req).unwrap();
        assert_eq!(value["jsonrpc"], "2.0");
        assert_eq!(value["method"], "search");
        assert_eq!(value["params"]["query"], "rust");
        assert_eq!(value["id"], 7);
    }

    #[test]
    fn test_rpc_response_omits_empty_members() {
        let ok = serde_json::to_value(RpcResponse::success(1, json!(["search"]))).unwrap();
        assert!(ok.get("error").is_none());
        assert_eq!(ok["result"], json!(["search"]));

        let err = serde_json::to_value(RpcResponse::failure(2, METHOD_NOT_FOUND, "nope")).unwrap();
        assert!(err.get("result").is_none());
        assert_eq!(err["error"]["code"], -32601);
    }

    #[test]
    fn test_provider_reply_source_optional() {
        let reply: ProviderReply =
            serde_json::from_value(json!({"text": "hi", "confidence": 0.5})).unwrap();
        assert_eq!(reply.source, "");
    }
}
