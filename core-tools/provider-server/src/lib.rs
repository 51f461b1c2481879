//! Provider Servers
//!
//! JSON-RPC 2.0 servers exposing the search and summarize capabilities the
//! engine calls through `providers::rpc`.
//!
//! # Endpoints
//!
//! - POST /rpc - `list_tools`, plus `search` or `summarize`
//! - GET /health - Liveness

use async_trait::async_trait;
use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use sdk::{EngineError, RpcRequest, RpcResponse, INVALID_PARAMS, METHOD_NOT_FOUND, UPSTREAM_ERROR};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub mod search;
pub mod summary;

pub use search::SerperSearch;
pub use summary::LlmSummarizer;

/// Failure of one RPC method call
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BackendError {
    #[error("Method not found: {0}")]
    MethodNotFound(String),

    #[error("Invalid params: {0}")]
    InvalidParams(String),

    #[error("{0}")]
    Upstream(String),
}

impl BackendError {
    /// JSON-RPC error code for this failure
    pub fn code(&self) -> i64 {
        match self {
            BackendError::MethodNotFound(_) => METHOD_NOT_FOUND,
            BackendError::InvalidParams(_) => INVALID_PARAMS,
            BackendError::Upstream(_) => UPSTREAM_ERROR,
        }
    }
}

/// One capability served over `/rpc`
#[async_trait]
pub trait RpcBackend: Send + Sync {
    /// Methods reported by `list_tools`
    fn tools(&self) -> Vec<String>;

    /// Run `method` with `params` and return the `result` value
    async fn call(&self, method: &str, params: &Value) -> Result<Value, BackendError>;
}

#[derive(Clone)]
struct ServerState {
    backend: Arc<dyn RpcBackend>,
}

/// Router serving one backend at `/rpc`
pub fn rpc_router(backend: Arc<dyn RpcBackend>) -> Router {
    Router::new()
        .route("/rpc", post(rpc_handler))
        .route("/health", get(health_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(ServerState { backend })
}

/// Serve `router` on `addr` until Ctrl-C
pub async fn serve(router: Router, addr: SocketAddr, name: &str) -> Result<(), EngineError> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| EngineError::Network(format!("Failed to bind to {}: {}", addr, e)))?;

    tracing::info!("{} server listening on http://{}/rpc", name, addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            tracing::info!("Provider server shutting down gracefully");
        })
        .await
        .map_err(|e| EngineError::Network(format!("Provider server error: {}", e)))
}

/// Dispatch one request to `backend`
pub async fn dispatch(backend: &dyn RpcBackend, request: &RpcRequest) -> RpcResponse {
    if request.method == "list_tools" {
        return RpcResponse::success(request.id, json!(backend.tools()));
    }

    match backend.call(&request.method, &request.params).await {
        Ok(result) => RpcResponse::success(request.id, result),
        Err(e) => {
            tracing::warn!("RPC method '{}' failed: {}", request.method, e);
            RpcResponse::failure(request.id, e.code(), e.to_string())
        }
    }
}

async fn rpc_handler(
    State(state): State<ServerState>,
    Json(request): Json<RpcRequest>,
) -> Json<RpcResponse> {
    tracing::debug!("RPC request '{}' (id {})", request.method, request.id);
    Json(dispatch(state.backend.as_ref(), &request).await)
}

async fn health_handler() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// String parameter `key`, or `InvalidParams`
pub(crate) fn str_param<'a>(params: &'a Value, key: &str) -> Result<&'a str, BackendError> {
    params
        .get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| BackendError::InvalidParams(format!("missing string param '{}'", key)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    struct Echo;

    #[async_trait]
    impl RpcBackend for Echo {
        fn tools(&self) -> Vec<String> {
            vec!["echo".to_string()]
        }

        async fn call(&self, method: &str, params: &Value) -> Result<Value, BackendError> {
            match method {
                "echo" => Ok(json!({ "text": str_param(params, "text")? })),
                "boom" => Err(BackendError::Upstream("upstream down".into())),
                other => Err(BackendError::MethodNotFound(other.to_string())),
            }
        }
    }

    async fn post_rpc(body: Value) -> RpcResponse {
        let response = rpc_router(Arc::new(Echo))
            .oneshot(
                Request::post("/rpc")
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_list_tools() {
        let resp = post_rpc(json!({"jsonrpc": "2.0", "method": "list_tools", "params": {}, "id": 7})).await;
        assert_eq!(resp.id, 7);
        assert_eq!(resp.result, Some(json!(["echo"])));
    }

    #[tokio::test]
    async fn test_unknown_method() {
        let resp = post_rpc(json!({"jsonrpc": "2.0", "method": "nope", "params": {}, "id": 1})).await;
        let err = resp.error.unwrap();
        assert_eq!(err.code, METHOD_NOT_FOUND);
        assert!(resp.result.is_none());
    }

    #[tokio::test]
    async fn test_invalid_params() {
        let resp = post_rpc(json!({"jsonrpc": "2.0", "method": "echo", "params": {}, "id": 2})).await;
        assert_eq!(resp.error.unwrap().code, INVALID_PARAMS);
    }

    #[tokio::test]
    async fn test_upstream_error() {
        let resp = post_rpc(json!({"jsonrpc": "2.0", "method": "boom", "params": {}, "id": 3})).await;
        let err = resp.error.unwrap();
        assert_eq!(err.code, UPSTREAM_ERROR);
        assert_eq!(err.message, "upstream down");
    }

    #[tokio::test]
    async fn test_success() {
        let resp = post_rpc(json!({"jsonrpc": "2.0", "method": "echo", "params": {"text": "hi"}, "id": 4})).await;
        assert_eq!(resp.result, Some(json!({"text": "hi"})));
    }
}
