//! HTTP API
//!
//! # Endpoints
//!
//! - POST /api/query - Run one query through the conductor
//! - GET /api/history - Every persisted turn
//! - GET /api/status - Liveness and turn count

use crate::conductor::{AnnotatedTurn, Conductor, Intent, Stage};
use crate::history::TurnRecord;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use sdk::EngineError;
use serde::Deserialize;
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Turns echoed back with every query response
pub const ECHOED_TURNS: usize = 5;

#[derive(Clone)]
struct ServerState {
    conductor: Arc<Conductor>,
}

#[derive(Debug, Deserialize)]
struct QueryRequest {
    #[serde(default)]
    query: String,
    #[serde(default)]
    intent: Option<String>,
}

/// Build the API router around a shared conductor
pub fn router(conductor: Arc<Conductor>) -> Router {
    let state = ServerState { conductor };

    Router::new()
        .route("/api/query", post(query_handler))
        .route("/api/history", get(history_handler))
        .route("/api/status", get(status_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve the API on `addr` until Ctrl-C
pub async fn serve(conductor: Arc<Conductor>, addr: SocketAddr) -> Result<(), EngineError> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| EngineError::Network(format!("Failed to bind to {}: {}", addr, e)))?;

    tracing::info!("API server listening on http://{}", addr);

    axum::serve(listener, router(conductor))
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            tracing::info!("API server shutting down gracefully");
        })
        .await
        .map_err(|e| EngineError::Network(format!("API server error: {}", e)))
}

/// JSON body for a handled query.
///
/// Stage outputs are only included when that stage executed on this call.
pub fn query_response(turn: &AnnotatedTurn, recent: &[TurnRecord]) -> Value {
    let record = &turn.record;
    let mut body = json!({
        "success": true,
        "query": record.query,
        "turn": record.turn,
        "intent": turn.intent,
        "planned_stages": turn.planned_stages,
        "executed_stages": turn.executed_stages,
        "cached_stages": turn.cached_stages,
        "failures": turn.failures,
        "last_5_messages": recent,
    });

    if turn.executed(Stage::Search) {
        body["search_results"] = json!(record.search_result);
        body["search_confidence"] = json!(record.search_confidence);
    }
    if turn.executed(Stage::Summarize) {
        body["summary"] = json!(record.summary);
        body["summary_confidence"] = json!(record.summary_confidence);
        body["summarizing_messages"] = json!(turn.summarized_turns);
        body["anchor_turn"] = json!(turn.anchor_turn);
    }
    if turn.executed(Stage::ConversationQuery) {
        body["conversation_response"] = json!(record.conversation_response);
        body["conversation_confidence"] = json!(record.conversation_confidence);
    }

    body
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(json!({ "error": message.into() }))).into_response()
}

fn engine_error_response(e: EngineError) -> Response {
    match e {
        EngineError::InvalidQuery(msg) => error_response(StatusCode::BAD_REQUEST, msg),
        other => {
            tracing::error!("Query failed: {}", other);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, other.to_string())
        }
    }
}

async fn query_handler(
    State(state): State<ServerState>,
    Json(payload): Json<QueryRequest>,
) -> Result<Json<Value>, Response> {
    let query = payload.query.trim();
    if query.is_empty() {
        return Err(error_response(StatusCode::BAD_REQUEST, "Query is required"));
    }

    let intent = payload
        .intent
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .map(Intent::from_label_or_search);

    let turn = state
        .conductor
        .handle_query(query, intent)
        .await
        .map_err(engine_error_response)?;

    let mut recent = state
        .conductor
        .recent(ECHOED_TURNS)
        .await
        .map_err(engine_error_response)?;
    recent.reverse();

    Ok(Json(query_response(&turn, &recent)))
}

async fn history_handler(State(state): State<ServerState>) -> Result<Json<Value>, Response> {
    let history = state
        .conductor
        .history()
        .await
        .map_err(engine_error_response)?;
    Ok(Json(json!({ "success": true, "history": history })))
}

async fn status_handler(State(state): State<ServerState>) -> Result<Json<Value>, Response> {
    let history = state
        .conductor
        .history()
        .await
        .map_err(engine_error_response)?;
    Ok(Json(json!({
        "status": "ok",
        "turns": history.len(),
        "version": env!("CARGO_PKG_VERSION")
    })))
}
