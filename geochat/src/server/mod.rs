//! Relay server - a thin, stateless HTTP front for the upstream AI API.
//!
//! Endpoints:
//! - POST /api/gemini-chat - Relay a message plus history, answer `{response}` or `{error}`
//! - GET /health - Liveness probe
//!
//! Every failure is turned into the JSON error shape here; nothing escapes as a raw error.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tracing::{debug, error, info, warn};

use crate::error::RelayError;
use crate::relay::{ChatRequest, ChatResponse, ErrorResponse, GeminiRelay, RELAY_ROUTE};

/// Shared server state.
pub struct ServerState {
    relay: GeminiRelay,
}

/// Build the relay router.
pub fn router(relay: GeminiRelay) -> Router {
    let state = Arc::new(ServerState { relay });

    Router::new()
        .route(RELAY_ROUTE, post(chat_handler))
        .route("/health", get(health_handler))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Start the server on `127.0.0.1:port`.
pub async fn start_server(port: u16, relay: GeminiRelay) -> Result<()> {
    if !relay.config().has_api_key() {
        warn!("GEMINI_API_KEY is not set; every relay request will fail with a configuration error");
    }

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("GeoScience Chat relay listening on http://{addr}");

    serve(listener, relay).await
}

/// Serve the relay on an already bound listener.
pub async fn serve(listener: TcpListener, relay: GeminiRelay) -> Result<()> {
    axum::serve(listener, router(relay))
        .await
        .context("Server error")
}

// === Handlers ===

async fn health_handler() -> &'static str {
    "ok"
}

async fn chat_handler(State(state): State<Arc<ServerState>>, body: Bytes) -> Response {
    match relay_turn(&state, &body).await {
        Ok(response) => Json(ChatResponse { response }).into_response(),
        Err(e) => error_response(&e),
    }
}

async fn relay_turn(state: &ServerState, body: &[u8]) -> Result<String, RelayError> {
    let req: ChatRequest = serde_json::from_slice(body)
        .map_err(|e| RelayError::Unhandled(format!("malformed request body: {e}")))?;

    let message = req.message.unwrap_or_default();
    if message.trim().is_empty() {
        return Err(RelayError::InvalidRequest("no message in request".to_string()));
    }

    state.relay.respond(&message, &req.history).await
}

fn error_response(err: &RelayError) -> Response {
    match err {
        RelayError::InvalidRequest(_) => debug!(error = %err, "Rejected relay request"),
        RelayError::Configuration(_) => error!(error = %err, "Relay is misconfigured"),
        RelayError::Upstream { status, body } => {
            error!(status, body = %body, "Upstream API error");
        }
        RelayError::Network(_) => error!(error = %err, "Failed to reach upstream API"),
        RelayError::Unhandled(_) => error!(error = %err, "Error in relay request"),
    }

    let status = StatusCode::from_u16(err.status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (
        status,
        Json(ErrorResponse {
            error: err.public_message().to_string(),
        }),
    )
        .into_response()
}
