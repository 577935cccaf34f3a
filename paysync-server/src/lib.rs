//! HTTP API for the paysync webhook receiver.

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::Json,
    routing::{get, post},
    Router,
};
use paysync_sync::{InboundSyncHandler, WebhookVerifier};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::warn;

/// Header carrying the provider's webhook signature.
pub const SIGNATURE_HEADER: &str = "stripe-signature";

/// Everything a request needs: the verifier and the inbound handler.
pub struct AppState {
    pub verifier: WebhookVerifier,
    pub inbound: InboundSyncHandler,
}

impl AppState {
    pub fn new(verifier: WebhookVerifier, inbound: InboundSyncHandler) -> Self {
        Self { verifier, inbound }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct WebhookResponse {
    pub received: bool,
    /// `handled`, `ignored`, `duplicate`, `stale`, or `failed`.
    pub outcome: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct HealthResponse {
    pub status: String,
}

type Rejection = (StatusCode, Json<ErrorResponse>);

fn bad_request(error: impl Into<String>) -> Rejection {
    (StatusCode::BAD_REQUEST, Json(ErrorResponse { error: error.into() }))
}

/// Verified events are acknowledged with 200 even when the handler fails;
/// the failure is logged and redelivery is up to the provider.
async fn webhook_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookResponse>, Rejection> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| bad_request("missing Stripe-Signature header"))?;

    let event = state.verifier.verify(&body, signature).map_err(|e| {
        warn!("rejected webhook: {e}");
        bad_request(e.to_string())
    })?;

    let outcome = match state.inbound.handle(&event).await {
        Ok(outcome) => outcome.as_str(),
        Err(_) => "failed",
    };
    Ok(Json(WebhookResponse { received: true, outcome: outcome.to_string() }))
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok".to_string() })
}

/// Build the HTTP API router with the given state.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/webhooks/stripe", post(webhook_handler))
        .route("/health", get(health_handler))
        .with_state(state)
}
