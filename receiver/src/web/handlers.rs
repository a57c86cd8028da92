//! HTTP endpoint handlers and routing.
//!
//! Handlers only turn the request into a [`RequestContext`], call the
//! pipeline in [`super::receiver`], and render the result.

use std::any::Any;
use std::sync::Arc;

use axum::{
    extract::State,
    http::Method,
    response::{IntoResponse, Response},
    routing::any,
    Json, Router,
};
use serde::Serialize;
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};
use tracing::{error, info};

use super::context::RequestContext;
use super::error::WebhookError;
use super::receiver::{last_delivery, receive_delivery};
use crate::store::InboxStore;
use crate::Config;

/// Ingestion endpoint path.
pub const WEBHOOK_PATH: &str = "/webhooks/cryptostrazo";

/// Diagnostic view path.
pub const LAST_PATH: &str = "/webhooks/cryptostrazo/last";

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: Arc<InboxStore>,
}

impl AppState {
    pub fn new(config: Config, store: InboxStore) -> Self {
        Self {
            config: Arc::new(config),
            store: Arc::new(store),
        }
    }
}

/// Build the router for all endpoints.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", any(health))
        .route(WEBHOOK_PATH, any(cryptostrazo_webhook))
        .route(LAST_PATH, any(last_delivery_view))
        .fallback(not_found)
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// =============================================================================
// Health Check
// =============================================================================

/// Health check response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub ok: bool,
}

/// Health check endpoint.
pub async fn health(method: Method) -> Response {
    if method != Method::GET {
        return WebhookError::NotFound.into_response();
    }
    Json(HealthResponse { ok: true }).into_response()
}

// =============================================================================
// CryptoStrazo Webhook
// =============================================================================

/// CryptoStrazo delivery endpoint.
pub async fn cryptostrazo_webhook(State(state): State<AppState>, ctx: RequestContext) -> Response {
    info!(
        method = %ctx.method,
        has_delivery_id = !ctx.header(&state.config.headers.delivery).is_empty(),
        has_signature = !ctx.header(&state.config.headers.signature).is_empty(),
        body_length = ctx.body.as_ref().map(|b| b.len()).unwrap_or(0),
        "strz_webhook_received"
    );

    receive_delivery(&state, &ctx).await.into_response()
}

/// Last stored delivery, for debugging an integration.
pub async fn last_delivery_view(State(state): State<AppState>, ctx: RequestContext) -> Response {
    if ctx.method != Method::GET {
        return WebhookError::NotFound.into_response();
    }
    last_delivery(&state, &ctx).await.into_response()
}

/// Any other route.
pub async fn not_found() -> Response {
    WebhookError::NotFound.into_response()
}

fn panic_response(_panic: Box<dyn Any + Send + 'static>) -> Response {
    error!("request_handler_panicked");
    WebhookError::Internal.into_response()
}
