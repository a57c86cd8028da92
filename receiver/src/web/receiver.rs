//! Delivery ingestion pipeline and the last-delivery diagnostic view.
//!
//! ```text
//! timestamp → signature → parse → extract → idempotent insert
//! ```
//!
//! Each stage short-circuits with its own [`WebhookError`].

use axum::{http::Method, Json};
use serde_json::{json, Value};
use tracing::{error, info, warn};

use super::context::RequestContext;
use super::error::WebhookError;
use super::handlers::AppState;
use super::replay::{check_timestamp, now_epoch_seconds};
use super::signature::{self, constant_time_compare};
use crate::process::{extract, resolve_event};
use crate::store::{InboxRecord, StoreOutcome};

/// Fixed source label reported by the diagnostic view.
pub const SOURCE_LABEL: &str = "https://cryptostrazo.com/";

/// Verify and store one delivery, using the wall clock for replay checks.
pub async fn receive_delivery(
    state: &AppState,
    ctx: &RequestContext,
) -> Result<Json<Value>, WebhookError> {
    receive_delivery_at(state, ctx, now_epoch_seconds()).await
}

/// Verify and store one delivery as seen at `now`.
pub async fn receive_delivery_at(
    state: &AppState,
    ctx: &RequestContext,
    now: u64,
) -> Result<Json<Value>, WebhookError> {
    if ctx.method != Method::POST {
        return Err(WebhookError::MethodNotAllowed);
    }

    let config = &state.config;
    let delivery_uid = ctx.header(&config.headers.delivery);

    let timestamp = check_timestamp(
        ctx.header(&config.headers.timestamp),
        now,
        config.max_drift_seconds,
    )?;

    let received_signature = ctx.header(&config.headers.signature);
    if received_signature.is_empty() {
        warn!(delivery_uid = %delivery_uid, "strz_signature_missing");
        return Err(WebhookError::MissingSignature);
    }

    // A body that was not read in full cannot be the one that was signed
    let raw_body = ctx.body.as_ref().ok_or(WebhookError::BadSignature)?;

    if !signature::verify(
        &config.secret,
        timestamp,
        raw_body,
        received_signature,
        &config.signature_base_format,
    ) {
        warn!(delivery_uid = %delivery_uid, "strz_signature_invalid");
        return Err(WebhookError::BadSignature);
    }

    let payload: Value = serde_json::from_slice(raw_body).map_err(|_| WebhookError::BadJson)?;
    if !payload.is_object() {
        return Err(WebhookError::BadJson);
    }
    // Valid JSON is valid UTF-8, so this keeps the exact bytes
    let raw_text = std::str::from_utf8(raw_body).map_err(|_| WebhookError::BadJson)?;

    let event = resolve_event(ctx.header(&config.headers.event), &payload);
    let fields = extract(&payload);

    match state
        .store
        .store_inbox(delivery_uid, event.as_deref(), raw_text, &fields)
        .await
    {
        Ok(StoreOutcome::Inserted) => {
            info!(
                delivery_uid = %delivery_uid,
                event = ?event,
                status = ?fields.status,
                "strz_webhook_stored"
            );
            Ok(Json(json!({ "ok": true })))
        }
        Ok(StoreOutcome::Duplicate) => {
            info!(delivery_uid = %delivery_uid, event = ?event, "strz_webhook_duplicate");
            Ok(Json(json!({ "ok": true, "duplicate": true })))
        }
        Err(e) => {
            error!(delivery_uid = %delivery_uid, error = %e, "strz_webhook_store_failed");
            Err(WebhookError::StorageFailed)
        }
    }
}

/// Show the most recent stored delivery, when enabled.
pub async fn last_delivery(
    state: &AppState,
    ctx: &RequestContext,
) -> Result<Json<Value>, WebhookError> {
    let config = &state.config;
    if !config.debug_ui {
        return Err(WebhookError::NotFound);
    }

    if !config.debug_token.is_empty()
        && !constant_time_compare(&config.debug_token, ctx.query_param("token"))
    {
        warn!("strz_debug_view_forbidden");
        return Err(WebhookError::Forbidden);
    }

    let record = state.store.fetch_last_inbox().await.map_err(|e| {
        error!(error = %e, "strz_debug_view_fetch_failed");
        WebhookError::Internal
    })?;

    let data = match record {
        Some(record) => record_view(&record),
        None => Value::Null,
    };

    Ok(Json(json!({ "ok": true, "data": data })))
}

/// Readable projection of a stored record.
fn record_view(record: &InboxRecord) -> Value {
    let decoded = serde_json::from_str::<Value>(&record.payload_json)
        .ok()
        .filter(|v| v.is_object() || v.is_array());

    let payload_raw = match decoded {
        Some(_) => None,
        None => Some(record.payload_json.as_str()),
    };

    json!({
        "id": record.id,
        "delivery_uid": record.delivery_uid,
        "event": record.event,
        "received_at": record.received_at,
        "client_ip": SOURCE_LABEL,

        "invoice_public_id": record.invoice_public_id,
        "external_id": record.external_id,
        "status": record.status,
        "amount_total": record.amount_total,
        "currency": record.currency,
        "tx_id": record.tx_id,
        "paid_at": record.paid_at,

        "payload": decoded,
        "payload_raw": payload_raw,
    })
}
