//! Error codes returned to the webhook sender.
//!
//! Codes are stable strings; none of them carries internal detail.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Failure of a request at the HTTP boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum WebhookError {
    #[error("invalid timestamp")]
    InvalidTimestamp,

    #[error("timestamp out of range")]
    TimestampOutOfRange,

    #[error("missing signature")]
    MissingSignature,

    #[error("bad signature")]
    BadSignature,

    #[error("body is not a JSON object")]
    BadJson,

    #[error("method not allowed")]
    MethodNotAllowed,

    #[error("storage failed")]
    StorageFailed,

    #[error("not found")]
    NotFound,

    #[error("forbidden")]
    Forbidden,

    #[error("internal error")]
    Internal,
}

impl WebhookError {
    /// Wire code sent in the `error` field.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidTimestamp => "invalid_timestamp",
            Self::TimestampOutOfRange => "timestamp_out_of_range",
            Self::MissingSignature => "missing_signature",
            Self::BadSignature => "bad_signature",
            Self::BadJson => "bad_json",
            Self::MethodNotAllowed => "method_not_allowed",
            Self::StorageFailed => "storage_failed",
            Self::NotFound => "not_found",
            Self::Forbidden => "forbidden",
            Self::Internal => "internal_error",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidTimestamp
            | Self::TimestampOutOfRange
            | Self::MissingSignature
            | Self::BadSignature => StatusCode::UNAUTHORIZED,
            Self::BadJson => StatusCode::BAD_REQUEST,
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::StorageFailed | Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for WebhookError {
    fn into_response(self) -> Response {
        (
            self.status(),
            Json(json!({ "ok": false, "error": self.code() })),
        )
            .into_response()
    }
}
