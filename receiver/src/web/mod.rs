//! Web server module for CryptoStrazo webhook deliveries.
//!
//! This module provides:
//! - Replay protection on the delivery timestamp
//! - HMAC-SHA256 verification over the raw body
//! - The ingestion pipeline and debug view
//! - Routing and error rendering

pub mod context;
pub mod error;
pub mod handlers;
pub mod receiver;
pub mod replay;
pub mod signature;

pub use context::RequestContext;
pub use error::WebhookError;
pub use handlers::{router, AppState, HealthResponse, LAST_PATH, WEBHOOK_PATH};
pub use receiver::{last_delivery, receive_delivery, receive_delivery_at};
pub use replay::check_timestamp;
pub use signature::{compute_signature, verify};
