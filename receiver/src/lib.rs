//! StrzReceiver - verified, idempotent inbox for CryptoStrazo webhooks.
//!
//! ## Architecture
//!
//! ```text
//! Delivery → replay check → signature check → parse → extract → inbox (once per delivery id)
//! ```
//!
//! The inbox lives in MySQL or SQLite and migrates itself on startup.

pub mod config;
pub mod process;
pub mod store;
pub mod web;

// Re-export commonly used types
pub use config::Config;
pub use process::{extract, InvoiceFields};
pub use store::{InboxRecord, InboxStore, StoreError, StoreOutcome};
pub use web::{router, AppState, WebhookError};
