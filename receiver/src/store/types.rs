//! Inbox record types and store errors.

use serde::Serialize;
use thiserror::Error;

use crate::process::InvoiceFields;

/// Result of an idempotent inbox write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOutcome {
    /// First delivery carrying this id; a row was created.
    Inserted,
    /// A row with this delivery id already exists and was left untouched.
    Duplicate,
}

/// Storage failure. The message is internal detail and stays in the logs.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to open storage: {0}")]
    Connect(String),

    #[error("database error: {0}")]
    Database(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        Self::Connect(err.to_string())
    }
}

/// A verified delivery ready to be written.
#[derive(Debug, Clone)]
pub struct NewInboxRow<'a> {
    pub delivery_uid: &'a str,
    pub event: Option<&'a str>,
    /// Raw request body, byte-for-byte
    pub payload_json: &'a str,
    pub fields: &'a InvoiceFields,
}

/// One stored delivery as read back from the inbox table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct InboxRecord {
    pub id: i64,
    pub delivery_uid: String,
    pub event: Option<String>,
    pub received_at: Option<String>,
    pub payload_json: String,

    pub invoice_id: Option<String>,
    pub invoice_public_id: Option<String>,
    pub external_id: Option<String>,
    pub kind: Option<String>,
    pub status: Option<String>,
    pub amount_base: Option<String>,
    pub amount_total: Option<String>,
    pub currency: Option<String>,
    pub wallet_address: Option<String>,
    pub network: Option<String>,
    pub tx_id: Option<String>,
    pub paid_at: Option<String>,
    pub expires_at: Option<String>,
    pub created_at: Option<String>,
}
