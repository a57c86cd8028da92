//! Invoice field extraction.
//!
//! Flattens the `invoice` object of a CryptoStrazo payload into nullable text
//! columns. Every value is kept as a string so the same row shape works on
//! both storage backends.

use serde::Serialize;
use serde_json::{Map, Value};

/// Queryable fields derived from a verified payload.
///
/// `None` means the key was absent (or JSON `null`); it is never an empty
/// string stand-in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InvoiceFields {
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

impl InvoiceFields {
    /// Column name and value pairs in table order.
    pub fn columns(&self) -> [(&'static str, Option<&str>); 14] {
        [
            ("invoice_id", self.invoice_id.as_deref()),
            ("invoice_public_id", self.invoice_public_id.as_deref()),
            ("external_id", self.external_id.as_deref()),
            ("kind", self.kind.as_deref()),
            ("status", self.status.as_deref()),
            ("amount_base", self.amount_base.as_deref()),
            ("amount_total", self.amount_total.as_deref()),
            ("currency", self.currency.as_deref()),
            ("wallet_address", self.wallet_address.as_deref()),
            ("network", self.network.as_deref()),
            ("tx_id", self.tx_id.as_deref()),
            ("paid_at", self.paid_at.as_deref()),
            ("expires_at", self.expires_at.as_deref()),
            ("created_at", self.created_at.as_deref()),
        ]
    }
}

/// Extract invoice fields from a parsed payload.
///
/// Payloads without an `invoice` object only yield a top-level `created_at`
/// (when it is a string). Never fails.
pub fn extract(payload: &Value) -> InvoiceFields {
    let created_at = payload
        .get("created_at")
        .and_then(Value::as_str)
        .map(str::to_string);

    let invoice = match payload.get("invoice").and_then(Value::as_object) {
        Some(inv) => inv,
        None => {
            return InvoiceFields {
                created_at,
                ..Default::default()
            }
        }
    };

    InvoiceFields {
        invoice_id: text(invoice, "id"),
        invoice_public_id: text(invoice, "public_id"),
        external_id: text(invoice, "external_id"),
        kind: text(invoice, "kind"),
        status: text(invoice, "status"),
        amount_base: text(invoice, "amount_base"),
        amount_total: text(invoice, "amount_total"),
        currency: text(invoice, "currency"),
        wallet_address: text(invoice, "wallet_address"),
        network: text(invoice, "network"),
        tx_id: text(invoice, "tx_id"),
        paid_at: text(invoice, "paid_at"),
        expires_at: text(invoice, "expires_at"),
        created_at,
    }
}

/// Textual form of a present, non-null value.
fn text(object: &Map<String, Value>, key: &str) -> Option<String> {
    match object.get(key)? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        // Keeps the payload's own digits (arbitrary_precision)
        Value::Number(n) => Some(n.to_string()),
        // Nested values keep their compact JSON text
        other => Some(other.to_string()),
    }
}

/// Resolve the event name: header first, then a top-level string `event`.
pub fn resolve_event(header: &str, payload: &Value) -> Option<String> {
    let header = header.trim();
    if !header.is_empty() {
        return Some(header.to_string());
    }

    payload
        .get("event")
        .and_then(Value::as_str)
        .filter(|e| !e.is_empty())
        .map(str::to_string)
}
