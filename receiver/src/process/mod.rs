//! Payload processing module.
//!
//! Verified payloads are stored as-is; this module only derives the
//! queryable columns that sit next to the raw body.

pub mod invoice;

pub use invoice::{extract, resolve_event, InvoiceFields};
