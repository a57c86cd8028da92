//! Inbox table schema and tolerant migrations.
//!
//! New installs get the full table in one `CREATE TABLE IF NOT EXISTS`. Older
//! installs are brought forward column by column. Every step after the
//! baseline is best-effort: a failed `ALTER` or index build is logged and the
//! remaining steps still run.

use tracing::{info, warn};

use super::types::StoreError;
use super::InboxBackend;

/// Inbox table name.
pub const INBOX_TABLE: &str = "strz_webhook_inbox";

/// Nullable columns added after the first schema revision, in table order.
pub const EXTRACTED_COLUMNS: [&str; 14] = [
    "invoice_id",
    "invoice_public_id",
    "external_id",
    "kind",
    "status",
    "amount_base",
    "amount_total",
    "currency",
    "wallet_address",
    "network",
    "tx_id",
    "paid_at",
    "expires_at",
    "created_at",
];

/// Secondary index on the inbox table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexDef {
    pub name: &'static str,
    pub columns: &'static [&'static str],
}

pub const INDEXES: [IndexDef; 5] = [
    IndexDef { name: "idx_event_received", columns: &["event", "received_at"] },
    IndexDef { name: "idx_external_id", columns: &["external_id"] },
    IndexDef { name: "idx_invoice_public_id", columns: &["invoice_public_id"] },
    IndexDef { name: "idx_tx_id", columns: &["tx_id"] },
    IndexDef { name: "idx_status", columns: &["status"] },
];

/// Insert statement shared by both dialects (`?` placeholders).
pub const INSERT_SQL: &str = "INSERT INTO strz_webhook_inbox \
    (delivery_uid, event, payload_json, \
     invoice_id, invoice_public_id, external_id, kind, status, amount_base, amount_total, currency, \
     wallet_address, network, tx_id, paid_at, expires_at, created_at) \
    VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)";

/// One schema evolution step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationStep {
    CreateTable,
    AddColumn(&'static str),
    CreateIndex(IndexDef),
}

/// Ordered migration plan: baseline table, missing columns, then indexes.
pub fn plan() -> Vec<MigrationStep> {
    let mut steps = vec![MigrationStep::CreateTable];
    steps.extend(EXTRACTED_COLUMNS.into_iter().map(MigrationStep::AddColumn));
    steps.extend(INDEXES.into_iter().map(MigrationStep::CreateIndex));
    steps
}

/// What a migration run did.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MigrationReport {
    pub applied: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Apply one step. `Ok(false)` means it was already in place.
async fn apply(backend: &dyn InboxBackend, step: MigrationStep) -> Result<bool, StoreError> {
    match step {
        MigrationStep::CreateTable => {
            backend.execute(backend.create_table_sql()).await?;
            Ok(true)
        }
        MigrationStep::AddColumn(column) => {
            if backend.column_exists(INBOX_TABLE, column).await? {
                return Ok(false);
            }
            backend.execute(&backend.add_column_sql(column)).await?;
            Ok(true)
        }
        MigrationStep::CreateIndex(index) => {
            if backend.index_exists(INBOX_TABLE, index.name).await? {
                return Ok(false);
            }
            backend.execute(&backend.create_index_sql(&index)).await?;
            Ok(true)
        }
    }
}

/// Run the full plan against a backend.
///
/// Only the baseline `CreateTable` is fatal; without the table nothing can be
/// stored.
pub async fn migrate(backend: &dyn InboxBackend) -> Result<MigrationReport, StoreError> {
    let mut report = MigrationReport::default();

    for step in plan() {
        match apply(backend, step).await {
            Ok(true) => report.applied += 1,
            Ok(false) => report.skipped += 1,
            Err(e) if step == MigrationStep::CreateTable => return Err(e),
            Err(e) => {
                warn!(
                    dialect = backend.dialect(),
                    step = ?step,
                    error = %e,
                    "inbox_migration_step_failed"
                );
                report.failed += 1;
            }
        }
    }

    info!(
        dialect = backend.dialect(),
        applied = report.applied,
        skipped = report.skipped,
        failed = report.failed,
        "inbox_migration_complete"
    );

    Ok(report)
}
