//! SQLite inbox backend.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteSynchronous,
};
use tracing::info;

use super::schema::{IndexDef, INSERT_SQL};
use super::types::{InboxRecord, NewInboxRow, StoreError};
use super::InboxBackend;

const CREATE_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS strz_webhook_inbox (
  id            INTEGER PRIMARY KEY AUTOINCREMENT,
  delivery_uid  TEXT NOT NULL UNIQUE,
  event         TEXT,
  received_at   TEXT NOT NULL DEFAULT (datetime('now')),
  payload_json  TEXT NOT NULL,

  invoice_id        TEXT,
  invoice_public_id TEXT,
  external_id       TEXT,
  kind              TEXT,
  status            TEXT,
  amount_base       TEXT,
  amount_total      TEXT,
  currency          TEXT,
  wallet_address    TEXT,
  network           TEXT,
  tx_id             TEXT,
  paid_at           TEXT,
  expires_at        TEXT,
  created_at        TEXT
)
"#;

// Older installs declared invoice_id as INTEGER; cast so reads are uniform.
const SELECT_LAST: &str = r#"
SELECT id, delivery_uid, event, CAST(received_at AS TEXT) AS received_at, payload_json,
       CAST(invoice_id AS TEXT) AS invoice_id, invoice_public_id, external_id, kind, status,
       amount_base, amount_total, currency, wallet_address, network, tx_id,
       paid_at, expires_at, created_at
FROM strz_webhook_inbox
ORDER BY id DESC
LIMIT 1
"#;

/// SQLite backend over a WAL-mode file database.
pub struct SqliteBackend {
    pool: SqlitePool,
}

impl SqliteBackend {
    /// Open (creating if needed) the database file at `path`.
    pub async fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .max_connections(8)
            .connect_with(options)
            .await
            .map_err(|e| StoreError::Connect(e.to_string()))?;

        info!(path = %path.display(), "sqlite_inbox_opened");

        Ok(Self { pool })
    }
}

/// Quote an identifier for statements that cannot take bind parameters.
fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

#[async_trait]
impl InboxBackend for SqliteBackend {
    fn dialect(&self) -> &'static str {
        "sqlite"
    }

    fn create_table_sql(&self) -> &'static str {
        CREATE_TABLE
    }

    fn add_column_sql(&self, column: &str) -> String {
        format!(
            "ALTER TABLE strz_webhook_inbox ADD COLUMN {} TEXT",
            quote_ident(column)
        )
    }

    fn create_index_sql(&self, index: &IndexDef) -> String {
        let columns: Vec<String> = index.columns.iter().map(|c| quote_ident(c)).collect();
        format!(
            "CREATE INDEX IF NOT EXISTS {} ON strz_webhook_inbox({})",
            quote_ident(index.name),
            columns.join(", ")
        )
    }

    async fn column_exists(&self, table: &str, column: &str) -> Result<bool, StoreError> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM pragma_table_info(?) WHERE name = ?")
                .bind(table)
                .bind(column)
                .fetch_one(&self.pool)
                .await?;
        Ok(count > 0)
    }

    async fn index_exists(&self, table: &str, index: &str) -> Result<bool, StoreError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'index' AND tbl_name = ? AND name = ?",
        )
        .bind(table)
        .bind(index)
        .fetch_one(&self.pool)
        .await?;
        Ok(count > 0)
    }

    async fn execute(&self, sql: &str) -> Result<(), StoreError> {
        sqlx::query(sql).execute(&self.pool).await?;
        Ok(())
    }

    async fn insert(&self, row: &NewInboxRow<'_>) -> Result<u64, sqlx::Error> {
        let mut query = sqlx::query(INSERT_SQL)
            .bind(row.delivery_uid)
            .bind(row.event)
            .bind(row.payload_json);
        for (_, value) in row.fields.columns() {
            query = query.bind(value);
        }

        let result = query.execute(&self.pool).await?;
        Ok(result.rows_affected())
    }

    async fn fetch_last(&self) -> Result<Option<InboxRecord>, StoreError> {
        let record = sqlx::query_as::<_, InboxRecord>(SELECT_LAST)
            .fetch_optional(&self.pool)
            .await?;
        Ok(record)
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}
