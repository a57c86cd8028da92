//! MySQL / MariaDB inbox backend.

use async_trait::async_trait;
use sqlx::mysql::{MySqlConnectOptions, MySqlPool, MySqlPoolOptions};
use tracing::info;

use super::schema::{IndexDef, INSERT_SQL};
use super::types::{InboxRecord, NewInboxRow, StoreError};
use super::InboxBackend;
use crate::config::DbConfig;

const DEFAULT_PORT: u16 = 3306;

const CREATE_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS strz_webhook_inbox (
  id                BIGINT UNSIGNED NOT NULL AUTO_INCREMENT,
  delivery_uid      VARCHAR(191)    NOT NULL,
  event             VARCHAR(191)    NULL,
  received_at       TIMESTAMP       NOT NULL DEFAULT CURRENT_TIMESTAMP,
  payload_json      LONGTEXT        NOT NULL,

  invoice_id        VARCHAR(191)    NULL,
  invoice_public_id VARCHAR(191)    NULL,
  external_id       VARCHAR(191)    NULL,
  kind              VARCHAR(191)    NULL,
  status            VARCHAR(191)    NULL,
  amount_base       VARCHAR(191)    NULL,
  amount_total      VARCHAR(191)    NULL,
  currency          VARCHAR(191)    NULL,
  wallet_address    VARCHAR(191)    NULL,
  network           VARCHAR(191)    NULL,
  tx_id             VARCHAR(191)    NULL,
  paid_at           VARCHAR(191)    NULL,
  expires_at        VARCHAR(191)    NULL,
  created_at        VARCHAR(191)    NULL,

  PRIMARY KEY (id),
  UNIQUE KEY uk_delivery_uid (delivery_uid),
  KEY idx_event_received (event, received_at),
  KEY idx_external_id (external_id),
  KEY idx_invoice_public_id (invoice_public_id),
  KEY idx_tx_id (tx_id),
  KEY idx_status (status)
) ENGINE=InnoDB DEFAULT CHARSET=utf8mb4
"#;

// id is unsigned and older installs used BIGINT for invoice_id; cast so the
// record decodes the same way on every revision.
const SELECT_LAST: &str = r#"
SELECT CAST(id AS SIGNED) AS id, delivery_uid, event,
       CAST(received_at AS CHAR) AS received_at, payload_json,
       CAST(invoice_id AS CHAR) AS invoice_id, invoice_public_id, external_id, kind, status,
       amount_base, amount_total, currency, wallet_address, network, tx_id,
       paid_at, expires_at, created_at
FROM strz_webhook_inbox
ORDER BY id DESC
LIMIT 1
"#;

// 191 characters is the widest utf8mb4 VARCHAR every InnoDB row format can
// index. Values from the payload must fit, or strict mode rejects the insert
// and lax mode truncates it.
const TEXT_COLUMN: &str = "VARCHAR(191)";

/// Split `host[:port]`.
fn split_host(host: &str) -> (&str, u16) {
    match host.rsplit_once(':') {
        Some((h, p)) => match p.parse() {
            Ok(port) => (h, port),
            Err(_) => (host, DEFAULT_PORT),
        },
        None => (host, DEFAULT_PORT),
    }
}

fn quote_ident(ident: &str) -> String {
    format!("`{}`", ident.replace('`', "``"))
}

/// MySQL backend over a connection pool.
pub struct MySqlBackend {
    pool: MySqlPool,
}

impl MySqlBackend {
    /// Connect with the configured credentials and charset.
    pub async fn connect(db: &DbConfig) -> Result<Self, StoreError> {
        let (host, port) = split_host(&db.host);

        let options = MySqlConnectOptions::new()
            .host(host)
            .port(port)
            .username(&db.user)
            .password(&db.pass)
            .database(&db.name)
            .charset(&db.charset);

        let pool = MySqlPoolOptions::new()
            .max_connections(10)
            .connect_with(options)
            .await
            .map_err(|e| StoreError::Connect(e.to_string()))?;

        info!(host = %host, port = port, database = %db.name, "mysql_inbox_connected");

        Ok(Self { pool })
    }
}

#[async_trait]
impl InboxBackend for MySqlBackend {
    fn dialect(&self) -> &'static str {
        "mysql"
    }

    fn create_table_sql(&self) -> &'static str {
        CREATE_TABLE
    }

    fn add_column_sql(&self, column: &str) -> String {
        format!(
            "ALTER TABLE strz_webhook_inbox ADD COLUMN {} {} NULL",
            quote_ident(column),
            TEXT_COLUMN
        )
    }

    fn create_index_sql(&self, index: &IndexDef) -> String {
        let columns: Vec<String> = index.columns.iter().map(|c| quote_ident(c)).collect();
        format!(
            "CREATE INDEX {} ON strz_webhook_inbox({})",
            quote_ident(index.name),
            columns.join(", ")
        )
    }

    async fn column_exists(&self, table: &str, column: &str) -> Result<bool, StoreError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM INFORMATION_SCHEMA.COLUMNS \
             WHERE TABLE_SCHEMA = DATABASE() AND TABLE_NAME = ? AND COLUMN_NAME = ?",
        )
        .bind(table)
        .bind(column)
        .fetch_one(&self.pool)
        .await?;
        Ok(count > 0)
    }

    async fn index_exists(&self, table: &str, index: &str) -> Result<bool, StoreError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM INFORMATION_SCHEMA.STATISTICS \
             WHERE TABLE_SCHEMA = DATABASE() AND TABLE_NAME = ? AND INDEX_NAME = ?",
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
