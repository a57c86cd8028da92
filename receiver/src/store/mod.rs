//! Durable, idempotent inbox of verified deliveries.
//!
//! The store owns one backend (MySQL or SQLite) chosen at construction. The
//! only cross-request coordination is the unique key on `delivery_uid`: every
//! write is a plain `INSERT`, and the database decides which of two racing
//! duplicates wins.

pub mod mysql;
pub mod schema;
pub mod sqlite;
pub mod types;

use async_trait::async_trait;
use rand::RngCore;
use tracing::{info, warn};

use crate::config::{DbConfig, Driver};
use crate::process::InvoiceFields;

pub use mysql::MySqlBackend;
pub use schema::{IndexDef, MigrationReport, MigrationStep, INBOX_TABLE};
pub use sqlite::SqliteBackend;
pub use types::{InboxRecord, NewInboxRow, StoreError, StoreOutcome};

/// Dialect-specific storage operations.
///
/// Schema introspection and DDL differ per backend; everything above this
/// trait is shared.
#[async_trait]
pub trait InboxBackend: Send + Sync {
    /// Short dialect name for logs.
    fn dialect(&self) -> &'static str;

    /// Baseline `CREATE TABLE IF NOT EXISTS` for new installs.
    fn create_table_sql(&self) -> &'static str;

    fn add_column_sql(&self, column: &str) -> String;

    fn create_index_sql(&self, index: &IndexDef) -> String;

    async fn column_exists(&self, table: &str, column: &str) -> Result<bool, StoreError>;

    async fn index_exists(&self, table: &str, index: &str) -> Result<bool, StoreError>;

    /// Run a single DDL statement.
    async fn execute(&self, sql: &str) -> Result<(), StoreError>;

    /// Plain insert; returns rows affected. Errors are left unclassified.
    async fn insert(&self, row: &NewInboxRow<'_>) -> Result<u64, sqlx::Error>;

    /// Most recently inserted row.
    async fn fetch_last(&self) -> Result<Option<InboxRecord>, StoreError>;

    async fn close(&self);
}

/// Inbox store over a migrated backend.
pub struct InboxStore {
    backend: Box<dyn InboxBackend>,
}

impl InboxStore {
    /// Open the configured backend and bring its schema up to date.
    pub async fn connect(db: &DbConfig) -> Result<Self, StoreError> {
        let driver = db
            .resolve_driver()
            .map_err(|e| StoreError::Connect(e.to_string()))?;

        let backend: Box<dyn InboxBackend> = match driver {
            Driver::Mysql => Box::new(MySqlBackend::connect(db).await?),
            Driver::Sqlite => Box::new(SqliteBackend::open(&db.sqlite_path).await?),
        };

        Self::with_backend(backend).await
    }

    /// Wrap an already opened backend, running migrations first.
    pub async fn with_backend(backend: Box<dyn InboxBackend>) -> Result<Self, StoreError> {
        schema::migrate(backend.as_ref()).await?;
        info!(dialect = backend.dialect(), "inbox_store_ready");
        Ok(Self { backend })
    }

    /// Store a verified delivery at most once per delivery id.
    ///
    /// A blank id is replaced by a random `missing_` id, so such deliveries
    /// are always stored and never deduplicated.
    pub async fn store_inbox(
        &self,
        delivery_uid: &str,
        event: Option<&str>,
        raw_body: &str,
        fields: &InvoiceFields,
    ) -> Result<StoreOutcome, StoreError> {
        let delivery_uid = match delivery_uid.trim() {
            "" => synthesize_delivery_uid(),
            uid => uid.to_string(),
        };

        let row = NewInboxRow {
            delivery_uid: &delivery_uid,
            event,
            payload_json: raw_body,
            fields,
        };

        match self.backend.insert(&row).await {
            Ok(0) => Ok(StoreOutcome::Duplicate),
            Ok(_) => Ok(StoreOutcome::Inserted),
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                Ok(StoreOutcome::Duplicate)
            }
            Err(e) => {
                warn!(
                    dialect = self.backend.dialect(),
                    delivery_uid = %delivery_uid,
                    "inbox_insert_failed"
                );
                Err(e.into())
            }
        }
    }

    /// Most recently stored delivery, if any.
    pub async fn fetch_last_inbox(&self) -> Result<Option<InboxRecord>, StoreError> {
        self.backend.fetch_last().await
    }

    pub async fn close(&self) {
        self.backend.close().await;
    }
}

/// Unguessable placeholder id for deliveries that arrived without one.
fn synthesize_delivery_uid() -> String {
    let mut bytes = [0u8; 8];
    rand::thread_rng().fill_bytes(&mut bytes);
    format!("missing_{}", hex::encode(bytes))
}
