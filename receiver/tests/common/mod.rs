//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::path::PathBuf;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool};
use tempfile::TempDir;

use strz::{AppState, Config, InboxStore};

pub const SECRET: &str = "cs_secret_integration";

/// A receiver backed by SQLite in a temporary directory.
pub struct TestApp {
    pub dir: TempDir,
    pub state: AppState,
}

impl TestApp {
    pub async fn new(extra: &[(&str, &str)]) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let sqlite_path = dir.path().join("strz.sqlite");

        let mut vars: HashMap<String, String> = HashMap::new();
        vars.insert("STRZ_SECRET".into(), SECRET.into());
        vars.insert("STRZ_DB_DRIVER".into(), "sqlite".into());
        vars.insert("STRZ_SQLITE_PATH".into(), sqlite_path.display().to_string());
        for (k, v) in extra {
            vars.insert(k.to_string(), v.to_string());
        }

        let config = Config::from_lookup(|name| vars.get(name).cloned()).unwrap();
        let store = InboxStore::connect(&config.db).await.unwrap();

        Self {
            dir,
            state: AppState::new(config, store),
        }
    }

    pub fn sqlite_path(&self) -> PathBuf {
        self.dir.path().join("strz.sqlite")
    }

    /// Independent pool on the same file, for inspecting rows.
    pub async fn inspect(&self) -> SqlitePool {
        SqlitePool::connect_with(SqliteConnectOptions::new().filename(self.sqlite_path()))
            .await
            .unwrap()
    }

    pub async fn count_rows(&self, delivery_uid: &str) -> i64 {
        let pool = self.inspect().await;
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM strz_webhook_inbox WHERE delivery_uid = ?")
                .bind(delivery_uid)
                .fetch_one(&pool)
                .await
                .unwrap();
        pool.close().await;
        count
    }

    pub async fn total_rows(&self) -> i64 {
        let pool = self.inspect().await;
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM strz_webhook_inbox")
            .fetch_one(&pool)
            .await
            .unwrap();
        pool.close().await;
        count
    }
}
