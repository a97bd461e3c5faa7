use std::{fs, path::PathBuf, str::FromStr};

use async_trait::async_trait;
use serde_json::Value;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    Pool, Row, Sqlite,
};
use tracing::debug;

use crate::{SettingsStore, StorageError};

const MEMORY_URL: &str = "sqlite::memory:";

/// Durable store backed by a single SQLite `settings` table.
#[derive(Clone)]
pub struct SqliteSettingsStore {
    pub(crate) pool: Pool<Sqlite>,
}

impl SqliteSettingsStore {
    pub async fn new(database_url: &str) -> Result<Self, StorageError> {
        ensure_sqlite_parent_dir_exists(database_url)?;

        let connect_options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        // An in-memory database lives and dies with its connection, so the
        // pool must hold exactly one connection for its whole lifetime.
        let pool_options = if database_url.starts_with(MEMORY_URL) {
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(5)
        };
        let pool = pool_options.connect_with(connect_options).await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS settings (
                key        TEXT PRIMARY KEY NOT NULL,
                value      TEXT NOT NULL,
                updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            "#,
        )
        .execute(&pool)
        .await?;

        debug!(database_url, "opened settings store");
        Ok(Self { pool })
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }

    pub async fn health_check(&self) -> Result<(), StorageError> {
        let _: i64 = sqlx::query_scalar("SELECT 1").fetch_one(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl SettingsStore for SqliteSettingsStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, StorageError> {
        let row = sqlx::query("SELECT value FROM settings WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let raw: String = row.try_get("value")?;
        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|source| StorageError::serialization(key, source))
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), StorageError> {
        let raw =
            serde_json::to_string(&value).map_err(|source| StorageError::serialization(key, source))?;
        sqlx::query(
            "INSERT INTO settings (key, value, updated_at) VALUES (?, ?, CURRENT_TIMESTAMP)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = CURRENT_TIMESTAMP",
        )
        .bind(key)
        .bind(raw)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        sqlx::query("DELETE FROM settings WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn clear(&self) -> Result<(), StorageError> {
        let removed = sqlx::query("DELETE FROM settings")
            .execute(&self.pool)
            .await?
            .rows_affected();
        debug!(removed, "cleared settings store");
        Ok(())
    }
}

fn ensure_sqlite_parent_dir_exists(database_url: &str) -> Result<(), StorageError> {
    let SqliteLocation::File(path) = SqliteLocation::of(database_url) else {
        return Ok(());
    };
    let Some(parent) = path.parent() else {
        return Ok(());
    };

    fs::create_dir_all(parent).map_err(|source| StorageError::Io {
        path: parent.display().to_string(),
        source,
    })
}

/// What a database url points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SqliteLocation {
    Memory,
    File(PathBuf),
    /// Not a SQLite url, or one without a path.
    Other,
}

impl SqliteLocation {
    pub fn of(database_url: &str) -> Self {
        if database_url.starts_with(MEMORY_URL) {
            return Self::Memory;
        }
        let Some(rest) = database_url.strip_prefix("sqlite:") else {
            return Self::Other;
        };
        let rest = rest.strip_prefix("//").unwrap_or(rest);
        let path = rest.split_once('?').map_or(rest, |(path, _)| path);
        if path.is_empty() {
            Self::Other
        } else {
            Self::File(PathBuf::from(path))
        }
    }
}

/// Accepts a bare file path, a `sqlite:` url or any full url and returns the
/// url to connect with. Blank input yields `None`.
pub fn database_url_from(raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if raw.starts_with(MEMORY_URL) || raw.contains("://") {
        return Some(raw.to_string());
    }

    let path = raw.strip_prefix("sqlite:").unwrap_or(raw).replace('\\', "/");
    Some(format!("sqlite://{path}"))
}
