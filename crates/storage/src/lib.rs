//! Key/value persistence for the options page.
//!
//! Values are JSON documents addressed by namespaced string keys. Every
//! operation is individually atomic; callers must not assume atomicity across
//! several keys.

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

mod memory;
mod sqlite;

pub use memory::MemorySettingsStore;
pub use sqlite::{database_url_from, SqliteLocation, SqliteSettingsStore};

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("settings backend failure: {0}")]
    Backend(#[from] sqlx::Error),
    #[error("failed to (de)serialize settings value for '{key}': {source}")]
    Serialization {
        key: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to prepare settings database at '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl StorageError {
    pub fn serialization(key: &str, source: serde_json::Error) -> Self {
        Self::Serialization {
            key: key.to_string(),
            source,
        }
    }
}

#[async_trait]
pub trait SettingsStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Value>, StorageError>;
    async fn set(&self, key: &str, value: Value) -> Result<(), StorageError>;
    async fn remove(&self, key: &str) -> Result<(), StorageError>;
    /// Wipes every key.
    async fn clear(&self) -> Result<(), StorageError>;
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
