//! Object store contract used by the banner cache
//!
//! The banner cache only talks to storage through [`ObjectStore`]; the local
//! SQLite-indexed blob container is one implementation of it.

pub mod sqlite;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::banner::CacheKey;
use crate::error::StoreError;

pub type Result<T> = std::result::Result<T, StoreError>;

/// Blob container operations consumed by the banner cache.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Whether a blob is stored under `key`
    async fn exists(&self, key: &CacheKey) -> Result<bool>;

    /// When the blob was last written; `StoreError::NotFound` if absent
    async fn last_modified(&self, key: &CacheKey) -> Result<DateTime<Utc>>;

    /// Store `data` under `key`, replacing any previous blob, and return its URL
    async fn write(&self, key: &CacheKey, data: &[u8]) -> Result<String>;

    /// Remove the blob; succeeds when nothing is stored
    async fn delete(&self, key: &CacheKey) -> Result<()>;

    /// URL of `key` whether or not the blob exists yet
    fn locate(&self, key: &CacheKey) -> String;
}

/// Metadata kept for each stored blob
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobMetadata {
    pub key: String,
    pub size_bytes: usize,
    /// Hex SHA-256 of the content
    pub etag: String,
    pub last_modified: DateTime<Utc>,
}

pub use sqlite::SqliteObjectStore;
