//! Local blob container indexed in SQLite
//!
//! Blob content lives as files under `{root}/{container}/{key}` so the
//! container directory can be served as-is; SQLite keeps the metadata
//! (size, etag, last write time) the cache decisions depend on.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, params};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use super::{BlobMetadata, ObjectStore, Result};
use crate::banner::CacheKey;
use crate::config::StoreConfig;
use crate::error::StoreError;

/// Schema version - increment to trigger nuke-and-rebuild
const SCHEMA_VERSION: i32 = 1;

/// Name of the index database inside the store root
const INDEX_DB: &str = "index.db";

static TMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// SQLite-indexed blob container on the local filesystem
pub struct SqliteObjectStore {
    conn: Mutex<Connection>,
    root: PathBuf,
    container: String,
    container_dir: PathBuf,
    public_base_url: String,
}

impl SqliteObjectStore {
    /// Open the store described by the configuration
    pub fn open(config: &StoreConfig) -> Result<Self> {
        let root = match &config.root {
            Some(root) => root.clone(),
            None => Self::default_root()?,
        };
        Self::open_at(&root, &config.container, config.public_base_url.as_deref())
    }

    /// Default store root (~/.cache/bannercache on Linux)
    pub fn default_root() -> Result<PathBuf> {
        let cache_base = dirs::cache_dir().ok_or(StoreError::NoHome)?;
        Ok(cache_base.join("bannercache"))
    }

    /// Open or create a store rooted at a specific directory
    pub fn open_at(root: &Path, container: &str, public_base_url: Option<&str>) -> Result<Self> {
        std::fs::create_dir_all(root)
            .map_err(|e| StoreError::Io(format!("Failed to create store root: {}", e)))?;

        let db_path = root.join(INDEX_DB);
        let container_dir = root.join(container);
        std::fs::create_dir_all(&container_dir)
            .map_err(|e| StoreError::Io(format!("Failed to create container dir: {}", e)))?;

        let conn = Connection::open(&db_path)?;

        let version: i32 = conn
            .pragma_query_value(None, "user_version", |r| r.get(0))
            .unwrap_or(0);

        if version != 0 && version != SCHEMA_VERSION {
            log::info!(
                "Blob index schema version mismatch ({} != {}), rebuilding",
                version,
                SCHEMA_VERSION
            );
            drop(conn);
            Self::nuke(&db_path, &container_dir)?;
            return Self::open_at(root, container, public_base_url);
        }

        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS blobs (
                container TEXT NOT NULL,
                blob_key TEXT NOT NULL,
                etag TEXT NOT NULL,
                size_bytes INTEGER NOT NULL,
                last_modified INTEGER NOT NULL,
                PRIMARY KEY (container, blob_key)
            );

            CREATE INDEX IF NOT EXISTS idx_last_modified ON blobs(last_modified);
            "#,
        )?;

        conn.pragma_update(None, "user_version", SCHEMA_VERSION)?;

        let public_base_url = public_base_url
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or_else(|| format!("file://{}", root.display()));

        Ok(Self {
            conn: Mutex::new(conn),
            root: root.to_path_buf(),
            container: container.to_string(),
            container_dir,
            public_base_url,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn container(&self) -> &str {
        &self.container
    }

    /// Filesystem path of a blob
    pub fn blob_path(&self, key: &CacheKey) -> PathBuf {
        self.container_dir.join(key.as_str())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StoreError::Poisoned)
    }

    /// Metadata for every blob in the container
    pub fn list(&self) -> Result<Vec<BlobMetadata>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT blob_key, size_bytes, etag, last_modified FROM blobs
             WHERE container = ?1 ORDER BY blob_key",
        )?;

        let rows = stmt.query_map([&self.container], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, i64>(3)?,
            ))
        })?;

        let mut blobs = Vec::new();
        for row in rows {
            let (key, size, etag, modified) = row?;
            blobs.push(BlobMetadata {
                last_modified: millis_to_datetime(&key, modified)?,
                key,
                size_bytes: size as usize,
                etag,
            });
        }
        Ok(blobs)
    }

    /// Remove every blob in the container
    pub fn clear_all(&self) -> Result<ClearStats> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM blobs WHERE container = ?1",
            [&self.container],
            |r| r.get(0),
        )?;

        conn.execute("DELETE FROM blobs WHERE container = ?1", [&self.container])?;

        if self.container_dir.exists() {
            if let Err(e) = std::fs::remove_dir_all(&self.container_dir) {
                log::warn!("Failed to clear container directory: {}", e);
            }
        }
        std::fs::create_dir_all(&self.container_dir)
            .map_err(|e| StoreError::Io(format!("Failed to recreate container dir: {}", e)))?;

        Ok(ClearStats {
            entries_removed: count as usize,
        })
    }

    /// Container statistics, counting entries younger than `ttl` as fresh
    pub fn stats(&self, ttl: Duration) -> Result<StoreStats> {
        let conn = self.lock()?;
        let ttl_millis = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX);
        let fresh_after = Utc::now().timestamp_millis().saturating_sub(ttl_millis);

        let total_entries: i64 = conn.query_row(
            "SELECT COUNT(*) FROM blobs WHERE container = ?1",
            [&self.container],
            |r| r.get(0),
        )?;

        let fresh_entries: i64 = conn.query_row(
            "SELECT COUNT(*) FROM blobs WHERE container = ?1 AND last_modified > ?2",
            params![self.container, fresh_after],
            |r| r.get(0),
        )?;

        let total_size: i64 = conn.query_row(
            "SELECT COALESCE(SUM(size_bytes), 0) FROM blobs WHERE container = ?1",
            [&self.container],
            |r| r.get(0),
        )?;

        let (oldest, newest): (Option<i64>, Option<i64>) = conn.query_row(
            "SELECT MIN(last_modified), MAX(last_modified) FROM blobs WHERE container = ?1",
            [&self.container],
            |r| Ok((r.get(0)?, r.get(1)?)),
        )?;

        Ok(StoreStats {
            total_entries: total_entries as usize,
            fresh_entries: fresh_entries as usize,
            stale_entries: (total_entries - fresh_entries) as usize,
            total_size_bytes: total_size as usize,
            oldest_write: oldest.and_then(DateTime::from_timestamp_millis),
            newest_write: newest.and_then(DateTime::from_timestamp_millis),
        })
    }

    /// Rewrite a blob's last write time
    #[cfg(test)]
    pub fn set_last_modified(&self, key: &CacheKey, at: DateTime<Utc>) -> Result<()> {
        let conn = self.lock()?;
        conn.execute(
            "UPDATE blobs SET last_modified = ?1 WHERE container = ?2 AND blob_key = ?3",
            params![at.timestamp_millis(), self.container, key.as_str()],
        )?;
        Ok(())
    }

    /// Write via a temp file and rename, so readers never see a partial blob
    fn write_blob(&self, key: &CacheKey, data: &[u8]) -> Result<()> {
        let seq = TMP_COUNTER.fetch_add(1, Ordering::Relaxed);
        let tmp_path = self
            .container_dir
            .join(format!(".{}.{}.{}.tmp", key, std::process::id(), seq));

        std::fs::write(&tmp_path, data)
            .map_err(|e| StoreError::Io(format!("Failed to write blob: {}", e)))?;

        if let Err(e) = std::fs::rename(&tmp_path, self.blob_path(key)) {
            let _ = std::fs::remove_file(&tmp_path);
            return Err(StoreError::Io(format!("Failed to move blob into place: {}", e)));
        }
        Ok(())
    }

    /// Nuke the store (delete index and container blobs)
    fn nuke(db_path: &Path, container_dir: &Path) -> Result<()> {
        if db_path.exists() {
            std::fs::remove_file(db_path)
                .map_err(|e| StoreError::Io(format!("Failed to remove blob index: {}", e)))?;
        }
        if container_dir.exists() {
            std::fs::remove_dir_all(container_dir)
                .map_err(|e| StoreError::Io(format!("Failed to remove container dir: {}", e)))?;
        }
        Ok(())
    }
}

fn millis_to_datetime(key: &str, millis: i64) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp_millis(millis)
        .ok_or_else(|| StoreError::Io(format!("Corrupt timestamp {} for blob {}", millis, key)))
}

#[async_trait]
impl ObjectStore for SqliteObjectStore {
    async fn exists(&self, key: &CacheKey) -> Result<bool> {
        let conn = self.lock()?;
        let found: Option<i64> = conn
            .query_row(
                "SELECT 1 FROM blobs WHERE container = ?1 AND blob_key = ?2",
                params![self.container, key.as_str()],
                |r| r.get(0),
            )
            .optional()?;

        if found.is_none() {
            return Ok(false);
        }

        if !self.blob_path(key).exists() {
            log::warn!("Blob {} is indexed but missing on disk, dropping entry", key);
            conn.execute(
                "DELETE FROM blobs WHERE container = ?1 AND blob_key = ?2",
                params![self.container, key.as_str()],
            )?;
            return Ok(false);
        }

        Ok(true)
    }

    async fn last_modified(&self, key: &CacheKey) -> Result<DateTime<Utc>> {
        let conn = self.lock()?;
        let millis: Option<i64> = conn
            .query_row(
                "SELECT last_modified FROM blobs WHERE container = ?1 AND blob_key = ?2",
                params![self.container, key.as_str()],
                |r| r.get(0),
            )
            .optional()?;

        match millis {
            Some(millis) => millis_to_datetime(key.as_str(), millis),
            None => Err(StoreError::NotFound(key.to_string())),
        }
    }

    async fn write(&self, key: &CacheKey, data: &[u8]) -> Result<String> {
        self.write_blob(key, data)?;

        let etag = format!("{:x}", Sha256::digest(data));
        let now = Utc::now().timestamp_millis();

        let conn = self.lock()?;
        conn.execute(
            "INSERT OR REPLACE INTO blobs
             (container, blob_key, etag, size_bytes, last_modified)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![self.container, key.as_str(), etag, data.len() as i64, now],
        )?;

        Ok(self.locate(key))
    }

    async fn delete(&self, key: &CacheKey) -> Result<()> {
        match std::fs::remove_file(self.blob_path(key)) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(StoreError::Io(format!("Failed to delete blob: {}", e))),
        }

        let conn = self.lock()?;
        conn.execute(
            "DELETE FROM blobs WHERE container = ?1 AND blob_key = ?2",
            params![self.container, key.as_str()],
        )?;
        Ok(())
    }

    fn locate(&self, key: &CacheKey) -> String {
        format!("{}/{}/{}", self.public_base_url, self.container, key)
    }
}

/// Statistics about a clear operation
#[derive(Debug)]
pub struct ClearStats {
    pub entries_removed: usize,
}

/// Statistics about container state
#[derive(Debug)]
pub struct StoreStats {
    pub total_entries: usize,
    pub fresh_entries: usize,
    pub stale_entries: usize,
    pub total_size_bytes: usize,
    pub oldest_write: Option<DateTime<Utc>>,
    pub newest_write: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::banner::key::derive_key;
    use tempfile::TempDir;

    fn test_store() -> (SqliteObjectStore, TempDir) {
        let dir = TempDir::new().unwrap();
        let store = SqliteObjectStore::open_at(
            dir.path(),
            "gametracker",
            Some("https://cdn.example.com/"),
        )
        .unwrap();
        (store, dir)
    }

    #[tokio::test]
    async fn test_write_then_exists() {
        let (store, _dir) = test_store();
        let key = derive_key("1.2.3.4", 27960, "b.png");

        assert!(!store.exists(&key).await.unwrap());

        let url = store.write(&key, b"\x89PNG data").await.unwrap();
        assert_eq!(
            url,
            "https://cdn.example.com/gametracker/1.2.3.4_27960_b.png"
        );
        assert!(store.exists(&key).await.unwrap());
        assert_eq!(
            std::fs::read(store.blob_path(&key)).unwrap(),
            b"\x89PNG data".to_vec()
        );
    }

    #[tokio::test]
    async fn test_last_modified_requires_entry() {
        let (store, _dir) = test_store();
        let key = derive_key("1.2.3.4", 27960, "b.png");

        match store.last_modified(&key).await {
            Err(StoreError::NotFound(k)) => assert_eq!(k, key.to_string()),
            other => panic!("Expected NotFound, got {:?}", other),
        }

        let before = Utc::now() - chrono::Duration::seconds(1);
        store.write(&key, b"data").await.unwrap();
        let modified = store.last_modified(&key).await.unwrap();
        assert!(modified >= before);
    }

    #[tokio::test]
    async fn test_overwrite_replaces_content() {
        let (store, _dir) = test_store();
        let key = derive_key("1.2.3.4", 27960, "b.png");

        store.write(&key, b"old").await.unwrap();
        store.write(&key, b"new").await.unwrap();

        assert_eq!(std::fs::read(store.blob_path(&key)).unwrap(), b"new".to_vec());
        let blobs = store.list().unwrap();
        assert_eq!(blobs.len(), 1);
        assert_eq!(blobs[0].size_bytes, 3);
        assert_eq!(blobs[0].etag, format!("{:x}", Sha256::digest(b"new")));
    }

    #[tokio::test]
    async fn test_delete_is_noop_when_absent() {
        let (store, _dir) = test_store();
        let key = derive_key("1.2.3.4", 27960, "b.png");

        store.delete(&key).await.unwrap();

        store.write(&key, b"data").await.unwrap();
        store.delete(&key).await.unwrap();
        assert!(!store.exists(&key).await.unwrap());
        assert!(!store.blob_path(&key).exists());
    }

    #[tokio::test]
    async fn test_missing_file_drops_index_entry() {
        let (store, _dir) = test_store();
        let key = derive_key("1.2.3.4", 27960, "b.png");

        store.write(&key, b"data").await.unwrap();
        std::fs::remove_file(store.blob_path(&key)).unwrap();

        assert!(!store.exists(&key).await.unwrap());
        assert!(store.list().unwrap().is_empty());
    }

    #[test]
    fn test_locate_defaults_to_file_url() {
        let dir = TempDir::new().unwrap();
        let store = SqliteObjectStore::open_at(dir.path(), "gametracker", None).unwrap();
        let key = derive_key("192.0.2.10", 28960, "b.png");

        let url = store.locate(&key);
        assert!(url.starts_with("file://"));
        assert!(url.ends_with("/gametracker/192.0.2.10_28960_b.png"));
    }

    #[tokio::test]
    async fn test_stats_split_fresh_and_stale() {
        let (store, _dir) = test_store();
        let fresh = derive_key("1.2.3.4", 27960, "a.png");
        let stale = derive_key("1.2.3.4", 27960, "b.png");

        store.write(&fresh, b"aaaa").await.unwrap();
        store.write(&stale, b"bb").await.unwrap();
        store
            .set_last_modified(&stale, Utc::now() - chrono::Duration::minutes(11))
            .unwrap();

        let stats = store.stats(Duration::from_secs(600)).unwrap();
        assert_eq!(stats.total_entries, 2);
        assert_eq!(stats.fresh_entries, 1);
        assert_eq!(stats.stale_entries, 1);
        assert_eq!(stats.total_size_bytes, 6);
        assert!(stats.oldest_write.unwrap() < stats.newest_write.unwrap());
    }

    #[tokio::test]
    async fn test_stats_huge_ttl_counts_everything_fresh() {
        let (store, _dir) = test_store();
        let old = derive_key("1.2.3.4", 27960, "a.png");

        store.write(&old, b"aaaa").await.unwrap();
        store
            .set_last_modified(&old, Utc::now() - chrono::Duration::days(3650))
            .unwrap();

        let stats = store.stats(Duration::from_secs(u64::MAX / 2)).unwrap();
        assert_eq!(stats.total_entries, 1);
        assert_eq!(stats.fresh_entries, 1);
        assert_eq!(stats.stale_entries, 0);
    }

    #[tokio::test]
    async fn test_clear_all() {
        let (store, _dir) = test_store();
        let k1 = derive_key("1.2.3.4", 27960, "a.png");
        let k2 = derive_key("1.2.3.4", 27960, "b.png");

        store.write(&k1, b"d1").await.unwrap();
        store.write(&k2, b"d2").await.unwrap();

        let stats = store.clear_all().unwrap();
        assert_eq!(stats.entries_removed, 2);

        assert!(!store.exists(&k1).await.unwrap());
        assert!(!store.blob_path(&k2).exists());
    }

    #[tokio::test]
    async fn test_reopen_keeps_entries() {
        let dir = TempDir::new().unwrap();
        let key = derive_key("1.2.3.4", 27960, "b.png");
        {
            let store = SqliteObjectStore::open_at(dir.path(), "gametracker", None).unwrap();
            store.write(&key, b"data").await.unwrap();
        }

        let store = SqliteObjectStore::open_at(dir.path(), "gametracker", None).unwrap();
        assert!(store.exists(&key).await.unwrap());
    }
}
