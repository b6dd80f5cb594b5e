//! In-memory collaborators for banner cache tests
//!
//! Both mocks count their calls and record the order of store mutations so
//! tests can assert exactly what the service did.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

use super::{BannerTarget, CacheKey};
use crate::client::ImageFetcher;
use crate::error::{FetchError, StoreError};
use crate::store::{self, ObjectStore};

/// Base URL the mock store locates blobs under
pub const MOCK_STORE_BASE: &str = "https://store.test/gametracker";

/// A mutation applied to the mock store
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreOp {
    Write(String),
    Delete(String),
}

/// Tracks store call counts for test verification
#[derive(Default, Debug, Clone)]
pub struct StoreCalls {
    pub exists: usize,
    pub last_modified: usize,
    pub write: usize,
    pub delete: usize,
}

/// Mock object store keeping blobs in memory.
///
/// # Example
/// ```ignore
/// let store = MockObjectStore::new()
///     .with_entry("1.2.3.4_27960_b.png", b"old", Utc::now() - chrono::Duration::minutes(11));
/// ```
#[derive(Default)]
pub struct MockObjectStore {
    entries: Arc<Mutex<HashMap<String, (Vec<u8>, DateTime<Utc>)>>>,
    calls: Arc<Mutex<StoreCalls>>,
    ops: Arc<Mutex<Vec<StoreOp>>>,
    fail_exists: bool,
    fail_writes: bool,
}

impl MockObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an entry with a given last write time
    pub fn with_entry(self, key: &str, data: &[u8], last_modified: DateTime<Utc>) -> Self {
        self.entries
            .try_lock()
            .expect("mock store not shared yet")
            .insert(key.to_string(), (data.to_vec(), last_modified));
        self
    }

    /// Make every existence check fail
    pub fn with_failing_exists(mut self) -> Self {
        self.fail_exists = true;
        self
    }

    /// Make every write fail
    pub fn with_failing_writes(mut self) -> Self {
        self.fail_writes = true;
        self
    }

    pub async fn calls(&self) -> StoreCalls {
        self.calls.lock().await.clone()
    }

    pub async fn operations(&self) -> Vec<StoreOp> {
        self.ops.lock().await.clone()
    }

    pub async fn entry(&self, key: &str) -> Option<(Vec<u8>, DateTime<Utc>)> {
        self.entries.lock().await.get(key).cloned()
    }
}

#[async_trait]
impl ObjectStore for MockObjectStore {
    async fn exists(&self, key: &CacheKey) -> store::Result<bool> {
        self.calls.lock().await.exists += 1;
        if self.fail_exists {
            return Err(StoreError::Io("mock exists failure".to_string()));
        }
        Ok(self.entries.lock().await.contains_key(key.as_str()))
    }

    async fn last_modified(&self, key: &CacheKey) -> store::Result<DateTime<Utc>> {
        self.calls.lock().await.last_modified += 1;
        self.entries
            .lock()
            .await
            .get(key.as_str())
            .map(|(_, modified)| *modified)
            .ok_or_else(|| StoreError::NotFound(key.to_string()))
    }

    async fn write(&self, key: &CacheKey, data: &[u8]) -> store::Result<String> {
        self.calls.lock().await.write += 1;
        if self.fail_writes {
            return Err(StoreError::Io("mock write failure".to_string()));
        }
        self.ops.lock().await.push(StoreOp::Write(key.to_string()));
        self.entries
            .lock()
            .await
            .insert(key.to_string(), (data.to_vec(), Utc::now()));
        Ok(self.locate(key))
    }

    async fn delete(&self, key: &CacheKey) -> store::Result<()> {
        self.calls.lock().await.delete += 1;
        self.ops.lock().await.push(StoreOp::Delete(key.to_string()));
        self.entries.lock().await.remove(key.as_str());
        Ok(())
    }

    fn locate(&self, key: &CacheKey) -> String {
        format!("{}/{}", MOCK_STORE_BASE, key)
    }
}

/// What the mock fetcher answers with
#[derive(Debug, Clone)]
pub enum FetchOutcome {
    Bytes(Vec<u8>),
    Timeout,
    Status(u16),
}

/// Mock origin fetcher with a fixed outcome and optional latency
pub struct MockFetcher {
    outcome: FetchOutcome,
    delay: Option<Duration>,
    calls: Arc<Mutex<Vec<BannerTarget>>>,
}

impl MockFetcher {
    pub fn returning(bytes: &[u8]) -> Self {
        Self {
            outcome: FetchOutcome::Bytes(bytes.to_vec()),
            delay: None,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn failing(outcome: FetchOutcome) -> Self {
        Self {
            outcome,
            delay: None,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Delay every response, to hold refreshes in flight
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub async fn call_count(&self) -> usize {
        self.calls.lock().await.len()
    }
}

#[async_trait]
impl ImageFetcher for MockFetcher {
    async fn fetch(&self, target: &BannerTarget) -> Result<Vec<u8>, FetchError> {
        self.calls.lock().await.push(target.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        match &self.outcome {
            FetchOutcome::Bytes(bytes) => Ok(bytes.clone()),
            FetchOutcome::Timeout => Err(FetchError::Timeout(Duration::from_secs(10))),
            FetchOutcome::Status(code) => Err(FetchError::Status(*code)),
        }
    }
}
