//! Banner cache service
//!
//! Serves a banner from the object store while it is younger than the TTL,
//! refreshes it from the origin when stale or missing, and falls back to the
//! direct origin URL whenever the refresh path fails. Callers always get a
//! displayable URL.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::Utc;
use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use log::{debug, info, warn};
use serde::Serialize;

use super::{BannerSettings, BannerTarget, CacheKey, ReplaceStrategy};
use crate::client::{ImageFetcher, origin_url};
use crate::error::StoreError;
use crate::store::{self, ObjectStore};

/// Where a banner URL came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BannerSource {
    /// Fresh blob already in the store
    Cache,
    /// Blob fetched from the origin and stored during this call
    Refreshed,
    /// Refresh failed; URL points straight at the origin
    Origin,
}

impl BannerSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            BannerSource::Cache => "cache",
            BannerSource::Refreshed => "refreshed",
            BannerSource::Origin => "origin",
        }
    }
}

/// Resolved banner URL returned to callers
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BannerResult {
    pub banner_url: String,
    #[serde(skip)]
    pub source: BannerSource,
}

/// Outcome of the existence and freshness check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lookup {
    Fresh,
    Stale,
    Missing,
}

/// Shared handle to a refresh in progress; `None` means it failed
type RefreshFuture = Shared<BoxFuture<'static, Option<String>>>;

/// Cache-aside resolver for server banners.
///
/// Refreshes run on their own tokio task: dropping a caller never abandons a
/// write halfway. With `coalesce_refreshes` set, concurrent callers for the
/// same key await one shared refresh instead of each hitting the origin.
pub struct BannerCacheService<S, F> {
    store: Arc<S>,
    fetcher: Arc<F>,
    settings: BannerSettings,
    in_flight: Arc<Mutex<HashMap<CacheKey, RefreshFuture>>>,
}

impl<S, F> BannerCacheService<S, F>
where
    S: ObjectStore + 'static,
    F: ImageFetcher + 'static,
{
    pub fn new(store: Arc<S>, fetcher: Arc<F>, settings: BannerSettings) -> Self {
        Self {
            store,
            fetcher,
            settings,
            in_flight: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Resolve a banner to a displayable URL. Never fails.
    pub async fn get_banner(&self, target: &BannerTarget) -> BannerResult {
        let key = target.key();

        let existed = match self.lookup(&key).await {
            Ok(Lookup::Fresh) => {
                debug!("Cache hit for {}", key);
                return BannerResult {
                    banner_url: self.store.locate(&key),
                    source: BannerSource::Cache,
                };
            }
            Ok(Lookup::Stale) => {
                debug!("Cache stale for {}", key);
                true
            }
            Ok(Lookup::Missing) => {
                debug!("Cache miss for {}", key);
                false
            }
            Err(e) => {
                warn!("Cache lookup for {} failed: {}", key, e);
                return self.degrade(target);
            }
        };

        match self.refresh(key, target, existed).await {
            Some(banner_url) => BannerResult {
                banner_url,
                source: BannerSource::Refreshed,
            },
            None => self.degrade(target),
        }
    }

    async fn lookup(&self, key: &CacheKey) -> store::Result<Lookup> {
        if !self.store.exists(key).await? {
            return Ok(Lookup::Missing);
        }

        let modified = match self.store.last_modified(key).await {
            Ok(modified) => modified,
            // Removed between the two calls
            Err(StoreError::NotFound(_)) => return Ok(Lookup::Missing),
            Err(e) => return Err(e),
        };

        let ttl = chrono::Duration::from_std(self.settings.ttl).unwrap_or(chrono::Duration::MAX);
        if Utc::now().signed_duration_since(modified) < ttl {
            Ok(Lookup::Fresh)
        } else {
            Ok(Lookup::Stale)
        }
    }

    /// Start (or join) a refresh for `key` and wait for its outcome
    fn refresh(&self, key: CacheKey, target: &BannerTarget, existed: bool) -> RefreshFuture {
        let coalesce = self.settings.coalesce_refreshes;
        let mut in_flight = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);

        if coalesce {
            if let Some(pending) = in_flight.get(&key) {
                debug!("Joining in-flight refresh for {}", key);
                return pending.clone();
            }
        }

        let job = RefreshJob {
            store: Arc::clone(&self.store),
            fetcher: Arc::clone(&self.fetcher),
            key: key.clone(),
            target: target.clone(),
            strategy: self.settings.replace_strategy,
            existed,
        };
        let registry = coalesce.then(|| Arc::clone(&self.in_flight));
        let task_key = key.clone();

        let task = tokio::spawn(async move {
            let outcome = job.run().await;
            if let Some(registry) = registry {
                registry
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .remove(&task_key);
            }
            outcome
        });

        let refresh = async move {
            task.await.unwrap_or_else(|e| {
                warn!("Banner refresh task aborted: {}", e);
                None
            })
        }
        .boxed()
        .shared();

        if coalesce {
            in_flight.insert(key, refresh.clone());
        }
        refresh
    }

    fn degrade(&self, target: &BannerTarget) -> BannerResult {
        let banner_url = origin_url(&self.settings.origin_base, target);
        debug!("Serving {} straight from origin", target);
        BannerResult {
            banner_url,
            source: BannerSource::Origin,
        }
    }

    /// Number of refreshes currently registered for coalescing
    #[cfg(test)]
    fn pending_refreshes(&self) -> usize {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

/// One fetch-and-store pass for a single key
struct RefreshJob<S, F> {
    store: Arc<S>,
    fetcher: Arc<F>,
    key: CacheKey,
    target: BannerTarget,
    strategy: ReplaceStrategy,
    existed: bool,
}

impl<S: ObjectStore, F: ImageFetcher> RefreshJob<S, F> {
    async fn run(self) -> Option<String> {
        let bytes = match self.fetcher.fetch(&self.target).await {
            Ok(bytes) => bytes,
            Err(e) => {
                // Existing blob stays as it was
                warn!("Origin fetch for {} failed: {}", self.target, e);
                return None;
            }
        };

        match self.replace(&bytes).await {
            Ok(url) => {
                info!("Refreshed banner {} ({} bytes)", self.key, bytes.len());
                Some(url)
            }
            Err(e) => {
                warn!("Storing banner {} failed: {}", self.key, e);
                None
            }
        }
    }

    async fn replace(&self, bytes: &[u8]) -> store::Result<String> {
        if self.strategy == ReplaceStrategy::DeleteThenWrite && self.existed {
            self.store.delete(&self.key).await?;
        }
        self.store.write(&self.key, bytes).await
    }
}
