//! Banner image cache-aside
//!
//! Resolves a game server banner to a displayable URL, serving it from the
//! object store while fresh and refreshing it from the origin when stale.

pub mod key;
#[cfg(test)]
pub mod mock;
pub mod service;

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How a refresh replaces an existing blob
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplaceStrategy {
    /// Single overwriting write; the entry never disappears mid-refresh
    #[default]
    Overwrite,
    /// Delete the old blob, then write the new one
    DeleteThenWrite,
}

/// Settings injected into the banner cache service
#[derive(Debug, Clone)]
pub struct BannerSettings {
    /// Freshness window for cached banners
    pub ttl: Duration,
    /// Origin request deadline
    pub fetch_timeout: Duration,
    /// Origin base URL, without trailing slash
    pub origin_base: String,
    pub user_agent: String,
    pub replace_strategy: ReplaceStrategy,
    pub coalesce_refreshes: bool,
}

impl Default for BannerSettings {
    fn default() -> Self {
        crate::config::Config::default().banner_settings()
    }
}

// Re-export main types
pub use key::{BannerTarget, CacheKey};
pub use service::{BannerCacheService, BannerResult};
