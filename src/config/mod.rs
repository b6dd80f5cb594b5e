//! Configuration management for bannercache

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::banner::{BannerSettings, ReplaceStrategy};
use crate::error::{ConfigError, Result};

/// Default origin host rendering the banners
pub const DEFAULT_ORIGIN_BASE: &str = "https://cache.gametracker.com";

/// Default object store container
pub const DEFAULT_CONTAINER: &str = "gametracker";

/// Browser user agent sent to the origin; it rejects default client identifiers.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

/// Longest accepted freshness window (one year)
pub const MAX_TTL_SECS: u64 = 365 * 24 * 60 * 60;

/// Longest accepted origin request deadline
pub const MAX_FETCH_TIMEOUT_SECS: u64 = 300;

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Origin service base URL
    #[serde(default = "default_origin_base")]
    pub origin_base: String,

    /// Cache freshness window in seconds
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,

    /// Origin request deadline in seconds
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,

    /// User agent presented to the origin
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// How a refresh replaces an existing blob
    #[serde(default)]
    pub replace_strategy: ReplaceStrategy,

    /// Collapse concurrent refreshes of the same banner into one
    #[serde(default = "default_true")]
    pub coalesce_refreshes: bool,

    /// Object store settings
    #[serde(default)]
    pub store: StoreConfig,
}

/// Object store settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Directory holding the blob index and containers
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root: Option<PathBuf>,

    /// Container name
    #[serde(default = "default_container")]
    pub container: String,

    /// Public base URL blobs are served from; `file://{root}` when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_base_url: Option<String>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            root: None,
            container: default_container(),
            public_base_url: None,
        }
    }
}

fn default_origin_base() -> String {
    DEFAULT_ORIGIN_BASE.to_string()
}

fn default_ttl_secs() -> u64 {
    10 * 60
}

fn default_fetch_timeout_secs() -> u64 {
    10
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

fn default_container() -> String {
    DEFAULT_CONTAINER.to_string()
}

fn default_true() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            origin_base: default_origin_base(),
            ttl_secs: default_ttl_secs(),
            fetch_timeout_secs: default_fetch_timeout_secs(),
            user_agent: default_user_agent(),
            replace_strategy: ReplaceStrategy::default(),
            coalesce_refreshes: true,
            store: StoreConfig::default(),
        }
    }
}

impl Config {
    /// Get the default config file path
    pub fn default_path() -> Result<PathBuf> {
        let home = dirs::home_dir().ok_or(ConfigError::Invalid(
            "Could not determine home directory".to_string(),
        ))?;

        Ok(home.join(".bannercache").join("config.yaml"))
    }

    /// Resolve the config path from an optional override
    pub fn resolve_path(path: Option<&str>) -> Result<PathBuf> {
        match path {
            Some(p) => Ok(PathBuf::from(p)),
            None => Self::default_path(),
        }
    }

    /// Load configuration from an optional path.
    ///
    /// A missing file at the default location yields defaults; a missing
    /// explicitly named file is an error.
    pub fn load_at(path: Option<&str>) -> Result<Self> {
        let resolved = Self::resolve_path(path)?;
        if !resolved.exists() {
            if path.is_some() {
                return Err(ConfigError::NotFound.into());
            }
            log::debug!("No config at {}, using defaults", resolved.display());
            return Ok(Self::default());
        }
        Self::load_from(&resolved)
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(ConfigError::NotFound.into());
        }

        let contents = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&contents).map_err(ConfigError::from)?;

        Ok(config)
    }

    /// Save configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents =
            serde_yaml::to_string(self).map_err(|e| ConfigError::SaveError(e.to_string()))?;

        std::fs::write(path, contents)?;

        // Store credentials may end up in here; keep it private
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mut perms = std::fs::metadata(path)?.permissions();
            perms.set_mode(0o600);
            std::fs::set_permissions(path, perms)?;
        }

        Ok(())
    }

    /// Check the values a running service depends on
    pub fn validate(&self) -> Result<()> {
        if self.ttl_secs == 0 {
            return Err(ConfigError::Invalid("ttl_secs must be greater than zero".into()).into());
        }
        if self.ttl_secs > MAX_TTL_SECS {
            return Err(ConfigError::Invalid(format!(
                "ttl_secs must be at most {}, got {}",
                MAX_TTL_SECS, self.ttl_secs
            ))
            .into());
        }
        if self.fetch_timeout_secs == 0 {
            return Err(
                ConfigError::Invalid("fetch_timeout_secs must be greater than zero".into()).into(),
            );
        }
        if self.fetch_timeout_secs > MAX_FETCH_TIMEOUT_SECS {
            return Err(ConfigError::Invalid(format!(
                "fetch_timeout_secs must be at most {}, got {}",
                MAX_FETCH_TIMEOUT_SECS, self.fetch_timeout_secs
            ))
            .into());
        }
        if self.store.container.trim().is_empty() {
            return Err(ConfigError::Invalid("store.container must not be empty".into()).into());
        }
        if !(self.origin_base.starts_with("http://") || self.origin_base.starts_with("https://")) {
            return Err(ConfigError::Invalid(format!(
                "origin_base must be an http(s) URL, got '{}'",
                self.origin_base
            ))
            .into());
        }
        Ok(())
    }

    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    /// Settings injected into the banner cache service and origin client
    pub fn banner_settings(&self) -> BannerSettings {
        BannerSettings {
            ttl: self.ttl(),
            fetch_timeout: self.fetch_timeout(),
            origin_base: self.origin_base.trim_end_matches('/').to_string(),
            user_agent: self.user_agent.clone(),
            replace_strategy: self.replace_strategy,
            coalesce_refreshes: self.coalesce_refreshes,
        }
    }
}
