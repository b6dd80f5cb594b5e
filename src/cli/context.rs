//! Command execution context
//!
//! Loads and validates configuration once and builds the store and banner
//! service the commands share.

use std::sync::Arc;

use crate::banner::BannerCacheService;
use crate::cli::{GlobalOptions, OutputFormat};
use crate::client::OriginClient;
use crate::config::Config;
use crate::error::Result;
use crate::store::SqliteObjectStore;

/// Banner service wired to the local store and the HTTP origin
pub type LocalBannerService = BannerCacheService<SqliteObjectStore, OriginClient>;

/// Context for command execution containing config and runtime options.
pub struct CommandContext {
    /// Loaded, overridden and validated configuration
    pub config: Config,
    /// Output format preference
    pub format: OutputFormat,
}

impl CommandContext {
    /// Load config (default location unless overridden), apply CLI/env
    /// overrides and validate the result.
    pub fn new(opts: &GlobalOptions) -> Result<Self> {
        let mut config = Config::load_at(opts.config_ref())?;
        opts.apply_overrides(&mut config);
        config.validate()?;

        Ok(Self {
            config,
            format: opts.format,
        })
    }

    /// Open the configured object store
    pub fn open_store(&self) -> Result<SqliteObjectStore> {
        Ok(SqliteObjectStore::open(&self.config.store)?)
    }

    /// Build the banner service over the configured store and origin
    pub fn banner_service(&self) -> Result<LocalBannerService> {
        let settings = self.config.banner_settings();
        let store = Arc::new(self.open_store()?);
        let fetcher = Arc::new(OriginClient::new(&settings)?);
        Ok(BannerCacheService::new(store, fetcher, settings))
    }
}
