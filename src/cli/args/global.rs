//! Global CLI options shared across all commands
//!
//! Collects the global flags once in `main.rs` so handlers take a single
//! argument instead of one parameter per flag.

use std::path::PathBuf;

use crate::cli::{Cli, OutputFormat};
use crate::config::Config;

/// Global CLI options passed to all command handlers.
///
/// # Precedence
///
/// CLI flag > environment variable > config file > default. This struct
/// captures the CLI/env layer; [`GlobalOptions::apply_overrides`] lays it
/// over the loaded config.
#[derive(Debug, Clone)]
pub struct GlobalOptions {
    /// Output format (pretty, json)
    pub format: OutputFormat,

    /// Custom config file path (defaults to ~/.bannercache/config.yaml)
    pub config: Option<String>,

    /// Origin base URL override
    pub origin: Option<String>,

    /// Store directory override
    pub store_dir: Option<PathBuf>,

    /// TTL override in seconds
    pub ttl_secs: Option<u64>,
}

impl GlobalOptions {
    /// Create GlobalOptions from a parsed CLI struct.
    pub fn from_cli(cli: &Cli) -> Self {
        Self {
            format: cli.format,
            config: cli.config.clone(),
            origin: cli.origin.clone(),
            store_dir: cli.store_dir.clone(),
            ttl_secs: cli.ttl_secs,
        }
    }

    /// Get config path as `Option<&str>`.
    pub fn config_ref(&self) -> Option<&str> {
        self.config.as_deref()
    }

    /// Overlay CLI/env values onto a loaded config.
    pub fn apply_overrides(&self, config: &mut Config) {
        if let Some(origin) = &self.origin {
            config.origin_base = origin.clone();
        }
        if let Some(dir) = &self.store_dir {
            config.store.root = Some(dir.clone());
        }
        if let Some(ttl) = self.ttl_secs {
            config.ttl_secs = ttl;
        }
    }
}
