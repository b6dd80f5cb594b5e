//! CLI command definitions and handlers

use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub mod args;
pub mod banner;
pub mod cache;
pub mod context;
pub mod init;
pub mod status;

pub use args::{GlobalOptions, OutputFormat};
pub use context::CommandContext;

/// bannercache - cache-aside resolver for game server banners
#[derive(Parser, Debug)]
#[command(name = "bannercache")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Output format (pretty, json)
    #[arg(
        long,
        global = true,
        env = "BANNERCACHE_FORMAT",
        default_value = "pretty",
        hide_env = true,
        hide_possible_values = true
    )]
    pub format: OutputFormat,

    /// Override config file location
    #[arg(long, global = true, env = "BANNERCACHE_CONFIG", hide_env = true)]
    pub config: Option<String>,

    /// Override the origin base URL
    #[arg(long, global = true, env = "BANNERCACHE_ORIGIN", hide_env = true)]
    pub origin: Option<String>,

    /// Override the object store directory
    #[arg(long, global = true, env = "BANNERCACHE_STORE_DIR", hide_env = true)]
    pub store_dir: Option<PathBuf>,

    /// Override the cache freshness window (seconds)
    #[arg(long, global = true, env = "BANNERCACHE_TTL_SECS", hide_env = true)]
    pub ttl_secs: Option<u64>,

    /// Enable debug logging
    #[arg(long, global = true, env = "BANNERCACHE_DEBUG", hide_env = true)]
    pub debug: bool,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Resolve a server banner to a displayable URL
    Get {
        /// Game server as address:port
        server: String,

        /// Banner image name (e.g. b_560_95_1.png)
        image: String,
    },

    /// Write a default configuration file
    Init {
        /// Overwrite an existing configuration file
        #[arg(long)]
        force: bool,
    },

    /// Show the resolved configuration
    Status,

    /// Display version information
    Version,

    /// Manage the local banner store
    #[command(subcommand)]
    Cache(CacheCommands),
}

/// Banner store management subcommands
#[derive(Subcommand, Debug)]
pub enum CacheCommands {
    /// Show store statistics
    Status,

    /// List stored banners
    List,

    /// Remove one stored banner
    Remove {
        /// Game server as address:port
        server: String,

        /// Banner image name
        image: String,
    },

    /// Remove all stored banners
    Clear,

    /// Print the store directory
    Path,
}
