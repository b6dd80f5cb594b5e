//! Status command implementation

use colored::Colorize;

use crate::cli::{GlobalOptions, OutputFormat};
use crate::config::Config;
use crate::error::Result;
use crate::store::SqliteObjectStore;

/// Display the resolved configuration
pub fn run(opts: &GlobalOptions) -> Result<()> {
    let config_path = Config::resolve_path(opts.config_ref())?;
    let mut config = Config::load_at(opts.config_ref())?;
    opts.apply_overrides(&mut config);
    let validation = config.validate();

    let store_root = match &config.store.root {
        Some(root) => root.display().to_string(),
        None => SqliteObjectStore::default_root()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|_| "unknown".to_string()),
    };

    if opts.format == OutputFormat::Json {
        let json = serde_json::json!({
            "config_path": config_path.display().to_string(),
            "config_file_present": config_path.exists(),
            "origin_base": config.origin_base,
            "ttl_secs": config.ttl_secs,
            "fetch_timeout_secs": config.fetch_timeout_secs,
            "replace_strategy": config.replace_strategy,
            "coalesce_refreshes": config.coalesce_refreshes,
            "store": {
                "root": store_root,
                "container": config.store.container,
                "public_base_url": config.store.public_base_url,
            },
            "valid": validation.is_ok(),
        });
        println!("{}", serde_json::to_string_pretty(&json)?);
        return Ok(());
    }

    println!("{}\n", "bannercache Configuration Status".bold());

    if config_path.exists() {
        println!("Config file: {}", config_path.display().to_string().cyan());
    } else {
        println!(
            "Config file: {} {}",
            config_path.display().to_string().cyan(),
            "(not present, using defaults)".dimmed()
        );
    }
    println!();

    println!("Origin:           {}", config.origin_base);
    println!("Freshness (TTL):  {}s", config.ttl_secs);
    println!("Fetch timeout:    {}s", config.fetch_timeout_secs);
    println!("Replace strategy: {:?}", config.replace_strategy);
    println!(
        "Coalescing:       {}",
        if config.coalesce_refreshes { "on" } else { "off" }
    );
    println!();
    println!("Store root:       {}", store_root);
    println!("Container:        {}", config.store.container);
    match &config.store.public_base_url {
        Some(url) => println!("Public base URL:  {}", url),
        None => println!("Public base URL:  {}", "file:// (store root)".dimmed()),
    }
    println!();

    match validation {
        Ok(()) => println!("{} Configuration valid", "✓".green()),
        Err(e) => println!("{} {}", "✗".red(), e),
    }

    Ok(())
}
