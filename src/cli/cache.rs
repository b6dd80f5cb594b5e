//! Banner store management commands

use chrono::Utc;

use crate::banner::BannerTarget;
use crate::cli::{CommandContext, GlobalOptions, OutputFormat};
use crate::error::Result;
use crate::output::formatters::{format_age, format_local, format_size};
use crate::store::ObjectStore;

/// Show store statistics
pub fn status(opts: &GlobalOptions) -> Result<()> {
    let ctx = CommandContext::new(opts)?;
    let store = ctx.open_store()?;
    let stats = store.stats(ctx.config.ttl())?;

    match ctx.format {
        OutputFormat::Json => {
            let json = serde_json::json!({
                "total_entries": stats.total_entries,
                "fresh_entries": stats.fresh_entries,
                "stale_entries": stats.stale_entries,
                "total_size_bytes": stats.total_size_bytes,
                "total_size_human": format_size(stats.total_size_bytes),
                "oldest_write": stats.oldest_write.map(|t| t.to_rfc3339()),
                "newest_write": stats.newest_write.map(|t| t.to_rfc3339()),
                "container": store.container(),
                "path": store.root().display().to_string(),
            });
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
        OutputFormat::Pretty => {
            println!("Banner Store Status");
            println!("────────────────────────────────────────");
            println!("Location:       {}", store.root().display());
            println!("Container:      {}", store.container());
            println!("Fresh banners:  {}", stats.fresh_entries);
            println!("Stale banners:  {}", stats.stale_entries);
            println!("Total size:     {}", format_size(stats.total_size_bytes));

            if let Some(oldest) = stats.oldest_write {
                println!("Oldest write:   {}", format_local(oldest));
            }
            if let Some(newest) = stats.newest_write {
                println!("Newest write:   {}", format_local(newest));
            }
        }
    }

    Ok(())
}

/// List stored banners
pub fn list(opts: &GlobalOptions) -> Result<()> {
    let ctx = CommandContext::new(opts)?;
    let store = ctx.open_store()?;
    let blobs = store.list()?;
    let now = Utc::now();
    let ttl = chrono::Duration::from_std(ctx.config.ttl()).unwrap_or(chrono::Duration::MAX);

    match ctx.format {
        OutputFormat::Json => {
            let json: Vec<_> = blobs
                .iter()
                .map(|b| {
                    serde_json::json!({
                        "key": b.key,
                        "size_bytes": b.size_bytes,
                        "etag": b.etag,
                        "last_modified": b.last_modified.to_rfc3339(),
                        "fresh": now.signed_duration_since(b.last_modified) < ttl,
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
        OutputFormat::Pretty => {
            if blobs.is_empty() {
                println!("No banners stored");
                return Ok(());
            }
            for blob in &blobs {
                let state = if now.signed_duration_since(blob.last_modified) < ttl {
                    "fresh"
                } else {
                    "stale"
                };
                println!(
                    "{:<48} {:>12} {:>10} ago  {}",
                    blob.key,
                    format_size(blob.size_bytes),
                    format_age(blob.last_modified, now),
                    state
                );
            }
        }
    }

    Ok(())
}

/// Remove one stored banner
pub async fn remove(opts: &GlobalOptions, server: &str, image: &str) -> Result<()> {
    let target = BannerTarget::parse(server, image)?;
    let ctx = CommandContext::new(opts)?;
    let store = ctx.open_store()?;
    let key = target.key();

    let existed = store.exists(&key).await?;
    store.delete(&key).await?;

    match ctx.format {
        OutputFormat::Json => {
            let json = serde_json::json!({
                "key": key.as_str(),
                "removed": existed,
            });
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
        OutputFormat::Pretty => {
            if existed {
                println!("Removed {}", key);
            } else {
                println!("{} was not stored", key);
            }
        }
    }

    Ok(())
}

/// Clear all stored banners
pub fn clear(opts: &GlobalOptions) -> Result<()> {
    let ctx = CommandContext::new(opts)?;
    let store = ctx.open_store()?;
    let stats = store.clear_all()?;

    match ctx.format {
        OutputFormat::Json => {
            let json = serde_json::json!({
                "entries_removed": stats.entries_removed,
                "success": true,
            });
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
        OutputFormat::Pretty => {
            if stats.entries_removed > 0 {
                println!("Cleared {} stored banners", stats.entries_removed);
            } else {
                println!("Store was already empty");
            }
        }
    }

    Ok(())
}

/// Show store path
pub fn path(opts: &GlobalOptions) -> Result<()> {
    let ctx = CommandContext::new(opts)?;
    let store = ctx.open_store()?;
    println!("{}", store.root().display());
    Ok(())
}
