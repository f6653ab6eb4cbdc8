//! Cache management commands

use crate::cache::{ResponseCache, SqliteCache};
use crate::cli::context::{cache_path, load_config};
use crate::cli::{GlobalOptions, OutputFormat};
use crate::error::Result;

/// Show cache location and size
pub fn status(opts: &GlobalOptions) -> Result<()> {
    let config = load_config(opts)?;
    let path = cache_path(&config)?;
    let cache = SqliteCache::open_at(&path)?;
    let entries = cache.count()?;
    let expired = cache.expired_count()?;
    cache.close()?;
    let size = std::fs::metadata(&path).map(|m| m.len()).unwrap_or(0);

    match opts.format {
        OutputFormat::Json => {
            let json = serde_json::json!({
                "path": path.display().to_string(),
                "enabled": config.cache.enabled,
                "ttl_days": config.cache.ttl_days,
                "total_entries": entries,
                "expired_entries": expired,
                "total_size_bytes": size,
                "total_size_human": format_size(size),
            });
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
        OutputFormat::Pretty => {
            println!("Cache Status");
            println!("────────────────────────────────────────");
            println!("Location:       {}", path.display());
            println!(
                "Enabled:        {}",
                if config.cache.enabled { "yes" } else { "no" }
            );
            println!("TTL:            {} days", config.cache.ttl_days);
            println!("Entries:        {}", entries);
            println!("Expired:        {}", expired);
            println!("Total size:     {}", format_size(size));
        }
    }

    Ok(())
}

/// Remove all entries, or only expired ones
pub fn clear(opts: &GlobalOptions, expired_only: bool) -> Result<()> {
    let config = load_config(opts)?;
    let cache = SqliteCache::open_at(&cache_path(&config)?)?;

    let removed = if expired_only {
        cache.purge_expired()?
    } else {
        let before = cache.count()?;
        cache.clear()?;
        before
    };
    cache.close()?;

    match opts.format {
        OutputFormat::Json => {
            let json = serde_json::json!({
                "entries_removed": removed,
                "expired_only": expired_only,
                "success": true,
            });
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
        OutputFormat::Pretty => {
            if removed > 0 {
                println!("Cleared {} cache entries", removed);
            } else {
                println!("Cache was already empty");
            }
        }
    }

    Ok(())
}

/// Print the cache database path
pub fn path(opts: &GlobalOptions) -> Result<()> {
    let config = load_config(opts)?;
    println!("{}", cache_path(&config)?.display());
    Ok(())
}

/// Format bytes as human-readable size
fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} bytes", bytes)
    }
}
