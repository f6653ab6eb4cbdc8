//! Command execution context
//!
//! Loads configuration, applies CLI/env overrides, opens the response cache
//! and builds the metadata client.

use std::path::PathBuf;
use std::sync::Arc;

use log::{debug, warn};

use crate::cache::{ResponseCache, SqliteCache};
use crate::cli::{GlobalOptions, OutputFormat};
use crate::client::{ClientOptions, MetadataClient};
use crate::config::Config;
use crate::error::{ConfigError, Error, Result};

/// Shared state for commands that talk to TMDB
pub struct CommandContext {
    pub config: Config,
    pub client: MetadataClient,
    pub format: OutputFormat,
}

impl CommandContext {
    /// Load config, validate it and build a client.
    ///
    /// The cache is skipped with `--no-cache` or `cache.enabled: false`. A
    /// cache that fails to open is logged and skipped.
    pub fn new(opts: &GlobalOptions) -> Result<Self> {
        let config = load_config(opts)?;
        config.validate()?;

        let cache = if opts.no_cache || !config.cache.enabled {
            debug!("Response cache disabled");
            None
        } else {
            open_cache(&config)
        };

        let client = MetadataClient::new(ClientOptions::from_config(&config)?, cache)?;

        Ok(Self {
            config,
            client,
            format: opts.format,
        })
    }

    /// Release the cache connection
    pub fn finish(self) {
        if let Some(cache) = self.client.cache()
            && let Err(e) = cache.close()
        {
            warn!("Failed to close response cache: {}", e);
        }
    }
}

/// Load the config file and merge CLI/env overrides.
///
/// A missing file at the default location is not an error; an explicitly
/// requested file must exist.
pub fn load_config(opts: &GlobalOptions) -> Result<Config> {
    let mut config = match Config::load_at(opts.config_ref()) {
        Ok(config) => config,
        Err(Error::Config(ConfigError::NotFound(path))) if opts.config.is_none() => {
            debug!("No config file at {}, using defaults", path);
            Config::default()
        }
        Err(e) => return Err(e),
    };

    if let Some(key) = &opts.api_key {
        config.tmdb.api_key = Some(key.clone());
    }
    if let Some(host) = &opts.api_host {
        let host = host.trim_end_matches('/');
        config.tmdb.api_base_url = Some(format!("{}/3", host));
        config.tmdb.image_base_url = Some(format!("{}/t/p", host));
    }
    if opts.refresh {
        config.force_refresh = true;
    }

    Ok(config)
}

/// Cache database location for this configuration
pub fn cache_path(config: &Config) -> Result<PathBuf> {
    match &config.cache.path {
        Some(path) => Ok(path.clone()),
        None => Ok(SqliteCache::default_path()?),
    }
}

fn open_cache(config: &Config) -> Option<Arc<dyn ResponseCache>> {
    let path = match cache_path(config) {
        Ok(path) => path,
        Err(e) => {
            warn!("Response cache unavailable: {}", e);
            return None;
        }
    };

    match SqliteCache::open_at(&path) {
        Ok(cache) => {
            debug!("Using response cache at {}", path.display());
            Some(Arc::new(cache))
        }
        Err(e) => {
            warn!(
                "Failed to open response cache at {}: {}",
                path.display(),
                e
            );
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_explicit_missing_config_is_error() {
        let dir = tempdir().unwrap();
        let opts = GlobalOptions {
            config: Some(dir.path().join("absent.yaml").display().to_string()),
            ..Default::default()
        };

        assert!(matches!(
            load_config(&opts),
            Err(Error::Config(ConfigError::NotFound(_)))
        ));
    }

    #[test]
    fn test_overrides_applied() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "tmdb:\n  api_key: from-file\n").unwrap();
        let opts = GlobalOptions {
            config: Some(path.display().to_string()),
            api_key: Some("from-flag".to_string()),
            api_host: Some("http://127.0.0.1:9999/".to_string()),
            refresh: true,
            ..Default::default()
        };

        let config = load_config(&opts).unwrap();

        assert_eq!(config.tmdb.api_key.as_deref(), Some("from-flag"));
        assert_eq!(config.tmdb.api_base_url(), "http://127.0.0.1:9999/3");
        assert_eq!(config.tmdb.image_base_url(), "http://127.0.0.1:9999/t/p");
        assert!(config.force_refresh);
    }

    #[test]
    fn test_context_requires_api_key() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "tmdb:\n  language: en-GB\n").unwrap();
        let opts = GlobalOptions {
            config: Some(path.display().to_string()),
            ..Default::default()
        };

        assert!(matches!(
            CommandContext::new(&opts),
            Err(Error::Config(ConfigError::MissingApiKey))
        ));
    }

    #[test]
    fn test_context_opens_configured_cache() {
        let dir = tempdir().unwrap();
        let db = dir.path().join("db").join("cache.db");
        let path = dir.path().join("config.yaml");
        std::fs::write(
            &path,
            format!("tmdb:\n  api_key: k\ncache:\n  path: {}\n", db.display()),
        )
        .unwrap();
        let opts = GlobalOptions {
            config: Some(path.display().to_string()),
            ..Default::default()
        };

        let ctx = CommandContext::new(&opts).unwrap();

        assert!(ctx.client.cache().is_some());
        assert!(db.exists());
        ctx.finish();
    }

    #[test]
    fn test_no_cache_flag() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "tmdb:\n  api_key: k\n").unwrap();
        let opts = GlobalOptions {
            config: Some(path.display().to_string()),
            no_cache: true,
            ..Default::default()
        };

        let ctx = CommandContext::new(&opts).unwrap();

        assert!(ctx.client.cache().is_none());
    }
}
