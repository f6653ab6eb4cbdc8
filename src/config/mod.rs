//! Configuration management for reelscan

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{ConfigError, Result};

/// TMDB API endpoint
pub const DEFAULT_API_BASE_URL: &str = "https://api.themoviedb.org/3";

/// TMDB image CDN
pub const DEFAULT_IMAGE_BASE_URL: &str = "https://image.tmdb.org/t/p";

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub tmdb: TmdbSettings,

    #[serde(default)]
    pub retry: RetrySettings,

    #[serde(default)]
    pub cache: CacheSettings,

    /// Skip cache reads (fresh responses are still written back)
    #[serde(default)]
    pub force_refresh: bool,
}

/// Remote catalog settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TmdbSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Response language (e.g. en-US, de-DE)
    #[serde(default = "default_language")]
    pub language: String,

    /// Minimum pause between remote calls
    #[serde(default = "default_rate_limit_delay_ms")]
    pub rate_limit_delay_ms: u64,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_base_url: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_base_url: Option<String>,
}

/// Retry tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrySettings {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,
}

/// Response cache tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheSettings {
    #[serde(default = "default_cache_enabled")]
    pub enabled: bool,

    /// Database file; defaults to the platform cache directory
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,

    #[serde(default = "default_ttl_days")]
    pub ttl_days: u64,
}

fn default_language() -> String {
    "en-US".to_string()
}

fn default_rate_limit_delay_ms() -> u64 {
    250
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_attempts() -> u32 {
    3
}

fn default_initial_backoff_ms() -> u64 {
    1000
}

fn default_cache_enabled() -> bool {
    true
}

fn default_ttl_days() -> u64 {
    30
}

impl Default for TmdbSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            language: default_language(),
            rate_limit_delay_ms: default_rate_limit_delay_ms(),
            timeout_secs: default_timeout_secs(),
            api_base_url: None,
            image_base_url: None,
        }
    }
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_backoff_ms: default_initial_backoff_ms(),
        }
    }
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            enabled: default_cache_enabled(),
            path: None,
            ttl_days: default_ttl_days(),
        }
    }
}

impl TmdbSettings {
    pub fn rate_limit_delay(&self) -> Duration {
        Duration::from_millis(self.rate_limit_delay_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn api_base_url(&self) -> &str {
        self.api_base_url.as_deref().unwrap_or(DEFAULT_API_BASE_URL)
    }

    pub fn image_base_url(&self) -> &str {
        self.image_base_url
            .as_deref()
            .unwrap_or(DEFAULT_IMAGE_BASE_URL)
    }
}

impl RetrySettings {
    pub fn initial_backoff(&self) -> Duration {
        Duration::from_millis(self.initial_backoff_ms)
    }
}

impl CacheSettings {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_days.saturating_mul(24 * 60 * 60))
    }
}

impl Config {
    /// Get the default config file path
    pub fn default_path() -> Result<PathBuf> {
        let home = dirs::home_dir().ok_or(ConfigError::Invalid(
            "Could not determine home directory".to_string(),
        ))?;

        Ok(home.join(".reelscan").join("config.yaml"))
    }

    /// Resolve an explicit path or fall back to the default location
    pub fn resolve_path(path: Option<&str>) -> Result<PathBuf> {
        match path {
            Some(p) => Ok(PathBuf::from(p)),
            None => Self::default_path(),
        }
    }

    /// Load configuration from an explicit path or the default location
    pub fn load_at(path: Option<&str>) -> Result<Self> {
        Self::load_from(&Self::resolve_path(path)?)
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.display().to_string()).into());
        }

        let contents = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&contents).map_err(ConfigError::from)?;

        Ok(config)
    }

    /// Check the settings the metadata client depends on
    pub fn validate(&self) -> Result<()> {
        match self.tmdb.api_key.as_deref() {
            None | Some("") => return Err(ConfigError::MissingApiKey.into()),
            Some(_) => {}
        }
        if self.tmdb.language.trim().is_empty() {
            return Err(ConfigError::Invalid("tmdb.language must not be empty".to_string()).into());
        }
        if self.tmdb.timeout_secs == 0 {
            return Err(
                ConfigError::Invalid("tmdb.timeout_secs must be at least 1".to_string()).into(),
            );
        }
        if self.retry.max_attempts == 0 {
            return Err(
                ConfigError::Invalid("retry.max_attempts must be at least 1".to_string()).into(),
            );
        }
        if self.cache.enabled && self.cache.ttl_days == 0 {
            return Err(
                ConfigError::Invalid("cache.ttl_days must be at least 1".to_string()).into(),
            );
        }
        Ok(())
    }
}
