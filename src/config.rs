//! Configuration file parser for ~/.config/meti-news/config.toml.
//!
//! The config file is optional; a missing file yields `Config::default()`.
//! Unknown keys are ignored by serde but logged as a warning.
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use crate::feed::{FetchSettings, DEFAULT_USER_AGENT};
use crate::news::{FilterMode, ServiceSettings, OFFICIAL_FEED_URL, SEARCH_FEED_URL};

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML in config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// Config file exceeds maximum allowed size.
    #[error("Config file too large: {0}")]
    TooLarge(String),
}

// ============================================================================
// Configuration Structs
// ============================================================================

/// Top-level application configuration.
///
/// All fields use `#[serde(default)]` so any subset of keys can be specified.
/// Missing keys fall back to `Default::default()`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Official press release feed.
    pub official_feed_url: String,

    /// News search endpoint; `q`, `hl`, `gl` and `ceid` are appended.
    pub search_feed_url: String,

    /// Search text used when `--query` is not given.
    pub default_query: String,

    /// Filter used when `--filter` is not given.
    pub default_filter: FilterMode,

    /// Minutes a fetch outcome stays cached.
    pub cache_ttl_minutes: u64,

    /// Distinct source/query combinations kept in the cache.
    pub cache_capacity: usize,

    pub connect_timeout_secs: u64,

    pub read_timeout_secs: u64,

    /// User-Agent header sent with feed requests.
    pub user_agent: String,

    /// Summaries longer than this many characters are cut with "...".
    pub summary_max_chars: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            official_feed_url: OFFICIAL_FEED_URL.to_string(),
            search_feed_url: SEARCH_FEED_URL.to_string(),
            default_query: "経済産業省".to_string(),
            default_filter: FilterMode::All,
            cache_ttl_minutes: 10,
            cache_capacity: 64,
            connect_timeout_secs: 5,
            read_timeout_secs: 15,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            summary_max_chars: 200,
        }
    }
}

impl Config {
    /// Maximum config file size (1 MB).
    const MAX_FILE_SIZE: u64 = 1_048_576;

    /// Load configuration from a TOML file.
    ///
    /// - Missing file → `Ok(Config::default())`
    /// - Empty file → `Ok(Config::default())`
    /// - Invalid TOML → `Err(ConfigError::Parse)` with line number info
    /// - Unknown keys → silently accepted (serde default behavior), logged as warning
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::metadata(path) {
            Ok(meta) if meta.len() > Self::MAX_FILE_SIZE => {
                return Err(ConfigError::TooLarge(format!(
                    "Config file is {} bytes (max {} bytes)",
                    meta.len(),
                    Self::MAX_FILE_SIZE
                )));
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file found, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
            Ok(_) => {}
        }

        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                // File deleted between metadata and read
                tracing::debug!(path = %path.display(), "Config file disappeared, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
        };

        if content.trim().is_empty() {
            tracing::debug!(path = %path.display(), "Config file is empty, using defaults");
            return Ok(Self::default());
        }

        if let Ok(raw) = content.parse::<toml::Table>() {
            let known_keys = [
                "official_feed_url",
                "search_feed_url",
                "default_query",
                "default_filter",
                "cache_ttl_minutes",
                "cache_capacity",
                "connect_timeout_secs",
                "read_timeout_secs",
                "user_agent",
                "summary_max_chars",
            ];
            for key in raw.keys() {
                if !known_keys.contains(&key.as_str()) {
                    tracing::warn!(key = %key, "Unknown key in config file, ignoring");
                }
            }
        }

        let config: Config = toml::from_str(&content)?;
        tracing::info!(
            path = %path.display(),
            filter = ?config.default_filter,
            ttl_minutes = config.cache_ttl_minutes,
            "Loaded configuration"
        );
        Ok(config)
    }

    pub fn fetch_settings(&self) -> FetchSettings {
        FetchSettings {
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            read_timeout: Duration::from_secs(self.read_timeout_secs),
            user_agent: self.user_agent.clone(),
        }
    }

    pub fn service_settings(&self) -> ServiceSettings {
        ServiceSettings {
            official_feed_url: self.official_feed_url.clone(),
            search_feed_url: self.search_feed_url.clone(),
            cache_ttl: Duration::from_secs(self.cache_ttl_minutes.saturating_mul(60)),
            cache_capacity: self.cache_capacity,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
