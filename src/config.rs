//! Configuration file parser for `tales.toml`.
//!
//! The config file is optional: a missing file yields `Config::default()`.
//! Missing keys take their defaults. Unknown top-level and `[feed]` keys are
//! logged as warnings by [`Config::from_toml_str`] and otherwise ignored.
//!
//! Environment variables override file values:
//!
//! | Variable | Field |
//! |---|---|
//! | `TALES_FEED_URL` | `feed.url` |
//! | `TALES_DATABASE_PATH` | `database_path` |
//! | `TALES_BIND_ADDRESS` | `bind_address` |
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

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

    /// A value parsed but is not usable.
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

// ============================================================================
// Configuration Structs
// ============================================================================

/// Default podcast feed ingested by the service.
pub const DEFAULT_FEED_URL: &str = "https://anchor.fm/s/2d3bd0d0/podcast/rss";

/// Top-level application configuration.
///
/// All fields use `#[serde(default)]` so any subset of keys can be specified.
/// Missing keys fall back to `Default::default()`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Name reported by the health endpoint.
    pub app_name: String,

    /// Socket address the HTTP server listens on.
    pub bind_address: String,

    /// SQLite database file. `:memory:` keeps everything in process.
    pub database_path: String,

    /// Allowed CORS origins. Empty allows any origin.
    pub cors_origins: Vec<String>,

    /// Upstream feed settings.
    pub feed: FeedConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            app_name: "Ubuntu Tales API".to_string(),
            bind_address: "0.0.0.0:8001".to_string(),
            database_path: "tales.db".to_string(),
            cors_origins: Vec::new(),
            feed: FeedConfig::default(),
        }
    }
}

/// Where and how the episode feed is fetched.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    /// RSS feed URL.
    pub url: String,

    /// Whole-request timeout in seconds (connect, headers and body).
    pub timeout_secs: u64,

    /// Maximum accepted response body size in bytes.
    pub max_bytes: usize,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_FEED_URL.to_string(),
            timeout_secs: 10,
            max_bytes: 10 * 1024 * 1024, // 10MB
        }
    }
}

impl FeedConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
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
    /// - Unknown keys → logged as a warning and ignored
    ///
    /// The result is not validated; call [`Config::validate`] after applying
    /// overrides.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        // Check file size before reading to prevent memory exhaustion
        // from a maliciously large or corrupted config file.
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
            Ok(_) => {} // Size is within limits, proceed
        }

        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                // Race condition: file deleted between metadata and read
                tracing::debug!(path = %path.display(), "Config file disappeared, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
        };

        let config = Self::from_toml_str(&content)?;
        tracing::info!(path = %path.display(), feed = %config.feed.url, "Loaded configuration");
        Ok(config)
    }

    /// Parse configuration from TOML text, warning on unknown keys.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        // Parse the TOML content first as a raw table to detect unknown keys
        if let Ok(raw) = content.parse::<toml::Table>() {
            const KNOWN_KEYS: [&str; 5] = [
                "app_name",
                "bind_address",
                "database_path",
                "cors_origins",
                "feed",
            ];
            const KNOWN_FEED_KEYS: [&str; 3] = ["url", "timeout_secs", "max_bytes"];

            for (key, value) in &raw {
                if !KNOWN_KEYS.contains(&key.as_str()) {
                    tracing::warn!(key = %key, "Unknown key in config file, ignoring");
                } else if key == "feed" {
                    let Some(feed) = value.as_table() else {
                        continue;
                    };
                    for feed_key in feed.keys() {
                        if !KNOWN_FEED_KEYS.contains(&feed_key.as_str()) {
                            tracing::warn!(key = %format!("feed.{}", feed_key), "Unknown key in config file, ignoring");
                        }
                    }
                }
            }
        }

        Ok(toml::from_str(content)?)
    }

    /// Apply environment overrides. Environment values take precedence over
    /// the config file.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary key lookup (the environment in
    /// production). Empty values are ignored.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = get("TALES_FEED_URL") {
            self.feed.url = url;
        }
        if let Some(path) = get("TALES_DATABASE_PATH") {
            self.database_path = path;
        }
        if let Some(addr) = get("TALES_BIND_ADDRESS") {
            self.bind_address = addr;
        }
        self
    }

    /// Check that values are usable before starting the service.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let feed_url = url::Url::parse(&self.feed.url)
            .map_err(|e| ConfigError::Invalid(format!("feed.url '{}': {}", self.feed.url, e)))?;
        if !matches!(feed_url.scheme(), "http" | "https") {
            return Err(ConfigError::Invalid(format!(
                "feed.url must use http or https, got '{}'",
                feed_url.scheme()
            )));
        }
        if self.feed.timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "feed.timeout_secs must be greater than zero".to_string(),
            ));
        }
        if self.feed.max_bytes == 0 {
            return Err(ConfigError::Invalid(
                "feed.max_bytes must be greater than zero".to_string(),
            ));
        }
        self.socket_addr()?;
        if self.database_path.trim().is_empty() {
            return Err(ConfigError::Invalid("database_path must not be empty".to_string()));
        }
        Ok(())
    }

    /// The bind address parsed as a socket address.
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.bind_address.parse().map_err(|e| {
            ConfigError::Invalid(format!("bind_address '{}': {}", self.bind_address, e))
        })
    }
}

// ============================================================================
// Tests
// ============================================================================
