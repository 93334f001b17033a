//! File configuration for the `swapquote` binary and embedding applications.
//!
//! Resolution order:
//! 1. `--config <path>` (must exist)
//! 2. `~/.swapquote/config.toml`
//! 3. built-in defaults
//!
//! The API key is never read from the file; it comes from
//! `SWAPQUOTE_API_KEY`.
//!
//! ```toml
//! [client]
//! base_url = "https://quote-api.jup.ag/v6"
//! timeout_secs = 10
//!
//! [cache]
//! preset = "adaptive"
//! max_entries = 250
//! min_ttl_secs = 5
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::cache::{CacheConfig, CachePreset};
use crate::client::{DEFAULT_BASE_URL, HttpQuoteClient};
use crate::{Result, SwapQuoteError};

/// Environment variable holding the API key.
pub const API_KEY_ENV: &str = "SWAPQUOTE_API_KEY";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub client: ClientConfig,
    #[serde(default)]
    pub cache: CacheSection,
}

/// HTTP client settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClientConfig {
    /// Quote API base URL (default: the public endpoint).
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Request timeout in seconds (default: 30).
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout(),
        }
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_timeout() -> u64 {
    30
}

/// Cache settings: a preset, optionally overridden field by field.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CacheSection {
    #[serde(default)]
    pub preset: CachePreset,
    pub max_entries: Option<usize>,
    pub default_ttl_secs: Option<u64>,
    pub min_ttl_secs: Option<u64>,
    pub max_ttl_secs: Option<u64>,
    pub enable_adaptive_ttl: Option<bool>,
    pub enable_predictive: Option<bool>,
    pub enable_metrics: Option<bool>,
}

impl CacheSection {
    /// The preset's configuration with explicit fields applied on top.
    ///
    /// Not validated here; the cache validates on construction.
    pub fn to_cache_config(&self) -> CacheConfig {
        let mut config = CacheConfig::preset(self.preset);
        if let Some(n) = self.max_entries {
            config.max_entries = n;
        }
        if let Some(secs) = self.default_ttl_secs {
            config.default_ttl = Duration::from_secs(secs);
        }
        if let Some(secs) = self.min_ttl_secs {
            config.min_ttl = Duration::from_secs(secs);
        }
        if let Some(secs) = self.max_ttl_secs {
            config.max_ttl = Duration::from_secs(secs);
        }
        if let Some(on) = self.enable_adaptive_ttl {
            config.enable_adaptive_ttl = on;
        }
        if let Some(on) = self.enable_predictive {
            config.enable_predictive = on;
        }
        if let Some(on) = self.enable_metrics {
            config.enable_metrics = on;
        }
        config
    }
}

impl Config {
    /// Load configuration from the standard locations.
    ///
    /// An explicit path that does not exist is an error; a missing user
    /// config falls back to defaults.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        match Self::resolve_config_path(explicit_path)? {
            Some(path) => Self::load_from_file(&path),
            None => Ok(Self::default()),
        }
    }

    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            SwapQuoteError::Configuration(format!("failed to read config file {path:?}: {e}"))
        })?;
        Self::parse(&content).map_err(|e| match e {
            SwapQuoteError::Configuration(msg) => {
                SwapQuoteError::Configuration(format!("{path:?}: {msg}"))
            }
            other => other,
        })
    }

    /// Parse TOML text and check the base URL.
    pub fn parse(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)
            .map_err(|e| SwapQuoteError::Configuration(format!("invalid config: {e}")))?;
        url::Url::parse(&config.client.base_url).map_err(|e| {
            SwapQuoteError::Configuration(format!(
                "invalid base_url '{}': {e}",
                config.client.base_url
            ))
        })?;
        Ok(config)
    }

    fn resolve_config_path(explicit: Option<&Path>) -> Result<Option<PathBuf>> {
        if let Some(path) = explicit {
            if path.exists() {
                return Ok(Some(path.to_path_buf()));
            }
            return Err(SwapQuoteError::Configuration(format!(
                "config file not found: {path:?}"
            )));
        }

        Ok(dirs::home_dir()
            .map(|home| home.join(".swapquote").join("config.toml"))
            .filter(|path| path.exists()))
    }

    /// HTTP client for `[client]`, with the API key from the environment.
    pub fn http_client(&self) -> Result<HttpQuoteClient> {
        let client = HttpQuoteClient::with_timeout(
            self.client.base_url.clone(),
            Duration::from_secs(self.client.timeout_secs),
        )?;
        Ok(match std::env::var(API_KEY_ENV) {
            Ok(key) if !key.trim().is_empty() => client.api_key(key.trim()),
            _ => client,
        })
    }

    pub fn cache_config(&self) -> CacheConfig {
        self.cache.to_cache_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!(config.client.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.client.timeout_secs, 30);
        assert_eq!(config.cache_config(), CacheConfig::preset(CachePreset::Balanced));
    }

    #[test]
    fn explicit_fields_override_preset() {
        let config = Config::parse(
            r#"
            [cache]
            preset = "aggressive"
            max_entries = 42
            min_ttl_secs = 1
        "#,
        )
        .unwrap();
        let cache = config.cache_config();
        assert_eq!(cache.max_entries, 42);
        assert_eq!(cache.min_ttl, Duration::from_secs(1));
        assert_eq!(cache.default_ttl, Duration::from_secs(60));
    }

    #[test]
    fn unknown_preset_is_rejected() {
        let err = Config::parse("[cache]\npreset = \"yolo\"").unwrap_err();
        assert!(matches!(err, SwapQuoteError::Configuration(_)));
    }

    #[test]
    fn bad_base_url_is_rejected() {
        let err = Config::parse("[client]\nbase_url = \"not a url\"").unwrap_err();
        assert!(err.to_string().contains("base_url"));
    }

    #[test]
    fn missing_explicit_path_is_an_error() {
        let err = Config::load(Some(Path::new("/nonexistent/swapquote.toml"))).unwrap_err();
        assert!(err.to_string().contains("not found"));
    }
}
