//! Cache configuration, presets and validation.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{Result, SwapQuoteError};

/// Bounds on `max_entries` enforced in advanced mode.
pub const MIN_ENTRIES: usize = 1;
pub const MAX_ENTRIES: usize = 10_000;

/// Configuration for the quote cache.
///
/// Pass to [`QuoteCache::new()`](super::QuoteCache::new) or
/// [`CachingQuoteClient::new()`](crate::client::CachingQuoteClient::new).
///
/// ```rust
/// # use swapquote::cache::CacheConfig;
/// # use std::time::Duration;
/// let config = CacheConfig::new()
///     .max_entries(500)
///     .default_ttl(Duration::from_secs(20))
///     .enable_adaptive_ttl(true);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct CacheConfig {
    /// Maximum number of stored responses. Default: 1,000.
    pub max_entries: usize,
    /// TTL before popularity/volatility adjustments. Default: 30s.
    pub default_ttl: Duration,
    /// Lower TTL bound. Default: 5s.
    pub min_ttl: Duration,
    /// Upper TTL bound. Default: 5 minutes.
    pub max_ttl: Duration,
    /// Adjust TTL from observed price volatility. Default: false.
    pub enable_adaptive_ttl: bool,
    /// Track usage and schedule warm-ups for hot quotes. Default: false.
    pub enable_predictive: bool,
    /// Maintain hit/miss counters. Default: true.
    pub enable_metrics: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: 1_000,
            default_ttl: Duration::from_secs(30),
            min_ttl: Duration::from_secs(5),
            max_ttl: Duration::from_secs(300),
            enable_adaptive_ttl: false,
            enable_predictive: false,
            enable_metrics: true,
        }
    }
}

impl CacheConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Configuration bundled under a named preset.
    pub fn preset(preset: CachePreset) -> Self {
        let secs = Duration::from_secs;
        let base = Self::default();
        match preset {
            CachePreset::Conservative => Self {
                max_entries: 100,
                default_ttl: secs(10),
                min_ttl: secs(5),
                max_ttl: secs(30),
                ..base
            },
            CachePreset::Balanced => Self {
                max_entries: 500,
                default_ttl: secs(30),
                min_ttl: secs(10),
                max_ttl: secs(60),
                ..base
            },
            CachePreset::Aggressive => Self {
                max_entries: 2_000,
                default_ttl: secs(60),
                min_ttl: secs(30),
                max_ttl: secs(300),
                ..base
            },
            CachePreset::Adaptive => Self {
                max_entries: 1_000,
                default_ttl: secs(30),
                min_ttl: secs(5),
                max_ttl: secs(120),
                enable_adaptive_ttl: true,
                ..base
            },
            CachePreset::Predictive => Self {
                max_entries: 1_000,
                default_ttl: secs(30),
                min_ttl: secs(5),
                max_ttl: secs(120),
                enable_adaptive_ttl: true,
                enable_predictive: true,
                ..base
            },
        }
    }

    pub fn max_entries(mut self, n: usize) -> Self {
        self.max_entries = n;
        self
    }

    pub fn default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = ttl;
        self
    }

    pub fn min_ttl(mut self, ttl: Duration) -> Self {
        self.min_ttl = ttl;
        self
    }

    pub fn max_ttl(mut self, ttl: Duration) -> Self {
        self.max_ttl = ttl;
        self
    }

    pub fn enable_adaptive_ttl(mut self, enabled: bool) -> Self {
        self.enable_adaptive_ttl = enabled;
        self
    }

    pub fn enable_predictive(mut self, enabled: bool) -> Self {
        self.enable_predictive = enabled;
        self
    }

    pub fn enable_metrics(mut self, enabled: bool) -> Self {
        self.enable_metrics = enabled;
        self
    }

    /// Whether adaptive TTL or predictive warm-up is requested.
    pub fn is_advanced(&self) -> bool {
        self.enable_adaptive_ttl || self.enable_predictive
    }

    /// Check the configuration.
    ///
    /// Basic mode accepts anything. Advanced mode requires
    /// `min_ttl < max_ttl`, `default_ttl` within `[min_ttl, max_ttl]` and
    /// `max_entries` within `[1, 10000]`.
    pub fn validate(&self) -> Result<()> {
        if !self.is_advanced() {
            return Ok(());
        }
        if self.min_ttl >= self.max_ttl {
            return Err(SwapQuoteError::Configuration(format!(
                "min_ttl ({}s) must be less than max_ttl ({}s)",
                self.min_ttl.as_secs_f64(),
                self.max_ttl.as_secs_f64()
            )));
        }
        if self.default_ttl < self.min_ttl || self.default_ttl > self.max_ttl {
            return Err(SwapQuoteError::Configuration(format!(
                "default_ttl ({}s) must be within [{}s, {}s]",
                self.default_ttl.as_secs_f64(),
                self.min_ttl.as_secs_f64(),
                self.max_ttl.as_secs_f64()
            )));
        }
        if !(MIN_ENTRIES..=MAX_ENTRIES).contains(&self.max_entries) {
            return Err(SwapQuoteError::Configuration(format!(
                "max_entries ({}) must be within [{MIN_ENTRIES}, {MAX_ENTRIES}]",
                self.max_entries
            )));
        }
        Ok(())
    }
}

/// Named bundles of cache options for common risk appetites.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CachePreset {
    /// Short TTLs, small store.
    Conservative,
    #[default]
    Balanced,
    /// Long TTLs, large store.
    Aggressive,
    /// Volatility-aware TTL.
    Adaptive,
    /// Adaptive TTL plus usage tracking and warm-up scheduling.
    Predictive,
}

impl CachePreset {
    pub const ALL: [CachePreset; 5] = [
        CachePreset::Conservative,
        CachePreset::Balanced,
        CachePreset::Aggressive,
        CachePreset::Adaptive,
        CachePreset::Predictive,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Conservative => "conservative",
            Self::Balanced => "balanced",
            Self::Aggressive => "aggressive",
            Self::Adaptive => "adaptive",
            Self::Predictive => "predictive",
        }
    }
}

impl fmt::Display for CachePreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CachePreset {
    type Err = SwapQuoteError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| SwapQuoteError::InvalidInput(format!("unknown cache preset '{s}'")))
    }
}

impl From<CachePreset> for CacheConfig {
    fn from(preset: CachePreset) -> Self {
        CacheConfig::preset(preset)
    }
}
