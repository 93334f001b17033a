//! Per-entry TTL selection.
//!
//! 1. Start from the configured default TTL, or from
//!    [`POPULAR_BASELINE_TTL`] when either mint is in [`POPULAR_MINTS`].
//! 2. In adaptive mode, with at least two observed prices: volatility above
//!    [`HIGH_VOLATILITY`] shrinks the TTL to 30%, volatility below
//!    [`LOW_VOLATILITY`] doubles it.
//! 3. Clamp to `[min_ttl, max_ttl]`.
//!
//! The result depends only on the key, the price history and the config.

use std::time::Duration;

use tracing::trace;

use super::config::CacheConfig;
use super::key::QuoteKey;
use super::volatility::PriceHistory;

/// Mints whose quotes are requested often enough to deserve a longer
/// baseline: wrapped SOL, USDC, USDT.
pub const POPULAR_MINTS: [&str; 3] = [
    "So11111111111111111111111111111111111111112",
    "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v",
    "Es9vMFrzaCERmJfrF4H2FYD4KCoNkY11McCe8BenwNYB",
];

/// Starting TTL for quotes touching a popular mint.
pub const POPULAR_BASELINE_TTL: Duration = Duration::from_secs(60);

/// Relative swing above which prices count as volatile (5%).
pub const HIGH_VOLATILITY: f64 = 0.05;

/// Relative swing below which prices count as stable (1%).
pub const LOW_VOLATILITY: f64 = 0.01;

const HIGH_VOLATILITY_FACTOR: f64 = 0.3;
const LOW_VOLATILITY_FACTOR: f64 = 2.0;

/// Whether `mint` is on the popularity list.
pub fn is_popular(mint: &str) -> bool {
    POPULAR_MINTS.contains(&mint)
}

/// TTL rules derived from a [`CacheConfig`].
#[derive(Debug, Clone)]
pub struct TtlPolicy {
    default_ttl: Duration,
    min_ttl: Duration,
    max_ttl: Duration,
    adaptive: bool,
}

impl TtlPolicy {
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            default_ttl: config.default_ttl,
            min_ttl: config.min_ttl,
            max_ttl: config.max_ttl,
            adaptive: config.enable_adaptive_ttl,
        }
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Pick the TTL for a quote with the given key and price history.
    pub fn ttl_for(&self, key: &QuoteKey, history: Option<&PriceHistory>) -> Duration {
        let popular = [&key.input_mint, &key.output_mint]
            .into_iter()
            .flatten()
            .any(|mint| is_popular(mint));
        let mut ttl = if popular {
            POPULAR_BASELINE_TTL
        } else {
            self.default_ttl
        };

        if self.adaptive
            && let Some(history) = history.filter(|h| h.len() >= 2)
        {
            let volatility = history.volatility();
            if volatility > HIGH_VOLATILITY {
                ttl = scale(ttl, HIGH_VOLATILITY_FACTOR);
            } else if volatility < LOW_VOLATILITY {
                ttl = scale(ttl, LOW_VOLATILITY_FACTOR);
            }
            trace!(volatility, ttl_ms = ttl.as_millis() as u64, "volatility-adjusted ttl");
        }

        self.clamp(ttl)
    }

    // Basic mode does not validate bounds, so an inverted range must not
    // panic the way `Ord::clamp` would.
    fn clamp(&self, ttl: Duration) -> Duration {
        ttl.max(self.min_ttl).min(self.max_ttl)
    }
}

/// `ttl * factor`, saturating at `Duration::MAX` instead of panicking
/// like `Duration::mul_f64`.
fn scale(ttl: Duration, factor: f64) -> Duration {
    Duration::try_from_secs_f64(ttl.as_secs_f64() * factor).unwrap_or(Duration::MAX)
}
