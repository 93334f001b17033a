//! Quote response caching.
//!
//! [`QuoteCache`] intercepts `GET /quote` round trips through a pre hook
//! (store lookup, in-flight de-duplication) and a post hook (store the
//! response, feed the volatility tracker). Everything else passes through.
//!
//! The building blocks are usable on their own:
//!
//! - [`Fingerprint`] / [`QuoteKey`]: canonical request identity.
//! - [`EntryStore`]: bounded LRU store with per-entry TTL and lazy expiry.
//! - [`TtlPolicy`]: popularity and volatility based TTL selection.
//! - [`VolatilityTracker`]: rolling output-amount histories.
//! - [`UsageTracker`] / [`WarmingQueue`]: hot-quote detection for
//!   predictive mode.
//!
//! Most callers want [`CachingQuoteClient`](crate::client::CachingQuoteClient),
//! which wires the hooks around any [`QuoteApi`](crate::client::QuoteApi).

pub mod config;
pub mod key;
mod metrics;
mod middleware;
pub mod reclaim;
pub mod store;
pub mod ttl;
pub mod usage;
pub mod volatility;

pub use config::{CacheConfig, CachePreset, MAX_ENTRIES, MIN_ENTRIES};
pub use key::{Fingerprint, QuoteKey};
pub use metrics::CacheMetrics;
pub use middleware::{Flight, Intercept, PendingFlight, QuoteCache};
pub use reclaim::ReclaimReport;
pub use store::{CacheEntry, EntryStore};
pub use ttl::{TtlPolicy, is_popular};
pub use usage::{UsagePattern, UsageTracker, WARM_THRESHOLD, WARMING_QUEUE_CAPACITY, WarmingQueue};
pub use volatility::{HISTORY_LEN, PriceHistory, VolatilityTracker, volatility};
