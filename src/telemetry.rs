//! Telemetry metric name constants.
//!
//! Centralised metric names for swapquote operations. Consumers install
//! their own `metrics` recorder (e.g. prometheus, statsd); without a
//! recorder installed, all metric calls are no-ops.
//!
//! These are independent of [`CacheMetrics`](crate::cache::CacheMetrics),
//! the in-process snapshot returned by the cache itself.
//!
//! # Metric naming conventions
//!
//! All metrics are prefixed with `swapquote_`. Counters end in `_total`,
//! histograms use meaningful units (e.g. `_seconds`).
//!
//! # Common labels
//!
//! - `endpoint`: API path (e.g. "/quote", "/program-id-to-label")
//! - `status`: outcome: "ok" or "error"
//! - `source`: how a cache hit was served: "store" or "inflight"

/// Total requests sent through [`HttpQuoteClient`](crate::client::HttpQuoteClient).
///
/// Labels: `endpoint`, `status` ("ok" | "error").
pub const REQUESTS_TOTAL: &str = "swapquote_requests_total";

/// Request duration in seconds, measured at the transport.
///
/// Labels: `endpoint`.
pub const REQUEST_DURATION_SECONDS: &str = "swapquote_request_duration_seconds";

/// Total quote lookups answered without a new outbound call.
///
/// Labels: `source` ("store" | "inflight").
pub const CACHE_HITS_TOTAL: &str = "swapquote_cache_hits_total";

/// Total quote lookups that issued an outbound call.
pub const CACHE_MISSES_TOTAL: &str = "swapquote_cache_misses_total";

/// Total outbound calls avoided (hits plus de-duplicated joins).
pub const CACHE_CALLS_SAVED_TOTAL: &str = "swapquote_cache_calls_saved_total";

/// Total entries evicted from the entry store under capacity pressure.
pub const CACHE_EVICTIONS_TOTAL: &str = "swapquote_cache_evictions_total";

/// Total warm-up timers that fired for a fingerprint absent from the store.
pub const CACHE_WARMUPS_TOTAL: &str = "swapquote_cache_warmups_total";
