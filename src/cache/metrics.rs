//! In-process cache effectiveness counters.

use std::time::Duration;

use serde::Serialize;

/// Point-in-time copy of the cache counters.
///
/// Returned by value from [`QuoteCache::metrics()`](super::QuoteCache::metrics);
/// later activity does not change a snapshot already taken.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct CacheMetrics {
    /// Quote lookups seen by the cache.
    pub requests: u64,
    /// Lookups served from the store or by joining an in-flight call.
    pub hits: u64,
    /// Lookups that issued an outbound call.
    pub misses: u64,
    /// Outbound calls avoided.
    pub api_calls_saved: u64,
    /// Mean time to answer a lookup, hits and misses alike.
    pub avg_response_time: Duration,
}

impl CacheMetrics {
    pub fn hit_ratio(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Mutable counters behind the engine lock.
#[derive(Debug, Default)]
pub(crate) struct MetricsState {
    requests: u64,
    hits: u64,
    misses: u64,
    api_calls_saved: u64,
    latency_total: Duration,
    latency_samples: u32,
}

impl MetricsState {
    pub(crate) fn request(&mut self) {
        self.requests += 1;
    }

    /// A lookup answered without an outbound call.
    pub(crate) fn hit(&mut self) {
        self.hits += 1;
        self.api_calls_saved += 1;
    }

    pub(crate) fn miss(&mut self) {
        self.misses += 1;
    }

    pub(crate) fn latency(&mut self, elapsed: Duration) {
        self.latency_total = self.latency_total.saturating_add(elapsed);
        self.latency_samples = self.latency_samples.saturating_add(1);
    }

    pub(crate) fn snapshot(&self) -> CacheMetrics {
        let avg_response_time = if self.latency_samples == 0 {
            Duration::ZERO
        } else {
            self.latency_total / self.latency_samples
        };
        CacheMetrics {
            requests: self.requests,
            hits: self.hits,
            misses: self.misses,
            api_calls_saved: self.api_calls_saved,
            avg_response_time,
        }
    }

    pub(crate) fn reset(&mut self) {
        *self = Self::default();
    }
}
