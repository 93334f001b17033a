//! The cache engine: pre/post hooks around the quote round trip.
//!
//! [`QuoteCache`] owns all cache state for one configuration: the entry
//! store, the pending-request table, the volatility and usage trackers,
//! the warming queue and the counters. Nothing is process-global; two
//! caches never share state.
//!
//! # Request flow
//!
//! ```text
//! pre(request) ── not GET /quote ──────────────► Bypass
//!      │
//!      ├── valid entry in store ───────────────► Hit(response)
//!      ├── call for same fingerprint in flight ─► Join(PendingFlight)
//!      └── otherwise: register flight ─────────► Miss(Flight)
//!
//! post(flight, result) ─► clear pending marker, store 2xx with TTL,
//!                         feed volatility, wake joiners
//! ```
//!
//! Per fingerprint the lifecycle is `Absent → Pending → Cached(ttl) → Absent`.
//! A failed or abandoned flight goes straight back to `Absent`.
//!
//! # Locking
//!
//! State sits behind one `std::sync::Mutex`, held only for synchronous
//! bookkeeping and never across an `.await`. The pending-table check and
//! insert happen under a single acquisition, so at most one outbound call
//! per fingerprint is in flight.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, trace};

use super::config::CacheConfig;
use super::key::{Fingerprint, QuoteKey};
use super::metrics::{CacheMetrics, MetricsState};
use super::reclaim;
use super::store::EntryStore;
use super::ttl::TtlPolicy;
use super::usage::{UsageTracker, WARM_THRESHOLD, WarmingQueue};
use super::volatility::VolatilityTracker;
use crate::client::{ApiRequest, ApiResponse};
use crate::types::parse_amount;
use crate::{Result, telemetry};

type FlightResult = Option<Result<ApiResponse>>;

/// Decision taken by [`QuoteCache::pre`].
#[derive(Debug)]
pub enum Intercept {
    /// Not a cacheable request; forward it unmodified.
    Bypass,
    /// Served from the store; do not call the network.
    Hit(ApiResponse),
    /// Another caller is already fetching this quote; wait for it.
    Join(PendingFlight),
    /// Fetch it, then hand the result to [`QuoteCache::post`].
    Miss(Flight),
}

/// The caller's handle on an outbound call it must perform.
///
/// Dropping it without calling [`QuoteCache::post`] (e.g. the request future
/// was cancelled) clears the pending marker and releases any joiners, who
/// then retry on their own.
#[derive(Debug)]
pub struct Flight {
    fingerprint: Fingerprint,
    key: QuoteKey,
    id: u64,
    started: Instant,
    tx: watch::Sender<FlightResult>,
    owner: Weak<Inner>,
    done: bool,
}

impl Flight {
    pub fn fingerprint(&self) -> &Fingerprint {
        &self.fingerprint
    }
}

impl Drop for Flight {
    fn drop(&mut self) {
        if self.done {
            return;
        }
        if let Some(inner) = self.owner.upgrade() {
            let mut state = inner.lock();
            state.remove_pending(&self.fingerprint, self.id);
            debug!(fingerprint = %self.fingerprint, "flight abandoned before completion");
        }
    }
}

/// A joined in-flight call.
#[derive(Debug)]
pub struct PendingFlight {
    rx: watch::Receiver<FlightResult>,
    started: Instant,
}

impl PendingFlight {
    /// Wait for the shared result.
    ///
    /// `None` means the flight was abandoned; the caller should look up again.
    pub async fn wait(mut self) -> Option<Result<ApiResponse>> {
        let result = self.rx.wait_for(Option::is_some).await.ok()?;
        result.clone()
    }

    pub fn started(&self) -> Instant {
        self.started
    }
}

#[derive(Debug)]
struct PendingEntry {
    id: u64,
    rx: watch::Receiver<FlightResult>,
}

/// Mutable cache state, guarded by [`Inner::state`].
#[derive(Debug)]
pub(crate) struct CacheState {
    pub(crate) store: EntryStore,
    pending: HashMap<Fingerprint, PendingEntry>,
    next_flight: u64,
    pub(crate) volatility: VolatilityTracker,
    pub(crate) usage: UsageTracker,
    pub(crate) warming: WarmingQueue,
    metrics: MetricsState,
}

impl CacheState {
    fn new(capacity: usize) -> Self {
        Self {
            store: EntryStore::new(capacity),
            pending: HashMap::new(),
            next_flight: 0,
            volatility: VolatilityTracker::new(),
            usage: UsageTracker::new(),
            warming: WarmingQueue::new(),
            metrics: MetricsState::default(),
        }
    }

    #[cfg(test)]
    pub(crate) fn for_test(
        store: EntryStore,
        volatility: VolatilityTracker,
        usage: UsageTracker,
        warming: WarmingQueue,
    ) -> Self {
        Self {
            store,
            volatility,
            usage,
            warming,
            ..Self::new(0)
        }
    }

    fn remove_pending(&mut self, fingerprint: &Fingerprint, id: u64) {
        if self.pending.get(fingerprint).is_some_and(|p| p.id == id) {
            self.pending.remove(fingerprint);
        }
    }

    fn reset(&mut self) {
        self.store.clear();
        self.pending.clear();
        self.volatility.clear();
        self.usage.clear();
        self.warming.clear();
        self.metrics.reset();
    }
}

#[derive(Debug)]
pub(crate) struct Inner {
    config: CacheConfig,
    policy: TtlPolicy,
    state: Mutex<CacheState>,
    reclaimer: Mutex<Option<JoinHandle<()>>>,
    destroyed: AtomicBool,
}

impl Inner {
    pub(crate) fn lock(&self) -> MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn fire_warmup(&self, fingerprint: &Fingerprint) {
        let mut state = self.lock();
        if !state.store.contains(fingerprint, Instant::now()) {
            state.usage.bump_confidence(fingerprint);
            if self.config.enable_metrics {
                metrics::counter!(telemetry::CACHE_WARMUPS_TOTAL).increment(1);
            }
            debug!(%fingerprint, "hot quote absent at warm-up time");
        }
        state.warming.complete(fingerprint);
    }

    fn stop_reclaimer(&self) {
        let handle = self
            .reclaimer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            handle.abort();
            info!("quote cache reclaimer stopped");
        }
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        if let Some(handle) = self
            .reclaimer
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            handle.abort();
        }
    }
}

/// Response cache for `GET /quote`.
///
/// Cheap to clone; clones share state. Background work (reclaimer,
/// warm-up timers) stops on [`destroy()`](Self::destroy) or when the last
/// clone is dropped.
#[derive(Debug, Clone)]
pub struct QuoteCache {
    inner: Arc<Inner>,
}

impl QuoteCache {
    /// Validate `config` and create an empty cache.
    ///
    /// With adaptive TTL or predictive mode enabled, this also starts the
    /// background reclaimer on the current tokio runtime.
    pub fn new(config: CacheConfig) -> Result<Self> {
        config.validate()?;
        let inner = Arc::new(Inner {
            policy: TtlPolicy::new(&config),
            state: Mutex::new(CacheState::new(config.max_entries)),
            reclaimer: Mutex::new(None),
            destroyed: AtomicBool::new(false),
            config,
        });

        if inner.config.is_advanced() {
            let handle = reclaim::spawn(Arc::downgrade(&inner));
            *inner.reclaimer.lock().unwrap_or_else(PoisonError::into_inner) = handle;
        }

        Ok(Self { inner })
    }

    pub fn config(&self) -> &CacheConfig {
        &self.inner.config
    }

    /// Pre-request hook.
    pub fn pre(&self, request: &ApiRequest) -> Intercept {
        if !request.is_quote() || self.inner.destroyed.load(Ordering::Acquire) {
            return Intercept::Bypass;
        }
        let config = &self.inner.config;
        let now = Instant::now();
        let key = QuoteKey::from_query(&request.query);
        let fingerprint = key.fingerprint();

        let mut state = self.inner.lock();
        if config.enable_predictive {
            self.record_access(&mut state, &fingerprint, now);
        }

        if let Some(entry) = state.store.lookup(&fingerprint, now) {
            let value = entry.value.clone();
            if config.enable_metrics {
                state.metrics.request();
                state.metrics.hit();
                state.metrics.latency(now.elapsed());
                metrics::counter!(telemetry::CACHE_HITS_TOTAL, "source" => "store").increment(1);
                metrics::counter!(telemetry::CACHE_CALLS_SAVED_TOTAL).increment(1);
            }
            trace!(%fingerprint, "quote cache hit");
            return Intercept::Hit(value);
        }

        // joins are counted by `finish_join` once the shared result is known
        if let Some(pending) = state.pending.get(&fingerprint) {
            let rx = pending.rx.clone();
            trace!(%fingerprint, "joining in-flight quote request");
            return Intercept::Join(PendingFlight { rx, started: now });
        }

        if config.enable_metrics {
            state.metrics.request();
            state.metrics.miss();
            metrics::counter!(telemetry::CACHE_MISSES_TOTAL).increment(1);
        }
        let (tx, rx) = watch::channel(None);
        let id = state.next_flight;
        state.next_flight += 1;
        state
            .pending
            .insert(fingerprint.clone(), PendingEntry { id, rx });
        trace!(%fingerprint, "quote cache miss");

        Intercept::Miss(Flight {
            fingerprint,
            key,
            id,
            started: now,
            tx,
            owner: Arc::downgrade(&self.inner),
            done: false,
        })
    }

    /// Post-response hook.
    ///
    /// Stores successful responses and releases joiners with the same
    /// `result`. Never fails and never alters `result`.
    pub fn post(&self, mut flight: Flight, result: &Result<ApiResponse>) {
        flight.done = true;
        let config = &self.inner.config;
        let now = Instant::now();

        {
            let mut state = self.inner.lock();
            state.remove_pending(&flight.fingerprint, flight.id);

            if let Ok(response) = result
                && response.is_success()
                && !self.inner.destroyed.load(Ordering::Acquire)
            {
                let ttl = self
                    .inner
                    .policy
                    .ttl_for(&flight.key, state.volatility.history(&flight.fingerprint));
                let evicted =
                    state
                        .store
                        .store(flight.fingerprint.clone(), response.clone(), ttl, now);
                if let Some(evicted) = evicted {
                    trace!(fingerprint = %evicted, "evicted least recently used quote");
                    if config.enable_metrics {
                        metrics::counter!(telemetry::CACHE_EVICTIONS_TOTAL).increment(1);
                    }
                }

                if config.enable_adaptive_ttl {
                    match observed_out_amount(response) {
                        Some(amount) => {
                            state
                                .volatility
                                .record_observation(&flight.fingerprint, amount, now);
                        }
                        None => debug!(
                            fingerprint = %flight.fingerprint,
                            "no usable output amount in quote body, volatility not updated"
                        ),
                    }
                }
                debug!(
                    fingerprint = %flight.fingerprint,
                    ttl_ms = ttl.as_millis() as u64,
                    "stored quote"
                );
            }

            if config.enable_metrics {
                state.metrics.latency(now.saturating_duration_since(flight.started));
            }
        }

        flight.tx.send_replace(Some(result.clone()));
    }

    /// Account for a joined lookup whose flight delivered `result`.
    ///
    /// Only a successful shared call counts as a hit and a saved call; a
    /// shared failure counts as a request only. Abandoned joins are not
    /// reported here: they look up again through [`pre`](Self::pre).
    pub fn finish_join(&self, result: &Result<ApiResponse>, waited: Duration) {
        if !self.inner.config.enable_metrics {
            return;
        }
        let mut state = self.inner.lock();
        state.metrics.request();
        state.metrics.latency(waited);
        if result.is_ok() {
            state.metrics.hit();
            metrics::counter!(telemetry::CACHE_HITS_TOTAL, "source" => "inflight").increment(1);
            metrics::counter!(telemetry::CACHE_CALLS_SAVED_TOTAL).increment(1);
        }
    }

    /// Snapshot of the counters.
    pub fn metrics(&self) -> CacheMetrics {
        self.inner.lock().metrics.snapshot()
    }

    /// Number of stored entries (expired ones included until read).
    pub fn len(&self) -> usize {
        self.inner.lock().store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether a valid entry exists for `fingerprint`.
    pub fn contains(&self, fingerprint: &Fingerprint) -> bool {
        self.inner.lock().store.contains(fingerprint, Instant::now())
    }

    /// Usage count for `fingerprint` (predictive mode only).
    pub fn usage_count(&self, fingerprint: &Fingerprint) -> Option<u64> {
        self.inner.lock().usage.get(fingerprint).map(|p| p.count)
    }

    /// Whether a warm-up is scheduled for `fingerprint`.
    pub fn is_warming(&self, fingerprint: &Fingerprint) -> bool {
        self.inner.lock().warming.contains(fingerprint)
    }

    /// Current volatility estimate for `fingerprint`.
    pub fn volatility(&self, fingerprint: &Fingerprint) -> f64 {
        self.inner.lock().volatility.volatility(fingerprint)
    }

    /// Drop all entries, trackers, pending markers and warm-up timers and
    /// reset the counters. The cache stays usable.
    pub fn clear(&self) {
        self.inner.lock().reset();
        debug!("quote cache cleared");
    }

    /// [`clear()`](Self::clear) and stop all background work.
    ///
    /// Afterwards the cache passes every request through untouched.
    pub fn destroy(&self) {
        self.inner.destroyed.store(true, Ordering::Release);
        self.inner.stop_reclaimer();
        self.clear();
    }

    pub fn is_destroyed(&self) -> bool {
        self.inner.destroyed.load(Ordering::Acquire)
    }

    fn record_access(&self, state: &mut CacheState, fingerprint: &Fingerprint, now: Instant) {
        let count = state.usage.record_access(fingerprint, now);
        if count <= WARM_THRESHOLD || state.warming.contains(fingerprint) {
            return;
        }
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            return;
        };

        let weak = Arc::downgrade(&self.inner);
        let delay = self.inner.policy.default_ttl();
        let key = fingerprint.clone();
        let timer = runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            if let Some(inner) = weak.upgrade() {
                inner.fire_warmup(&key);
            }
        });
        let dropped = state.warming.schedule(fingerprint.clone(), timer);
        debug!(
            %fingerprint,
            count,
            dropped = dropped.len(),
            "scheduled warm-up for hot quote"
        );
    }
}

/// Output amount of a quote body, if it is a positive finite number.
fn observed_out_amount(response: &ApiResponse) -> Option<f64> {
    let body: serde_json::Value = response.json().ok()?;
    match body.get("outAmount")? {
        serde_json::Value::String(s) => parse_amount(s),
        serde_json::Value::Number(n) => n.as_f64().filter(|v| v.is_finite() && *v > 0.0),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CachePreset;
    use crate::types::QuoteRequest;

    fn quote_request(amount: u64) -> ApiRequest {
        ApiRequest::quote(&QuoteRequest::new("A", "B", amount))
    }

    fn quote_body(out: &str) -> ApiResponse {
        ApiResponse::json_ok(&serde_json::json!({ "outAmount": out }))
    }

    #[test]
    fn out_amount_parsing() {
        assert_eq!(observed_out_amount(&quote_body("42")), Some(42.0));
        assert_eq!(observed_out_amount(&quote_body("-1")), None);
        assert_eq!(
            observed_out_amount(&ApiResponse::json_ok(&serde_json::json!({ "outAmount": 7 }))),
            Some(7.0)
        );
        assert_eq!(observed_out_amount(&ApiResponse::new(200, "not json")), None);
    }

    #[tokio::test]
    async fn miss_post_then_hit() {
        let cache = QuoteCache::new(CacheConfig::default()).unwrap();
        let Intercept::Miss(flight) = cache.pre(&quote_request(1)) else {
            panic!("expected miss");
        };
        cache.post(flight, &Ok(quote_body("10")));

        assert!(matches!(cache.pre(&quote_request(1)), Intercept::Hit(_)));
        let m = cache.metrics();
        assert_eq!((m.requests, m.hits, m.misses, m.api_calls_saved), (2, 1, 1, 1));
    }

    #[tokio::test]
    async fn second_lookup_joins_pending() {
        let cache = QuoteCache::new(CacheConfig::default()).unwrap();
        let Intercept::Miss(flight) = cache.pre(&quote_request(1)) else {
            panic!("expected miss");
        };
        let Intercept::Join(pending) = cache.pre(&quote_request(1)) else {
            panic!("expected join");
        };
        // nothing counted for the joiner until its result is in
        assert_eq!(cache.metrics().requests, 1);
        cache.post(flight, &Ok(quote_body("10")));
        let result = pending.wait().await.unwrap();
        assert_eq!(result, Ok(quote_body("10")));
        cache.finish_join(&result, Duration::ZERO);
        let m = cache.metrics();
        assert_eq!((m.requests, m.hits, m.misses, m.api_calls_saved), (2, 1, 1, 1));
    }

    #[tokio::test]
    async fn failed_join_is_not_a_hit() {
        let cache = QuoteCache::new(CacheConfig::default()).unwrap();
        let Intercept::Miss(flight) = cache.pre(&quote_request(1)) else {
            panic!("expected miss");
        };
        let Intercept::Join(pending) = cache.pre(&quote_request(1)) else {
            panic!("expected join");
        };
        let failure = Err(crate::SwapQuoteError::Http("reset".into()));
        cache.post(flight, &failure);
        let result = pending.wait().await.unwrap();
        cache.finish_join(&result, Duration::ZERO);

        let m = cache.metrics();
        assert_eq!((m.requests, m.hits, m.misses, m.api_calls_saved), (2, 0, 1, 0));
    }

    #[tokio::test]
    async fn abandoned_flight_releases_joiners() {
        let cache = QuoteCache::new(CacheConfig::default()).unwrap();
        let Intercept::Miss(flight) = cache.pre(&quote_request(1)) else {
            panic!("expected miss");
        };
        let Intercept::Join(pending) = cache.pre(&quote_request(1)) else {
            panic!("expected join");
        };
        drop(flight);
        assert_eq!(pending.wait().await, None);
        // back to Absent: the next lookup is a fresh miss
        assert!(matches!(cache.pre(&quote_request(1)), Intercept::Miss(_)));
    }

    #[tokio::test]
    async fn non_success_is_not_stored() {
        let cache = QuoteCache::new(CacheConfig::default()).unwrap();
        let Intercept::Miss(flight) = cache.pre(&quote_request(1)) else {
            panic!("expected miss");
        };
        cache.post(flight, &Ok(ApiResponse::new(500, "boom")));
        assert!(cache.is_empty());
        assert!(matches!(cache.pre(&quote_request(1)), Intercept::Miss(_)));
    }

    #[tokio::test]
    async fn metrics_disabled_counts_nothing() {
        let cache = QuoteCache::new(CacheConfig::new().enable_metrics(false)).unwrap();
        if let Intercept::Miss(flight) = cache.pre(&quote_request(1)) {
            cache.post(flight, &Ok(quote_body("1")));
        }
        cache.pre(&quote_request(1));
        assert_eq!(cache.metrics(), CacheMetrics::default());
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn adaptive_mode_feeds_volatility() {
        let cache = QuoteCache::new(CacheConfig::preset(CachePreset::Adaptive)).unwrap();
        for out in ["100", "150", "90"] {
            // force a miss each round
            cache.inner.lock().store.clear();
            if let Intercept::Miss(flight) = cache.pre(&quote_request(1)) {
                cache.post(flight, &Ok(quote_body(out)));
            }
        }
        let fp = Fingerprint::from_query(&quote_request(1).query);
        assert!(cache.volatility(&fp) > 0.05);
        cache.destroy();
    }
}
