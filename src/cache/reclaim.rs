//! Periodic sweep bounding the tracker maps and the warming queue.
//!
//! Runs only when adaptive TTL or predictive mode is enabled. Every
//! [`RECLAIM_INTERVAL`]:
//!
//! - usage patterns idle for more than [`USAGE_MAX_IDLE`] are dropped;
//! - price histories and usage patterns beyond [`TRACKER_HIGH_WATER`] are
//!   trimmed to the [`TRACKER_LOW_WATER`] most recently used;
//! - expired store entries are released instead of waiting for a read.
//!
//! The task holds only a `Weak` reference to the cache, so it ends on its
//! own once the cache is dropped; `destroy()` aborts it right away.

use std::sync::Weak;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use super::middleware::{CacheState, Inner};
use super::usage::WARMING_QUEUE_CAPACITY;

pub const RECLAIM_INTERVAL: Duration = Duration::from_secs(5 * 60);
pub const USAGE_MAX_IDLE: Duration = Duration::from_secs(60 * 60);
pub const TRACKER_HIGH_WATER: usize = 1_000;
pub const TRACKER_LOW_WATER: usize = 500;

/// What one sweep removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReclaimReport {
    pub stale_usage: usize,
    pub trimmed_usage: usize,
    pub trimmed_histories: usize,
    pub trimmed_warmups: usize,
    pub expired_entries: usize,
}

impl ReclaimReport {
    pub fn total(&self) -> usize {
        self.stale_usage
            + self.trimmed_usage
            + self.trimmed_histories
            + self.trimmed_warmups
            + self.expired_entries
    }
}

/// Run one sweep over `state`.
pub(crate) fn sweep(state: &mut CacheState, now: Instant) -> ReclaimReport {
    ReclaimReport {
        stale_usage: state.usage.purge_stale(now, USAGE_MAX_IDLE),
        trimmed_usage: state.usage.trim(TRACKER_HIGH_WATER, TRACKER_LOW_WATER),
        trimmed_histories: state
            .volatility
            .trim(TRACKER_HIGH_WATER, TRACKER_LOW_WATER),
        trimmed_warmups: state.warming.trim(WARMING_QUEUE_CAPACITY),
        expired_entries: state.store.purge_expired(now),
    }
}

/// Start the periodic sweep on the current runtime.
///
/// Returns `None` (and logs) when called outside a tokio runtime; the
/// cache then works without background reclamation.
pub(crate) fn spawn(cache: Weak<Inner>) -> Option<JoinHandle<()>> {
    let Ok(runtime) = tokio::runtime::Handle::try_current() else {
        warn!("no tokio runtime, quote cache reclaimer not started");
        return None;
    };

    info!(
        interval_secs = RECLAIM_INTERVAL.as_secs(),
        "quote cache reclaimer started"
    );
    Some(runtime.spawn(async move {
        let start = Instant::now() + RECLAIM_INTERVAL;
        let mut ticker = tokio::time::interval_at(start, RECLAIM_INTERVAL);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let Some(inner) = cache.upgrade() else {
                break;
            };
            let report = sweep(&mut inner.lock(), Instant::now());
            if report.total() > 0 {
                debug!(?report, "quote cache sweep");
            }
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::key::Fingerprint;
    use crate::cache::store::EntryStore;
    use crate::cache::usage::{UsageTracker, WarmingQueue};
    use crate::cache::volatility::VolatilityTracker;

    fn fp(n: usize) -> Fingerprint {
        Fingerprint::from_query(&[("amount", n.to_string())])
    }

    #[test]
    fn sweep_purges_and_trims() {
        let t0 = Instant::now();
        let mut usage = UsageTracker::new();
        let mut volatility = VolatilityTracker::new();
        // 1200 recent patterns, 10 idle ones
        for n in 0..1_200 {
            let recent = t0 + USAGE_MAX_IDLE + Duration::from_secs(n as u64);
            usage.record_access(&fp(n), recent);
            volatility.record_observation(&fp(n), 1.0, t0 + Duration::from_secs(n as u64));
        }
        for n in 5_000..5_010 {
            usage.record_access(&fp(n), t0);
        }
        let mut state =
            CacheState::for_test(EntryStore::new(4), volatility, usage, WarmingQueue::new());

        let now = t0 + USAGE_MAX_IDLE * 2;
        let report = sweep(&mut state, now);

        assert_eq!(report.stale_usage, 10);
        assert_eq!(report.trimmed_usage, 700);
        assert_eq!(report.trimmed_histories, 700);
        assert_eq!(state.usage.len(), TRACKER_LOW_WATER);
        assert_eq!(state.volatility.len(), TRACKER_LOW_WATER);
        assert!(state.usage.get(&fp(1_199)).is_some());
        assert!(state.volatility.history(&fp(0)).is_none());
    }

    #[test]
    fn sweep_below_high_water_keeps_everything() {
        let t0 = Instant::now();
        let mut usage = UsageTracker::new();
        for n in 0..50 {
            usage.record_access(&fp(n), t0);
        }
        let mut state = CacheState::for_test(
            EntryStore::new(4),
            VolatilityTracker::new(),
            usage,
            WarmingQueue::new(),
        );
        let report = sweep(&mut state, t0 + Duration::from_secs(60));
        assert_eq!(report, ReclaimReport::default());
        assert_eq!(state.usage.len(), 50);
    }
}
