//! Access tracking and warm-up scheduling for hot fingerprints.
//!
//! Every quote lookup bumps a [`UsagePattern`]. Once a fingerprint has been
//! requested more than [`WARM_THRESHOLD`] times it is scheduled in the
//! [`WarmingQueue`]; the timer itself is spawned by the cache engine.

use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::Instant;

use super::key::Fingerprint;

/// Accesses after which a fingerprint counts as hot.
pub const WARM_THRESHOLD: u64 = 3;

/// Maximum scheduled warm-ups before the oldest half is dropped.
pub const WARMING_QUEUE_CAPACITY: usize = 100;

/// How often, and how recently, a fingerprint was requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UsagePattern {
    pub count: u64,
    pub last_used_at: Instant,
}

#[derive(Debug, Default)]
pub struct UsageTracker {
    patterns: HashMap<Fingerprint, UsagePattern>,
}

impl UsageTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one access and return the new total.
    pub fn record_access(&mut self, key: &Fingerprint, now: Instant) -> u64 {
        let pattern = self
            .patterns
            .entry(key.clone())
            .or_insert(UsagePattern {
                count: 0,
                last_used_at: now,
            });
        pattern.count += 1;
        pattern.last_used_at = now;
        pattern.count
    }

    /// Raise prediction confidence without counting a real access.
    pub fn bump_confidence(&mut self, key: &Fingerprint) {
        if let Some(pattern) = self.patterns.get_mut(key) {
            pattern.count += 1;
        }
    }

    pub fn get(&self, key: &Fingerprint) -> Option<UsagePattern> {
        self.patterns.get(key).copied()
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Drop patterns idle for longer than `max_idle`.
    pub fn purge_stale(&mut self, now: Instant, max_idle: Duration) -> usize {
        let before = self.patterns.len();
        self.patterns
            .retain(|_, p| now.saturating_duration_since(p.last_used_at) <= max_idle);
        before - self.patterns.len()
    }

    /// If more than `max` patterns exist, keep the `keep` most recently used.
    pub fn trim(&mut self, max: usize, keep: usize) -> usize {
        if self.patterns.len() <= max {
            return 0;
        }
        let mut by_age: Vec<(Instant, Fingerprint)> = self
            .patterns
            .iter()
            .map(|(key, p)| (p.last_used_at, key.clone()))
            .collect();
        by_age.sort_by(|a, b| b.0.cmp(&a.0));
        let dropped = by_age.len().saturating_sub(keep);
        for (_, key) in by_age.into_iter().skip(keep) {
            self.patterns.remove(&key);
        }
        dropped
    }

    pub fn clear(&mut self) {
        self.patterns.clear();
    }
}

/// Scheduled warm-ups in scheduling order, at most one per fingerprint.
#[derive(Debug, Default)]
pub struct WarmingQueue {
    order: VecDeque<Fingerprint>,
    timers: HashMap<Fingerprint, JoinHandle<()>>,
}

impl WarmingQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, key: &Fingerprint) -> bool {
        self.timers.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Schedule `key` with its timer.
    ///
    /// A duplicate schedule aborts the new timer. Past capacity, the oldest
    /// half is dropped and their timers aborted; the dropped keys are
    /// returned.
    pub fn schedule(&mut self, key: Fingerprint, timer: JoinHandle<()>) -> Vec<Fingerprint> {
        if self.contains(&key) {
            timer.abort();
            return Vec::new();
        }
        self.order.push_back(key.clone());
        self.timers.insert(key, timer);

        if self.order.len() <= WARMING_QUEUE_CAPACITY {
            return Vec::new();
        }
        let excess = self.order.len() / 2;
        let dropped: Vec<Fingerprint> = self.order.drain(..excess).collect();
        for key in &dropped {
            if let Some(timer) = self.timers.remove(key) {
                timer.abort();
            }
        }
        dropped
    }

    /// Release `key` after its timer completed. Does not abort.
    pub fn complete(&mut self, key: &Fingerprint) {
        if self.timers.remove(key).is_some() {
            self.order.retain(|k| k != key);
        }
    }

    /// Abort every timer and empty the queue.
    pub fn clear(&mut self) {
        for (_, timer) in self.timers.drain() {
            timer.abort();
        }
        self.order.clear();
    }

    /// Trim to the `keep` most recently scheduled entries.
    pub fn trim(&mut self, keep: usize) -> usize {
        let excess = self.order.len().saturating_sub(keep);
        for key in self.order.drain(..excess) {
            if let Some(timer) = self.timers.remove(&key) {
                timer.abort();
            }
        }
        excess
    }
}

impl Drop for WarmingQueue {
    fn drop(&mut self) {
        self.clear();
    }
}
