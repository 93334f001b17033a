//! Rolling price history and relative volatility per fingerprint.

use std::collections::{HashMap, VecDeque};

use tokio::time::Instant;

use super::key::Fingerprint;

/// Observations kept per fingerprint.
pub const HISTORY_LEN: usize = 10;

/// The most recent output amounts observed for one fingerprint, oldest first.
#[derive(Debug, Clone)]
pub struct PriceHistory {
    prices: VecDeque<f64>,
    updated_at: Instant,
}

impl PriceHistory {
    fn new(now: Instant) -> Self {
        Self {
            prices: VecDeque::with_capacity(HISTORY_LEN),
            updated_at: now,
        }
    }

    fn push(&mut self, price: f64, now: Instant) {
        if self.prices.len() == HISTORY_LEN {
            self.prices.pop_front();
        }
        self.prices.push_back(price);
        self.updated_at = now;
    }

    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }

    pub fn prices(&self) -> impl Iterator<Item = f64> + '_ {
        self.prices.iter().copied()
    }

    pub fn updated_at(&self) -> Instant {
        self.updated_at
    }

    /// Relative volatility of this history, see [`volatility`].
    pub fn volatility(&self) -> f64 {
        let prices: Vec<f64> = self.prices().collect();
        volatility(&prices)
    }
}

/// Population standard deviation of the relative changes
/// `(curr - prev) / prev` between consecutive prices.
///
/// Pairs where either side is non-positive or non-finite are skipped.
/// Returns `0.0` when no valid change exists; never returns a non-finite
/// value.
pub fn volatility(prices: &[f64]) -> f64 {
    let valid = |p: f64| p.is_finite() && p > 0.0;
    let changes: Vec<f64> = prices
        .windows(2)
        .filter(|pair| valid(pair[0]) && valid(pair[1]))
        .map(|pair| (pair[1] - pair[0]) / pair[0])
        .filter(|change| change.is_finite())
        .collect();
    if changes.is_empty() {
        return 0.0;
    }

    let n = changes.len() as f64;
    let mean = changes.iter().sum::<f64>() / n;
    let variance = changes.iter().map(|c| (c - mean).powi(2)).sum::<f64>() / n;
    let std_dev = variance.sqrt();
    if std_dev.is_finite() { std_dev } else { 0.0 }
}

/// Price histories keyed by fingerprint.
#[derive(Debug, Default)]
pub struct VolatilityTracker {
    histories: HashMap<Fingerprint, PriceHistory>,
}

impl VolatilityTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an observed output amount.
    ///
    /// Non-finite and non-positive amounts are ignored; returns whether the
    /// observation was recorded.
    pub fn record_observation(&mut self, key: &Fingerprint, amount: f64, now: Instant) -> bool {
        if !amount.is_finite() || amount <= 0.0 {
            return false;
        }
        self.histories
            .entry(key.clone())
            .or_insert_with(|| PriceHistory::new(now))
            .push(amount, now);
        true
    }

    pub fn history(&self, key: &Fingerprint) -> Option<&PriceHistory> {
        self.histories.get(key)
    }

    /// Volatility for `key`, `0.0` when unknown.
    pub fn volatility(&self, key: &Fingerprint) -> f64 {
        self.histories
            .get(key)
            .map(PriceHistory::volatility)
            .unwrap_or(0.0)
    }

    pub fn len(&self) -> usize {
        self.histories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.histories.is_empty()
    }

    /// If more than `max` histories are tracked, keep only the `keep` most
    /// recently updated. Returns how many were dropped.
    pub fn trim(&mut self, max: usize, keep: usize) -> usize {
        if self.histories.len() <= max {
            return 0;
        }
        let mut by_age: Vec<(Instant, Fingerprint)> = self
            .histories
            .iter()
            .map(|(key, history)| (history.updated_at, key.clone()))
            .collect();
        by_age.sort_by(|a, b| b.0.cmp(&a.0));
        let dropped = by_age.len().saturating_sub(keep);
        for (_, key) in by_age.into_iter().skip(keep) {
            self.histories.remove(&key);
        }
        dropped
    }

    pub fn clear(&mut self) {
        self.histories.clear();
    }
}
