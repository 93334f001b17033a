//! Bounded LRU entry store with per-entry TTL.
//!
//! Entries live in a slab of nodes threaded on an intrusive doubly-linked
//! recency list (head = most recently used, tail = least recently used),
//! with a `HashMap` index from fingerprint to slot. Lookup, insert and
//! eviction are O(1) expected.
//!
//! Expiry is lazy: validity (`now - stored_at < ttl`) is re-checked on every
//! read, and an expired entry is dropped the first time it is read. Nothing
//! is pre-computed at insert time.

use std::collections::HashMap;
use std::time::Duration;

use tokio::time::Instant;

use super::key::Fingerprint;
use crate::client::ApiResponse;

/// A stored response and its expiry metadata.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub value: ApiResponse,
    pub stored_at: Instant,
    pub ttl: Duration,
}

impl CacheEntry {
    pub fn is_valid(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.stored_at) < self.ttl
    }
}

#[derive(Debug)]
struct Node {
    key: Fingerprint,
    entry: CacheEntry,
    prev: Option<usize>,
    next: Option<usize>,
}

/// Fingerprint → response map bounded to `capacity` entries.
#[derive(Debug)]
pub struct EntryStore {
    capacity: usize,
    index: HashMap<Fingerprint, usize>,
    slots: Vec<Option<Node>>,
    free: Vec<usize>,
    head: Option<usize>,
    tail: Option<usize>,
}

impl EntryStore {
    /// Create an empty store. A capacity of 0 stores nothing.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            index: HashMap::new(),
            slots: Vec::new(),
            free: Vec::new(),
            head: None,
            tail: None,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of physically present entries, including expired ones not
    /// yet read.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Look up a valid entry and mark it most recently used.
    ///
    /// An expired entry is removed and reported as absent.
    pub fn lookup(&mut self, key: &Fingerprint, now: Instant) -> Option<&CacheEntry> {
        let idx = *self.index.get(key)?;
        if !self.node(idx).entry.is_valid(now) {
            self.remove(key);
            return None;
        }
        self.move_to_front(idx);
        Some(&self.node(idx).entry)
    }

    /// Whether a valid entry exists, without touching recency.
    pub fn contains(&self, key: &Fingerprint, now: Instant) -> bool {
        self.index
            .get(key)
            .is_some_and(|&idx| self.node(idx).entry.is_valid(now))
    }

    /// Insert or overwrite an entry.
    ///
    /// When a new key arrives at capacity, the least recently used entry is
    /// evicted first and its key returned.
    pub fn store(
        &mut self,
        key: Fingerprint,
        value: ApiResponse,
        ttl: Duration,
        now: Instant,
    ) -> Option<Fingerprint> {
        if self.capacity == 0 {
            return None;
        }
        let entry = CacheEntry {
            value,
            stored_at: now,
            ttl,
        };

        if let Some(&idx) = self.index.get(&key) {
            self.node_mut(idx).entry = entry;
            self.move_to_front(idx);
            return None;
        }

        let evicted = if self.index.len() >= self.capacity {
            self.pop_tail()
        } else {
            None
        };

        let node = Node {
            key: key.clone(),
            entry,
            prev: None,
            next: None,
        };
        let idx = match self.free.pop() {
            Some(idx) => {
                self.slots[idx] = Some(node);
                idx
            }
            None => {
                self.slots.push(Some(node));
                self.slots.len() - 1
            }
        };
        self.index.insert(key, idx);
        self.push_front(idx);
        evicted
    }

    /// Remove an entry, returning it if present.
    pub fn remove(&mut self, key: &Fingerprint) -> Option<CacheEntry> {
        let idx = self.index.remove(key)?;
        self.unlink(idx);
        self.free.push(idx);
        self.slots[idx].take().map(|node| node.entry)
    }

    /// Drop every expired entry. Returns how many were removed.
    pub fn purge_expired(&mut self, now: Instant) -> usize {
        let expired: Vec<Fingerprint> = self
            .index
            .iter()
            .filter(|&(_, &idx)| !self.node(idx).entry.is_valid(now))
            .map(|(key, _)| key.clone())
            .collect();
        for key in &expired {
            self.remove(key);
        }
        expired.len()
    }

    pub fn clear(&mut self) {
        self.index.clear();
        self.slots.clear();
        self.free.clear();
        self.head = None;
        self.tail = None;
    }

    // ---- recency list -----------------------------------------------------

    // Slots referenced by `index` or the list are always occupied.
    fn node(&self, idx: usize) -> &Node {
        self.slots[idx].as_ref().expect("linked slot is occupied")
    }

    fn node_mut(&mut self, idx: usize) -> &mut Node {
        self.slots[idx].as_mut().expect("linked slot is occupied")
    }

    fn unlink(&mut self, idx: usize) {
        let (prev, next) = {
            let node = self.node(idx);
            (node.prev, node.next)
        };
        match prev {
            Some(p) => self.node_mut(p).next = next,
            None => self.head = next,
        }
        match next {
            Some(n) => self.node_mut(n).prev = prev,
            None => self.tail = prev,
        }
        let node = self.node_mut(idx);
        node.prev = None;
        node.next = None;
    }

    fn push_front(&mut self, idx: usize) {
        let old_head = self.head;
        {
            let node = self.node_mut(idx);
            node.prev = None;
            node.next = old_head;
        }
        match old_head {
            Some(h) => self.node_mut(h).prev = Some(idx),
            None => self.tail = Some(idx),
        }
        self.head = Some(idx);
    }

    fn move_to_front(&mut self, idx: usize) {
        if self.head == Some(idx) {
            return;
        }
        self.unlink(idx);
        self.push_front(idx);
    }

    fn pop_tail(&mut self) -> Option<Fingerprint> {
        let idx = self.tail?;
        let key = self.node(idx).key.clone();
        self.remove(&key);
        Some(key)
    }
}
