//! Cache Store Module
//!
//! Main cache engine combining HashMap storage with recency tracking, TTL
//! expiration, and bounded-capacity LRU eviction.

use std::collections::HashMap;
use std::sync::Arc;

use crate::cache::{CacheEntry, CacheMetrics, RecencyList};

// == Cache Store ==
/// Cache engine with LRU eviction and TTL support.
///
/// The store itself is synchronous; callers wrap it in
/// `Arc<tokio::sync::RwLock<CacheStore>>` and take the read lock for
/// inspection-only operations (`size`, `contains`, `keys`, snapshots) and
/// the write lock for everything else. `get` mutates recency order, so it
/// needs the write lock too.
///
/// Invariant: the key set of `entries` always equals the key set of
/// `recency`, and `entries.len() <= capacity` after every completed
/// mutation.
#[derive(Debug)]
pub struct CacheStore {
    /// Key-value storage
    entries: HashMap<String, CacheEntry>,
    /// Keys in MRU-to-LRU order
    recency: RecencyList,
    /// Maximum number of live entries
    capacity: usize,
    /// Background sweep interval in milliseconds
    eviction_interval_ms: u64,
    /// Hit/miss counters, shared with the metrics endpoint
    metrics: Arc<CacheMetrics>,
}

impl CacheStore {
    // == Constructor ==
    /// Creates a new CacheStore.
    ///
    /// # Arguments
    /// * `capacity` - Maximum number of entries; 0 is allowed and means
    ///   every insert is immediately evicted
    /// * `eviction_interval_ms` - Interval the background sweeper runs at
    pub fn new(capacity: usize, eviction_interval_ms: u64) -> Self {
        Self {
            entries: HashMap::new(),
            recency: RecencyList::new(),
            capacity,
            eviction_interval_ms,
            metrics: Arc::new(CacheMetrics::new()),
        }
    }

    // == Put ==
    /// Inserts or updates a key-value pair.
    ///
    /// A live existing entry is overwritten in place and promoted to MRU.
    /// An expired existing entry is removed first and the put proceeds as
    /// a fresh insert. A fresh insert may evict the LRU entry to stay
    /// within capacity.
    ///
    /// # Arguments
    /// * `key` - The key to store
    /// * `value` - The value to store
    /// * `ttl_ms` - TTL in milliseconds; 0 means no expiry
    pub fn put(&mut self, key: &str, value: String, ttl_ms: u64) {
        if let Some(entry) = self.entries.get_mut(key) {
            if !entry.is_expired() {
                *entry = CacheEntry::new(value, ttl_ms);
                self.recency.promote(key);
                return;
            }
            self.entries.remove(key);
            self.recency.remove(key);
        }

        self.recency.promote(key);
        self.entries.insert(key.to_string(), CacheEntry::new(value, ttl_ms));
        self.evict_over_capacity();
    }

    // == Get ==
    /// Retrieves a value by key.
    ///
    /// A present, unexpired entry is promoted to MRU and counted as a hit.
    /// An expired entry is removed and counted as a miss, as is an absent
    /// key. Exactly one counter increments per call.
    pub fn get(&mut self, key: &str) -> Option<String> {
        let Some(entry) = self.entries.get(key) else {
            self.metrics.record_miss();
            return None;
        };

        if entry.is_expired() {
            self.entries.remove(key);
            self.recency.remove(key);
            self.metrics.record_miss();
            return None;
        }

        let value = entry.value.clone();
        self.recency.promote(key);
        self.metrics.record_hit();
        Some(value)
    }

    // == Erase ==
    /// Removes an entry by key. Returns whether the key was present.
    pub fn erase(&mut self, key: &str) -> bool {
        if self.entries.remove(key).is_some() {
            self.recency.remove(key);
            true
        } else {
            false
        }
    }

    // == Size ==
    /// Returns the current number of entries.
    pub fn size(&self) -> usize {
        self.entries.len()
    }

    // == Contains ==
    /// Raw presence check; ignores TTL. Diagnostic only.
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    // == Keys ==
    /// Snapshot of all keys in MRU-to-LRU order; ignores TTL.
    pub fn keys(&self) -> Vec<String> {
        self.recency.snapshot()
    }

    // == Clear ==
    /// Removes every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.recency.clear();
    }

    // == Config Accessors ==
    /// Returns the configured capacity.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the background sweep interval in milliseconds.
    pub fn eviction_interval(&self) -> u64 {
        self.eviction_interval_ms
    }

    // == Metric Accessors ==
    /// Returns the number of cache hits.
    pub fn hits(&self) -> u64 {
        self.metrics.hits()
    }

    /// Returns the number of cache misses.
    pub fn misses(&self) -> u64 {
        self.metrics.misses()
    }

    /// Returns a handle to the shared counters, readable without the
    /// cache lock.
    pub fn metrics_handle(&self) -> Arc<CacheMetrics> {
        Arc::clone(&self.metrics)
    }

    // == Sweep ==
    /// Removes every expired entry in one pass.
    ///
    /// Returns the number of entries removed. The background sweeper calls
    /// this under a single write-lock acquisition.
    pub fn sweep_expired(&mut self) -> usize {
        let expired: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired())
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired {
            self.entries.remove(key);
            self.recency.remove(key);
        }

        expired.len()
    }

    // == Eviction ==
    /// Drops LRU entries until the store is back within capacity.
    ///
    /// With capacity 0 this evicts the key that was just inserted.
    fn evict_over_capacity(&mut self) {
        while self.entries.len() > self.capacity {
            match self.recency.pop_lru() {
                Some(lru_key) => {
                    self.entries.remove(&lru_key);
                }
                None => break,
            }
        }
    }
}
