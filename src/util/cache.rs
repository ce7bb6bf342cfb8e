//! TTL cache with bounded size.
//!
//! Entries expire after a fixed duration and the oldest-inserted entry is
//! evicted when the cache is full (insertion-order eviction, not LRU).

use indexmap::IndexMap;
use std::hash::Hash;
use std::sync::Mutex;
use std::time::{Duration, Instant};

struct CacheEntry<V> {
    value: V,
    expires_at: Instant,
}

/// A key-value store where entries expire after a fixed time-to-live.
///
/// Safe to share across concurrent tasks; operations take an internal lock.
/// `IndexMap` keeps insertion order so eviction always removes the
/// oldest-inserted entry.
///
/// # Example
///
/// ```rust,ignore
/// let cache: TtlCache<String, String> = TtlCache::new(Duration::from_secs(1800), 500);
/// cache.set("key".into(), "value".into());
/// assert_eq!(cache.get(&"key".to_string()), Some("value".to_string()));
/// ```
pub struct TtlCache<K, V> {
    entries: Mutex<IndexMap<K, CacheEntry<V>>>,
    ttl: Duration,
    capacity: usize,
}

impl<K: Hash + Eq, V: Clone> TtlCache<K, V> {
    /// Create a cache with the given time-to-live and maximum entry count.
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        Self {
            entries: Mutex::new(IndexMap::new()),
            ttl,
            capacity: capacity.max(1),
        }
    }

    /// Return the value for `key` if present and not expired.
    ///
    /// An expired entry is removed as a side effect and reported as absent.
    pub fn get(&self, key: &K) -> Option<V> {
        let mut entries = self.entries.lock().expect("cache lock poisoned");
        match entries.get(key) {
            Some(entry) if Instant::now() <= entry.expires_at => Some(entry.value.clone()),
            Some(_) => {
                entries.shift_remove(key);
                None
            }
            None => None,
        }
    }

    /// Insert or overwrite `key` with a fresh expiry of now + TTL.
    ///
    /// When inserting a new key at capacity, the oldest-inserted entry is
    /// evicted first.
    pub fn set(&self, key: K, value: V) {
        let mut entries = self.entries.lock().expect("cache lock poisoned");
        if !entries.contains_key(&key) && entries.len() >= self.capacity {
            entries.shift_remove_index(0);
        }
        entries.insert(
            key,
            CacheEntry {
                value,
                expires_at: Instant::now() + self.ttl,
            },
        );
    }

    /// Number of physically retained entries (may include expired ones).
    pub fn len(&self) -> usize {
        self.entries.lock().expect("cache lock poisoned").len()
    }

    /// True if no entries are retained.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_returns_cached_value() {
        let cache = TtlCache::new(Duration::from_secs(60), 10);
        cache.set("a", 1);
        assert_eq!(cache.get(&"a"), Some(1));
        // Second hit returns the same value
        assert_eq!(cache.get(&"a"), Some(1));
        assert_eq!(cache.get(&"b"), None);
    }

    #[test]
    fn test_expired_entry_is_absent_and_removed() {
        let cache = TtlCache::new(Duration::from_millis(20), 10);
        cache.set("a", 1);
        std::thread::sleep(Duration::from_millis(40));
        assert_eq!(cache.get(&"a"), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_capacity_evicts_oldest_inserted() {
        let cache = TtlCache::new(Duration::from_secs(60), 2);
        cache.set("a", 1);
        cache.set("b", 2);
        cache.set("c", 3);
        assert_eq!(cache.get(&"a"), None);
        assert_eq!(cache.get(&"b"), Some(2));
        assert_eq!(cache.get(&"c"), Some(3));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_overwrite_refreshes_without_eviction() {
        let cache = TtlCache::new(Duration::from_secs(60), 2);
        cache.set("a", 1);
        cache.set("b", 2);
        cache.set("a", 10);
        assert_eq!(cache.get(&"a"), Some(10));
        assert_eq!(cache.get(&"b"), Some(2));
    }
}
