// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! LRU cache with per-entry time-based revalidation.
//!
//! Backs the data fetchers so repeated page loads inside the revalidation
//! window do not hit the backend, and the flow store so abandoned flows
//! expire after a period of disuse.

use std::hash::Hash;
use std::num::NonZeroUsize;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use lru::LruCache;

/// Cached value + when it was stored or last touched.
struct CacheEntry<V> {
    value: V,
    stamped_at: Instant,
}

/// In-process LRU cache whose entries expire `ttl` after insertion.
pub struct TtlCache<K: Hash + Eq, V> {
    cache: Mutex<LruCache<K, CacheEntry<V>>>,
    ttl: Duration,
}

impl<K: Hash + Eq, V: Clone> TtlCache<K, V> {
    /// Create a new cache with the given capacity and TTL.
    ///
    /// A zero capacity is raised to one.
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self {
            cache: Mutex::new(LruCache::new(
                NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN),
            )),
            ttl,
        }
    }

    /// Returns `None` if not cached or expired.
    pub fn get(&self, key: &K) -> Option<V> {
        let mut cache = self.cache.lock().ok()?;
        if let Some(entry) = cache.get(key) {
            if entry.stamped_at.elapsed() < self.ttl {
                return Some(entry.value.clone());
            }
            // Expired
            cache.pop(key);
        }
        None
    }

    pub fn put(&self, key: K, value: V) {
        if let Ok(mut cache) = self.cache.lock() {
            cache.put(
                key,
                CacheEntry {
                    value,
                    stamped_at: Instant::now(),
                },
            );
        }
    }

    /// The live value for `key`, inserting `make()` when missing or expired.
    ///
    /// Either way the entry's clock restarts, so entries read through here
    /// expire after `ttl` of disuse rather than after insertion.
    pub fn touch_or_insert_with(&self, key: K, make: impl FnOnce() -> V) -> V {
        let Ok(mut cache) = self.cache.lock() else {
            return make();
        };
        let now = Instant::now();
        if let Some(entry) = cache.get_mut(&key) {
            if entry.stamped_at.elapsed() < self.ttl {
                entry.stamped_at = now;
                return entry.value.clone();
            }
        }

        let value = make();
        cache.put(
            key,
            CacheEntry {
                value: value.clone(),
                stamped_at: now,
            },
        );
        value
    }

    /// Drop every expired entry. Returns how many were dropped.
    pub fn purge_expired(&self) -> usize
    where
        K: Clone,
    {
        let Ok(mut cache) = self.cache.lock() else {
            return 0;
        };
        let expired: Vec<K> = cache
            .iter()
            .filter(|(_, entry)| entry.stamped_at.elapsed() >= self.ttl)
            .map(|(key, _)| key.clone())
            .collect();
        for key in &expired {
            cache.pop(key);
        }
        expired.len()
    }

    pub fn invalidate(&self, key: &K) {
        if let Ok(mut cache) = self.cache.lock() {
            cache.pop(key);
        }
    }

    pub fn clear(&self) {
        if let Ok(mut cache) = self.cache.lock() {
            cache.clear();
        }
    }

    pub fn len(&self) -> usize {
        self.cache.lock().map(|cache| cache.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_put_and_get() {
        let cache = TtlCache::new(10, Duration::from_secs(300));
        assert!(cache.get(&"listings").is_none());

        cache.put("listings", vec![1, 2, 3]);
        assert_eq!(cache.get(&"listings"), Some(vec![1, 2, 3]));
    }

    #[test]
    fn cache_invalidate_and_clear() {
        let cache = TtlCache::new(10, Duration::from_secs(300));
        cache.put("a", 1);
        cache.put("b", 2);

        cache.invalidate(&"a");
        assert!(cache.get(&"a").is_none());
        assert_eq!(cache.get(&"b"), Some(2));

        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn cache_ttl_expiry() {
        let cache = TtlCache::new(10, Duration::from_millis(1));
        cache.put("a", 1);

        std::thread::sleep(Duration::from_millis(5));

        assert!(cache.get(&"a").is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn least_recently_used_entry_is_evicted() {
        let cache = TtlCache::new(2, Duration::from_secs(300));
        cache.put("a", 1);
        cache.put("b", 2);
        cache.get(&"a");
        cache.put("c", 3);

        assert!(cache.get(&"b").is_none());
        assert_eq!(cache.get(&"a"), Some(1));
        assert_eq!(cache.get(&"c"), Some(3));
    }

    #[test]
    fn touching_restarts_the_clock() {
        let cache = TtlCache::new(10, Duration::from_millis(100));
        assert_eq!(cache.touch_or_insert_with("a", || 1), 1);

        std::thread::sleep(Duration::from_millis(60));
        assert_eq!(cache.touch_or_insert_with("a", || 2), 1);

        std::thread::sleep(Duration::from_millis(60));
        // 120ms after insertion but only 60ms after the last touch
        assert_eq!(cache.touch_or_insert_with("a", || 3), 1);
    }

    #[test]
    fn expired_entry_is_replaced_on_touch() {
        let cache = TtlCache::new(10, Duration::from_millis(1));
        cache.touch_or_insert_with("a", || 1);
        std::thread::sleep(Duration::from_millis(5));
        assert_eq!(cache.touch_or_insert_with("a", || 2), 2);
    }

    #[test]
    fn purge_drops_only_expired_entries() {
        let cache = TtlCache::new(10, Duration::from_millis(30));
        cache.put("old", 1);
        std::thread::sleep(Duration::from_millis(50));
        cache.put("new", 2);

        assert_eq!(cache.purge_expired(), 1);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(&"new"), Some(2));
    }

    #[test]
    fn zero_capacity_still_holds_one_entry() {
        let cache = TtlCache::new(0, Duration::from_secs(300));
        cache.put("a", 1);
        assert_eq!(cache.len(), 1);
    }
}
