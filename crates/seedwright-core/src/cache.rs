//! Keyed TTL cache used by the detection and discovery engines.
//!
//! Caches are injected dependencies of the engines that use them, never
//! process-wide singletons. The internal mutex makes a shared engine safe in
//! a concurrent host; a single-threaded host pays nothing beyond the lock.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Default time-to-live for detection cache entries.
pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

struct CacheEntry<V> {
    value: V,
    inserted_at: Instant,
}

/// A keyed cache with a fixed TTL and whole-unit clearing.
///
/// Partial invalidation is limited to removing single keys; there is no
/// prefix or predicate invalidation.
pub struct TtlCache<K, V> {
    entries: Mutex<HashMap<K, CacheEntry<V>>>,
    ttl: Duration,
}

impl<K: Eq + Hash + Clone, V: Clone> TtlCache<K, V> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    pub fn with_default_ttl() -> Self {
        Self::new(DEFAULT_TTL)
    }

    /// Fetch a live entry, evicting it if expired.
    pub fn get(&self, key: &K) -> Option<V> {
        let mut entries = self.entries.lock().unwrap_or_else(|err| err.into_inner());
        match entries.get(key) {
            Some(entry) if entry.inserted_at.elapsed() < self.ttl => Some(entry.value.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    pub fn put(&self, key: K, value: V) {
        let mut entries = self.entries.lock().unwrap_or_else(|err| err.into_inner());
        entries.insert(
            key,
            CacheEntry {
                value,
                inserted_at: Instant::now(),
            },
        );
    }

    pub fn invalidate(&self, key: &K) {
        let mut entries = self.entries.lock().unwrap_or_else(|err| err.into_inner());
        entries.remove(key);
    }

    pub fn clear(&self) {
        let mut entries = self.entries.lock().unwrap_or_else(|err| err.into_inner());
        entries.clear();
    }

    pub fn len(&self) -> usize {
        let entries = self.entries.lock().unwrap_or_else(|err| err.into_inner());
        entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<K: Eq + Hash + Clone, V: Clone> Default for TtlCache<K, V> {
    fn default() -> Self {
        Self::with_default_ttl()
    }
}

impl<K, V> std::fmt::Debug for TtlCache<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TtlCache").field("ttl", &self.ttl).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_get_roundtrip() {
        let cache: TtlCache<String, u32> = TtlCache::with_default_ttl();
        cache.put("key".to_string(), 7);
        assert_eq!(cache.get(&"key".to_string()), Some(7));
    }

    #[test]
    fn expired_entries_are_evicted() {
        let cache: TtlCache<String, u32> = TtlCache::new(Duration::from_millis(0));
        cache.put("key".to_string(), 7);
        assert_eq!(cache.get(&"key".to_string()), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn clear_drops_the_whole_unit() {
        let cache: TtlCache<u8, u8> = TtlCache::with_default_ttl();
        cache.put(1, 1);
        cache.put(2, 2);
        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn invalidate_removes_one_key() {
        let cache: TtlCache<u8, u8> = TtlCache::with_default_ttl();
        cache.put(1, 1);
        cache.put(2, 2);
        cache.invalidate(&1);
        assert_eq!(cache.get(&1), None);
        assert_eq!(cache.get(&2), Some(2));
    }
}
