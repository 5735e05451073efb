//! Generic TTL cache for validation summaries
//!
//! A small key → (value, inserted-at) map with encapsulated expiry.
//! Entries are immutable once stored; `clear` invalidates everything.
//! The cache is advisory: callers must behave identically with or
//! without it.

use std::collections::HashMap;
use std::hash::Hash;
use std::time::{Duration, Instant};

/// Default time-to-live for cached validation runs.
pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

#[derive(Debug)]
pub struct TtlCache<K, V> {
    entries: HashMap<K, (V, Instant)>,
    ttl: Duration,
}

impl<K: Eq + Hash, V: Clone> TtlCache<K, V> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: HashMap::new(),
            ttl,
        }
    }

    /// Live value for the key, if present and unexpired. Expired
    /// entries are evicted on the way out.
    pub fn get(&mut self, key: &K) -> Option<V> {
        match self.entries.get(key) {
            Some((value, inserted)) if inserted.elapsed() <= self.ttl => Some(value.clone()),
            Some(_) => {
                self.entries.remove(key);
                None
            }
            None => None,
        }
    }

    pub fn insert(&mut self, key: K, value: V) {
        self.entries.insert(key, (value, Instant::now()));
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Number of entries, expired ones included until next access.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Eq + Hash, V: Clone> Default for TtlCache<K, V> {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hit_and_miss() {
        let mut cache: TtlCache<String, u32> = TtlCache::new(Duration::from_secs(60));
        cache.insert("run-1".to_string(), 7);
        assert_eq!(cache.get(&"run-1".to_string()), Some(7));
        assert_eq!(cache.get(&"run-2".to_string()), None);
    }

    #[test]
    fn test_expiry_evicts() {
        let mut cache: TtlCache<&str, u32> = TtlCache::new(Duration::from_millis(0));
        cache.insert("run-1", 7);
        std::thread::sleep(Duration::from_millis(5));
        assert_eq!(cache.get(&"run-1"), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_clear() {
        let mut cache: TtlCache<&str, u32> = TtlCache::default();
        cache.insert("a", 1);
        cache.insert("b", 2);
        assert_eq!(cache.len(), 2);
        cache.clear();
        assert!(cache.is_empty());
    }
}
