//! Segmented LRU Cache
//!
//! Two segments behind one lock. New keys enter the probationary segment; a
//! second access promotes a key to the protected segment. When the protected
//! segment overflows, its least recently used entry is demoted back to the
//! probationary segment. Probationary entries may borrow protected capacity the
//! protected segment doesn't use, so the cache holds up to
//! `protected + probationary` entries before evicting the probationary LRU.
//!
//! Absent and "present but empty" are told apart by storing `Option<T>` as the
//! value type: `get` then returns `Some(None)` for a cached miss.

use crate::config::SlruCapacity;
use fxhash::FxBuildHasher;
use indexmap::IndexMap;
use parking_lot::{Mutex, ReentrantMutex};
use std::hash::Hash;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub insertions: u64,
    pub promotions: u64,
    pub evictions: u64,
}

impl CacheStats {
    pub fn merge(&mut self, other: &CacheStats) {
        self.hits += other.hits;
        self.misses += other.misses;
        self.insertions += other.insertions;
        self.promotions += other.promotions;
        self.evictions += other.evictions;
    }
}

/// Front is least recently used
type Segment<K, V> = IndexMap<K, V, FxBuildHasher>;

struct Segments<K, V> {
    probationary: Segment<K, V>,
    protected: Segment<K, V>,
    stats: CacheStats,
}

impl<K: Eq + Hash + Clone, V> Segments<K, V> {
    fn len(&self) -> usize {
        self.probationary.len() + self.protected.len()
    }

    /// Mark `key` as used; returns the entry if present
    fn touch(&mut self, key: &K, capacity: SlruCapacity) -> Option<&mut V> {
        if let Some(index) = self.protected.get_index_of(key) {
            let last = self.protected.len() - 1;
            self.protected.move_index(index, last);
            return self.protected.get_index_mut(last).map(|(_, v)| v);
        }
        let (key, value) = self.probationary.shift_remove_entry(key)?;
        self.stats.promotions += 1;
        self.protected.insert(key.clone(), value);
        self.demote_overflow(capacity);
        self.evict_overflow(capacity);
        if self.protected.contains_key(&key) {
            self.protected.get_mut(&key)
        } else {
            // demoted straight back (protected capacity 0)
            self.probationary.get_mut(&key)
        }
    }

    fn demote_overflow(&mut self, capacity: SlruCapacity) {
        while self.protected.len() > capacity.protected {
            match self.protected.shift_remove_index(0) {
                Some((key, value)) => {
                    self.probationary.insert(key, value);
                }
                None => break,
            }
        }
    }

    fn evict_overflow(&mut self, capacity: SlruCapacity) {
        while self.len() > capacity.total() {
            let evicted = if self.probationary.is_empty() {
                self.protected.shift_remove_index(0)
            } else {
                self.probationary.shift_remove_index(0)
            };
            if evicted.is_none() {
                break;
            }
            self.stats.evictions += 1;
        }
    }
}

pub struct SlruCache<K, V> {
    segments: Mutex<Segments<K, V>>,
    /// Serializes `get_or_compute` slow paths; reentrant so a computation may
    /// consult the same cache for other keys
    compute_lock: ReentrantMutex<()>,
    capacity: SlruCapacity,
}

impl<K: Eq + Hash + Clone, V: Clone> SlruCache<K, V> {
    pub fn new(capacity: SlruCapacity) -> Self {
        Self {
            segments: Mutex::new(Segments {
                probationary: IndexMap::with_hasher(FxBuildHasher::default()),
                protected: IndexMap::with_hasher(FxBuildHasher::default()),
                stats: CacheStats::default(),
            }),
            compute_lock: ReentrantMutex::new(()),
            capacity,
        }
    }

    pub fn with_sizes(protected: usize, probationary: usize) -> Self {
        Self::new(SlruCapacity::new(protected, probationary))
    }

    pub fn capacity(&self) -> SlruCapacity {
        self.capacity
    }

    pub fn get(&self, key: &K) -> Option<V> {
        let mut segments = self.segments.lock();
        let found = segments.touch(key, self.capacity).cloned();
        if found.is_some() {
            segments.stats.hits += 1;
        } else {
            segments.stats.misses += 1;
        }
        found
    }

    /// Run `apply` on the entry (or `None`) while holding the cache lock
    pub fn get_and_apply<R>(&self, key: &K, apply: impl FnOnce(Option<&mut V>) -> R) -> R {
        let mut segments = self.segments.lock();
        let entry = segments.touch(key, self.capacity);
        apply(entry)
    }

    pub fn put(&self, key: K, value: V) {
        if self.capacity.total() == 0 {
            return;
        }
        let mut segments = self.segments.lock();
        if let Some(existing) = segments.touch(&key, self.capacity) {
            *existing = value;
            return;
        }
        segments.stats.insertions += 1;
        segments.probationary.insert(key, value);
        segments.evict_overflow(self.capacity);
    }

    /// Cached value, or the result of `compute` stored under `key`
    ///
    /// At most one computation runs at a time; other threads asking for a
    /// missing key wait and then see the stored value.
    pub fn get_or_compute(&self, key: &K, compute: impl FnOnce() -> V) -> V {
        if let Some(value) = self.get(key) {
            return value;
        }
        let _guard = self.compute_lock.lock();
        if let Some(value) = self.peek(key) {
            return value;
        }
        let value = compute();
        self.put(key.clone(), value.clone());
        value
    }

    /// Value without marking it as used
    pub fn peek(&self, key: &K) -> Option<V> {
        let segments = self.segments.lock();
        segments
            .protected
            .get(key)
            .or_else(|| segments.probationary.get(key))
            .cloned()
    }

    pub fn contains_key(&self, key: &K) -> bool {
        let segments = self.segments.lock();
        segments.protected.contains_key(key) || segments.probationary.contains_key(key)
    }

    pub fn is_protected(&self, key: &K) -> bool {
        self.segments.lock().protected.contains_key(key)
    }

    pub fn remove(&self, key: &K) -> Option<V> {
        let mut segments = self.segments.lock();
        segments
            .protected
            .shift_remove(key)
            .or_else(|| segments.probationary.shift_remove(key))
    }

    pub fn clear(&self) {
        let mut segments = self.segments.lock();
        segments.protected.clear();
        segments.probationary.clear();
    }

    pub fn len(&self) -> usize {
        self.segments.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        self.segments.lock().stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_put_then_get() {
        let cache = SlruCache::with_sizes(2, 2);
        cache.put("a", 1);
        assert_eq!(cache.get(&"a"), Some(1));
        assert_eq!(cache.get(&"b"), None);
        let stats = cache.stats();
        assert_eq!((stats.hits, stats.misses), (1, 1));
    }

    #[test]
    fn test_overflow_evicts_probationary_lru() {
        let cache = SlruCache::with_sizes(2, 2);
        for key in 0..5 {
            cache.put(key, key * 10);
        }
        assert_eq!(cache.len(), 4);
        assert!(!cache.contains_key(&0));
        assert_eq!(cache.stats().evictions, 1);
    }

    #[test]
    fn test_promoted_key_survives_eviction() {
        let cache = SlruCache::with_sizes(1, 2);
        cache.put("hot", 1);
        cache.put("a", 2);
        assert_eq!(cache.get(&"hot"), Some(1));
        assert!(cache.is_protected(&"hot"));
        cache.put("b", 3);
        cache.put("c", 4);
        cache.put("d", 5);
        assert!(cache.contains_key(&"hot"));
        assert!(!cache.contains_key(&"a"));
        assert_eq!(cache.len(), 3);
    }

    #[test]
    fn test_protected_overflow_demotes() {
        let cache = SlruCache::with_sizes(1, 2);
        cache.put("x", 1);
        cache.put("y", 2);
        cache.get(&"x");
        cache.get(&"y");
        assert!(cache.is_protected(&"y"));
        assert!(!cache.is_protected(&"x"));
        assert!(cache.contains_key(&"x"));
        assert_eq!(cache.stats().promotions, 2);
    }

    #[test]
    fn test_cached_absence_is_distinct_from_missing() {
        let cache: SlruCache<&str, Option<u32>> = SlruCache::with_sizes(2, 2);
        cache.put("none", None);
        assert_eq!(cache.get(&"none"), Some(None));
        assert_eq!(cache.get(&"other"), None);
    }

    #[test]
    fn test_get_and_apply_mutates_in_place() {
        let cache = SlruCache::with_sizes(2, 2);
        cache.put("n", vec![1]);
        let len = cache.get_and_apply(&"n", |entry| {
            let entry = entry.expect("present");
            entry.push(2);
            entry.len()
        });
        assert_eq!(len, 2);
        assert_eq!(cache.get(&"n"), Some(vec![1, 2]));
        assert!(cache.get_and_apply(&"missing", |entry| entry.is_none()));
    }

    #[test]
    fn test_get_or_compute_is_single_flight() {
        let cache = SlruCache::with_sizes(8, 8);
        let calls = AtomicUsize::new(0);
        std::thread::scope(|s| {
            for _ in 0..8 {
                s.spawn(|| {
                    let value = cache.get_or_compute(&"key", || {
                        calls.fetch_add(1, Ordering::SeqCst);
                        std::thread::sleep(std::time::Duration::from_millis(5));
                        42
                    });
                    assert_eq!(value, 42);
                });
            }
        });
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_zero_capacity_stores_nothing() {
        let cache = SlruCache::with_sizes(0, 0);
        cache.put(1, 1);
        assert!(cache.is_empty());
    }
}
