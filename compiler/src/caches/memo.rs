//! Unbounded compute-once map
//!
//! Each key gets its own slot; concurrent first accesses to the same key
//! compute once and the others wait for the result. Failed computations are
//! not stored.

use fxhash::FxHashMap;
use parking_lot::Mutex;
use std::hash::Hash;
use std::sync::Arc;

pub struct MemoMap<K, V> {
    slots: Mutex<FxHashMap<K, Arc<Mutex<Option<V>>>>>,
}

impl<K: Eq + Hash + Clone, V: Clone> MemoMap<K, V> {
    pub fn new() -> Self {
        Self {
            slots: Mutex::new(FxHashMap::default()),
        }
    }

    fn slot(&self, key: &K) -> Arc<Mutex<Option<V>>> {
        self.slots.lock().entry(key.clone()).or_default().clone()
    }

    pub fn get_or_compute(&self, key: &K, compute: impl FnOnce() -> V) -> V {
        let slot = self.slot(key);
        let mut value = slot.lock();
        value.get_or_insert_with(compute).clone()
    }

    pub fn get_or_try_compute<E>(
        &self,
        key: &K,
        compute: impl FnOnce() -> Result<V, E>,
    ) -> Result<V, E> {
        let slot = self.slot(key);
        let mut value = slot.lock();
        if let Some(existing) = value.as_ref() {
            return Ok(existing.clone());
        }
        let computed = compute()?;
        *value = Some(computed.clone());
        Ok(computed)
    }

    pub fn get(&self, key: &K) -> Option<V> {
        let slot = self.slots.lock().get(key).cloned()?;
        let value = slot.lock();
        value.clone()
    }

    /// Values computed so far
    pub fn values(&self) -> Vec<V> {
        let slots: Vec<_> = self.slots.lock().values().cloned().collect();
        slots.iter().filter_map(|slot| slot.lock().clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.slots.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<K: Eq + Hash + Clone, V: Clone> Default for MemoMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_computes_once_per_key() {
        let memo: MemoMap<u32, String> = MemoMap::new();
        let calls = AtomicUsize::new(0);
        std::thread::scope(|s| {
            for _ in 0..4 {
                s.spawn(|| {
                    memo.get_or_compute(&1, || {
                        calls.fetch_add(1, Ordering::SeqCst);
                        "one".to_string()
                    })
                });
            }
        });
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(memo.get(&1).as_deref(), Some("one"));
        assert_eq!(memo.get(&2), None);
    }

    #[test]
    fn test_errors_are_not_cached() {
        let memo: MemoMap<u32, u32> = MemoMap::new();
        assert_eq!(memo.get_or_try_compute(&1, || Err::<u32, &str>("nope")), Err("nope"));
        assert_eq!(memo.get_or_try_compute(&1, || Ok::<u32, &str>(7)), Ok(7));
        assert_eq!(memo.get_or_try_compute(&1, || Err::<u32, &str>("late")), Ok(7));
    }
}
