//! A map sharded into independently locked buckets, used by the parallel
//! search path to accumulate per-document relevance without a single global
//! lock. Writers touching different buckets never block each other.

use parking_lot::Mutex;
use std::collections::hash_map::DefaultHasher;
use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};

/// Fixed-bucket-count concurrent map. Each bucket owns an ordered map
/// guarded by its own mutex; a key's bucket is `hash(key) % bucket_count`.
pub struct ConcurrentMap<K, V> {
    buckets: Vec<Mutex<BTreeMap<K, V>>>,
}

impl<K: Ord + Hash, V: Default> ConcurrentMap<K, V> {
    /// Creates a map with `bucket_count` independently locked buckets.
    ///
    /// # Panics
    /// Panics if `bucket_count` is zero.
    pub fn new(bucket_count: usize) -> Self {
        assert!(bucket_count > 0, "bucket count must be positive");
        Self {
            buckets: (0..bucket_count).map(|_| Mutex::new(BTreeMap::new())).collect(),
        }
    }

    /// Applies `apply` to the value stored under `key`, inserting
    /// `V::default()` first when the key is new. Only the owning bucket is
    /// locked for the duration of the closure.
    pub fn update<F>(&self, key: K, apply: F)
    where
        F: FnOnce(&mut V),
    {
        let mut bucket = self.buckets[self.bucket_index(&key)].lock();
        apply(bucket.entry(key).or_default());
    }

    /// Merges every bucket into a single ordered map. Consuming `self` is
    /// the synchronization barrier: no writer can still hold a reference
    /// once the map has been moved here.
    pub fn into_ordinary_map(self) -> BTreeMap<K, V> {
        let mut merged = BTreeMap::new();
        for bucket in self.buckets {
            merged.append(&mut bucket.into_inner());
        }
        merged
    }

    fn bucket_index(&self, key: &K) -> usize {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        hasher.finish() as usize % self.buckets.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rayon::prelude::*;

    #[test]
    fn accumulates_under_one_key() {
        let map: ConcurrentMap<i32, f64> = ConcurrentMap::new(4);
        map.update(7, |value| *value += 0.5);
        map.update(7, |value| *value += 0.25);
        let merged = map.into_ordinary_map();
        assert_eq!(merged.len(), 1);
        assert!((merged[&7] - 0.75).abs() < f64::EPSILON);
    }

    #[test]
    fn concurrent_increments_are_not_lost() {
        let map: ConcurrentMap<i32, u64> = ConcurrentMap::new(8);
        (0..1000).into_par_iter().for_each(|i| {
            map.update(i % 10, |value| *value += 1);
        });
        let merged = map.into_ordinary_map();
        assert_eq!(merged.len(), 10);
        assert_eq!(merged.values().sum::<u64>(), 1000);
        assert!(merged.values().all(|&count| count == 100));
    }

    #[test]
    fn merge_keeps_every_bucket() {
        let map: ConcurrentMap<i32, u64> = ConcurrentMap::new(3);
        for key in 0..100 {
            map.update(key, |value| *value = key as u64);
        }
        let merged = map.into_ordinary_map();
        assert_eq!(merged.len(), 100);
        // BTreeMap merge yields ascending key order.
        let keys: Vec<i32> = merged.keys().copied().collect();
        assert_eq!(keys, (0..100).collect::<Vec<_>>());
    }

    #[test]
    #[should_panic(expected = "bucket count must be positive")]
    fn zero_buckets_is_a_caller_bug() {
        let _: ConcurrentMap<i32, u64> = ConcurrentMap::new(0);
    }
}
