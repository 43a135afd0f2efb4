// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Bounded in-memory record storage with LRU eviction.

use std::num::NonZeroUsize;

use lru::LruCache;

use crate::record::CacheRecord;

/// Holds resident records, evicting the least recently used entry when full.
///
/// Reads and writes both count as use. Callers serialize access externally;
/// this type itself is single-threaded by design so eviction order stays
/// strictly defined.
pub(crate) struct RecordStore<V> {
    records: LruCache<String, CacheRecord<V>>,
}

impl<V> RecordStore<V> {
    pub fn new(max_entries: NonZeroUsize) -> Self {
        Self {
            records: LruCache::new(max_entries),
        }
    }

    /// Inserts or replaces a record, evicting the LRU entry if at capacity.
    pub fn put(&mut self, composite: String, record: CacheRecord<V>) {
        self.records.put(composite, record);
    }

    /// Removes one record; returns whether it was present.
    pub fn remove(&mut self, composite: &str) -> bool {
        self.records.pop(composite).is_some()
    }

    /// Removes every record whose composite key starts with `prefix`.
    ///
    /// Linear in the number of resident entries; group clears are expected
    /// to be rare relative to reads.
    pub fn remove_by_prefix(&mut self, prefix: &str) -> usize {
        let matching: Vec<String> = self
            .records
            .iter()
            .filter(|(composite, _)| composite.starts_with(prefix))
            .map(|(composite, _)| composite.clone())
            .collect();
        for composite in &matching {
            self.records.pop(composite);
        }
        matching.len()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }
}

impl<V> RecordStore<V>
where
    V: Clone,
{
    /// Looks up a record, marking it most recently used.
    pub fn get(&mut self, composite: &str) -> Option<CacheRecord<V>> {
        self.records.get(composite).cloned()
    }
}

impl<V> std::fmt::Debug for RecordStore<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordStore")
            .field("entries", &self.records.len())
            .field("capacity", &self.records.cap())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, SystemTime};

    use super::*;

    fn store(capacity: usize) -> RecordStore<i32> {
        RecordStore::new(NonZeroUsize::new(capacity).expect("nonzero capacity"))
    }

    fn record(value: i32) -> CacheRecord<i32> {
        CacheRecord::new(
            Ok(value),
            SystemTime::now(),
            Duration::from_secs(60),
            Duration::ZERO,
        )
    }

    #[test]
    fn evicts_least_recently_used_at_capacity() {
        let mut store = store(3);
        store.put("g:a".into(), record(1));
        store.put("g:b".into(), record(2));
        store.put("g:c".into(), record(3));

        // Touch "a" so "b" becomes the eviction candidate.
        assert!(store.get("g:a").is_some());
        store.put("g:d".into(), record(4));

        assert_eq!(store.len(), 3);
        assert!(store.get("g:b").is_none());
        assert!(store.get("g:a").is_some());
        assert!(store.get("g:c").is_some());
        assert!(store.get("g:d").is_some());
    }

    #[test]
    fn replacing_a_key_does_not_evict() {
        let mut store = store(2);
        store.put("g:a".into(), record(1));
        store.put("g:b".into(), record(2));
        store.put("g:a".into(), record(10));

        assert_eq!(store.len(), 2);
        assert_eq!(store.get("g:a").and_then(|r| r.outcome.ok()), Some(10));
        assert!(store.get("g:b").is_some());
    }

    #[test]
    fn prefix_removal_only_touches_the_group() {
        let mut store = store(8);
        store.put("users:1".into(), record(1));
        store.put("users:2".into(), record(2));
        store.put("sessions:1".into(), record(3));

        assert_eq!(store.remove_by_prefix("users:"), 2);
        assert_eq!(store.len(), 1);
        assert!(store.get("sessions:1").is_some());
    }

    #[test]
    fn remove_reports_presence() {
        let mut store = store(2);
        store.put("g:a".into(), record(1));

        assert!(store.remove("g:a"));
        assert!(!store.remove("g:a"));
        assert_eq!(store.len(), 0);
    }
}
