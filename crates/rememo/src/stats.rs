// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Lightweight operation counters.

use std::sync::atomic::{AtomicU64, Ordering};

/// Internal counters, bumped with relaxed ordering; exact cross-thread
/// interleaving is not observable through the snapshot anyway.
#[derive(Debug, Default)]
pub(crate) struct StatsCounters {
    hits: AtomicU64,
    misses: AtomicU64,
    sets: AtomicU64,
}

impl StatsCounters {
    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_set(&self) {
        self.sets.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self, entries: usize, in_flight: usize) -> CacheStats {
        CacheStats {
            entries,
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            sets: self.sets.load(Ordering::Relaxed),
            in_flight,
        }
    }
}

/// A point-in-time snapshot of cache activity.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CacheStats {
    /// Entries currently resident in memory.
    pub entries: usize,
    /// Reads answered from the cache, fresh or stale.
    pub hits: u64,
    /// Reads that found nothing usable.
    pub misses: u64,
    /// Values stored, whether by producers, direct writes, or refreshes.
    pub sets: u64,
    /// Computations currently in flight.
    pub in_flight: usize,
}
