// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! The cache facade and its shared core.

use std::{num::NonZeroUsize, sync::Arc};

use parking_lot::Mutex;
use rememo_store::{NullStore, PersistentStore};
use serde::Serialize;

use crate::{
    builder::CacheBuilder,
    clock::Clock,
    config::{ConfigError, MemoizeOptions, Policy, SetOptions},
    error::BoxError,
    events::{CacheEvent, EventKind, EventPublisher},
    flight::FlightMap,
    keys,
    memoized::Memoized,
    overlay::Overlay,
    record::{CacheRecord, Freshness},
    stats::{CacheStats, StatsCounters},
    store::RecordStore,
};

/// A bounded, memoizing read-through cache.
///
/// Values are held in memory under composite `"{group}:{key}"` keys, expire
/// on a hard TTL with an optional stale-while-revalidate window, and are
/// evicted least-recently-used beyond the configured capacity. An optional
/// persistent store mirrors successful values and re-hydrates them after
/// eviction or restart.
///
/// Cloning is cheap; clones share the same cache.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// use rememo::{MemoCache, SetOptions};
///
/// # async fn demo() -> Result<(), rememo::ConfigError> {
/// let cache: MemoCache<String> = MemoCache::builder()
///     .ttl(Duration::from_secs(30))
///     .build()?;
///
/// cache.set("users", "42", "Ada".to_string(), SetOptions::default()).await?;
/// assert_eq!(cache.get("users", "42").await.as_deref(), Some("Ada"));
/// # Ok(())
/// # }
/// ```
pub struct MemoCache<V, P = NullStore> {
    inner: Arc<Inner<V, P>>,
}

impl<V, P> Clone for MemoCache<V, P> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<V, P> std::fmt::Debug for MemoCache<V, P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoCache")
            .field("entries", &self.inner.records.lock().len())
            .finish_non_exhaustive()
    }
}

pub(crate) struct Inner<V, P> {
    pub records: Mutex<RecordStore<V>>,
    pub flights: Arc<FlightMap<V>>,
    pub overlay: Option<Overlay<V, P>>,
    pub events: EventPublisher,
    pub clock: Clock,
    pub defaults: Policy,
    pub stats: StatsCounters,
}

/// What a lookup found, after checking memory and the overlay.
pub(crate) enum Looked<V> {
    Fresh(CacheRecord<V>),
    Stale(CacheRecord<V>),
    Miss,
}

impl<V, P> Inner<V, P>
where
    V: Clone + Send + Sync + 'static,
    P: PersistentStore<V> + 'static,
{
    /// Finds a usable record for `composite`, hydrating from the overlay on
    /// a memory miss. Expired records are dropped on discovery.
    pub async fn lookup(&self, composite: &str) -> Looked<V> {
        let now = self.clock.now();
        {
            let mut records = self.records.lock();
            if let Some(record) = records.get(composite) {
                match record.freshness(now) {
                    Freshness::Fresh => return Looked::Fresh(record),
                    Freshness::Stale => return Looked::Stale(record),
                    Freshness::Expired => {
                        records.remove(composite);
                    }
                }
            }
        }

        let Some(overlay) = &self.overlay else {
            return Looked::Miss;
        };
        let Some(envelope) = overlay.read(composite).await else {
            return Looked::Miss;
        };
        if !envelope.usable_at(now) {
            return Looked::Miss;
        }

        tracing::trace!(key = composite, "hydrated from persistent store");
        let hydrated = CacheRecord::from_envelope(envelope, now);
        let found = match hydrated.freshness(now) {
            Freshness::Fresh => Looked::Fresh(hydrated.clone()),
            Freshness::Stale => Looked::Stale(hydrated.clone()),
            Freshness::Expired => return Looked::Miss,
        };

        // A write or delete may have landed while the overlay read was in
        // flight; anything resident now is newer than the envelope and wins.
        let mut records = self.records.lock();
        if let Some(existing) = records.get(composite) {
            match existing.freshness(now) {
                Freshness::Fresh => return Looked::Fresh(existing),
                Freshness::Stale => return Looked::Stale(existing),
                Freshness::Expired => {}
            }
        }
        records.put(composite.to_string(), hydrated);
        found
    }

    /// Stores a record, mirrors successful values into the overlay, and
    /// announces the write.
    pub fn commit(self: &Arc<Self>, composite: &str, record: CacheRecord<V>, group: &str, key: &str) {
        let envelope = record.to_envelope();
        let remaining = record.remaining_life(self.clock.now());
        self.records.lock().put(composite.to_string(), record);
        self.stats.record_set();
        self.events.emit(CacheEvent::new(EventKind::Set, group, key));
        tracing::debug!(key = composite, "record stored");

        // Mirrored writes are fire-and-forget; a failed or slow store never
        // stalls the caller.
        if let (Some(overlay), Some(envelope)) = (&self.overlay, envelope) {
            let overlay = overlay.clone();
            let composite = composite.to_string();
            drop(tokio::spawn(async move {
                overlay.write(&composite, envelope, remaining).await;
            }));
        }
    }
}

impl<V> MemoCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    /// Starts configuring a cache.
    #[must_use]
    pub fn builder() -> CacheBuilder<V> {
        CacheBuilder::new()
    }
}

impl<V, P> MemoCache<V, P>
where
    V: Clone + Send + Sync + 'static,
    P: PersistentStore<V> + 'static,
{
    pub(crate) fn assemble(
        clock: Clock,
        defaults: Policy,
        max_entries: NonZeroUsize,
        store: Option<Arc<P>>,
        events: EventPublisher,
    ) -> Self {
        let overlay = store.map(|store| Overlay::new(store, events.clone()));
        Self {
            inner: Arc::new(Inner {
                records: Mutex::new(RecordStore::new(max_entries)),
                flights: Arc::new(FlightMap::new()),
                overlay,
                events,
                clock,
                defaults,
                stats: StatsCounters::default(),
            }),
        }
    }

    /// Reads a value directly, without going through a producer.
    ///
    /// Returns fresh and stale values alike; entries past their stale window
    /// (and memoized failures) read as absent. Falls back to the persistent
    /// store on a memory miss.
    pub async fn get(&self, group: &str, key: &str) -> Option<V> {
        let composite = keys::compose(group, key);
        let (outcome, stale) = match self.inner.lookup(&composite).await {
            Looked::Fresh(record) => (Some(record.outcome), false),
            Looked::Stale(record) => (Some(record.outcome), true),
            Looked::Miss => (None, false),
        };
        match outcome {
            Some(Ok(value)) => {
                self.inner.stats.record_hit();
                let event = if stale {
                    CacheEvent::stale_hit(group, key)
                } else {
                    CacheEvent::new(EventKind::Hit, group, key)
                };
                self.inner.events.emit(event);
                Some(value)
            }
            // A memoized failure reads as absent here, so it counts as a
            // miss, not a hit the caller never saw.
            Some(Err(_)) | None => {
                self.inner.stats.record_miss();
                self.inner.events.emit(CacheEvent::new(EventKind::Miss, group, key));
                None
            }
        }
    }

    /// Stores a value directly.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ZeroTtl`] if the per-call TTL override is zero.
    pub async fn set(
        &self,
        group: &str,
        key: &str,
        value: V,
        options: SetOptions,
    ) -> Result<(), ConfigError> {
        let ttl = options.ttl.unwrap_or(self.inner.defaults.ttl);
        if ttl.is_zero() {
            return Err(ConfigError::ZeroTtl);
        }
        let swr = options.swr.unwrap_or(self.inner.defaults.swr);

        let composite = keys::compose(group, key);
        let record = CacheRecord::new(Ok(value), self.inner.clock.now(), ttl, swr);
        self.inner.commit(&composite, record, group, key);
        Ok(())
    }

    /// Removes one entry from memory and the persistent store.
    ///
    /// Returns whether the entry was resident in memory. Unlike mirrored
    /// writes, the persistent removal is awaited so a subsequent miss cannot
    /// re-hydrate the deleted value.
    pub async fn delete(&self, group: &str, key: &str) -> bool {
        let composite = keys::compose(group, key);
        let removed = self.inner.records.lock().remove(&composite);
        if let Some(overlay) = &self.inner.overlay {
            overlay.remove(&composite).await;
        }
        self.inner
            .events
            .emit(CacheEvent::new(EventKind::Invalidate, group, key));
        removed
    }

    /// Removes every entry in `group`, or the whole cache when `None`.
    pub async fn clear(&self, group: Option<&str>) {
        let prefix = group.map(keys::group_prefix).unwrap_or_default();
        self.inner.records.lock().remove_by_prefix(&prefix);
        if let Some(overlay) = &self.inner.overlay {
            overlay.remove_prefix(&prefix).await;
        }
        self.inner.events.emit(CacheEvent::new(
            EventKind::Invalidate,
            group.unwrap_or("*"),
            "*",
        ));
    }

    /// Whether a usable (fresh or stale) entry is resident in memory.
    #[must_use]
    pub fn contains(&self, group: &str, key: &str) -> bool {
        let composite = keys::compose(group, key);
        let now = self.inner.clock.now();
        let mut records = self.inner.records.lock();
        match records.get(&composite) {
            Some(record) if record.freshness(now) != Freshness::Expired => true,
            Some(_) => {
                records.remove(&composite);
                false
            }
            None => false,
        }
    }

    /// Number of entries resident in memory, expired or not.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.records.lock().len()
    }

    /// Whether no entries are resident in memory.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// A snapshot of activity counters.
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        self.inner
            .stats
            .snapshot(self.len(), self.inner.flights.in_flight())
    }

    /// Wraps an async producer in a memoizing facade keyed by the
    /// serialized argument.
    ///
    /// Concurrent calls with equal arguments share one producer run; results
    /// are cached under `group` for the resolved TTL.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the option overrides are unusable.
    pub fn memoize<A, F, Fut, E>(
        &self,
        group: &str,
        options: MemoizeOptions,
        producer: F,
    ) -> Result<Memoized<A, V, P>, ConfigError>
    where
        A: Serialize + Clone + Send + Sync + 'static,
        F: Fn(A) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = Result<V, E>> + Send + 'static,
        E: Into<BoxError>,
    {
        self.memoize_with(group, options, |args: &A| keys::canonical(args), producer)
    }

    /// Like [`memoize`](Self::memoize), with an explicit key derivation
    /// function instead of serialized arguments.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the option overrides are unusable.
    pub fn memoize_with<A, KF, F, Fut, E>(
        &self,
        group: &str,
        options: MemoizeOptions,
        key_fn: KF,
        producer: F,
    ) -> Result<Memoized<A, V, P>, ConfigError>
    where
        A: Clone + Send + Sync + 'static,
        KF: Fn(&A) -> String + Send + Sync + 'static,
        F: Fn(A) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = Result<V, E>> + Send + 'static,
        E: Into<BoxError>,
    {
        let policy = Policy::resolve(
            Some(self.inner.defaults.ttl),
            self.inner.defaults.swr,
            self.inner.defaults.cache_errors,
            options,
        )?;
        Ok(Memoized::new(
            Arc::clone(&self.inner),
            group,
            policy,
            key_fn,
            producer,
        ))
    }
}
