// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Builder for configuring a [`MemoCache`].

use std::{marker::PhantomData, num::NonZeroUsize, sync::Arc, time::Duration};

use rememo_store::{NullStore, PersistentStore};

use crate::{
    cache::MemoCache,
    clock::Clock,
    config::{ConfigError, Policy},
    events::{EventPublisher, EventSink},
};

const DEFAULT_MAX_ENTRIES: usize = 1024;

/// Configures and builds a [`MemoCache`].
///
/// A cache starts without persistence ([`NullStore`]); attaching a store with
/// [`persistence`](Self::persistence) changes the builder's store type, the
/// same way the eventual cache is typed by its store.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// use rememo::MemoCache;
///
/// # fn build() -> Result<(), rememo::ConfigError> {
/// let cache: MemoCache<String> = MemoCache::builder()
///     .ttl(Duration::from_secs(30))
///     .swr(Duration::from_secs(120))
///     .max_entries(10_000)
///     .build()?;
/// # Ok(())
/// # }
/// ```
pub struct CacheBuilder<V, P = NullStore> {
    clock: Clock,
    ttl: Option<Duration>,
    swr: Duration,
    max_entries: usize,
    cache_errors: bool,
    store: Option<Arc<P>>,
    events: Option<Arc<dyn EventSink>>,
    _value: PhantomData<fn() -> V>,
}

impl<V> CacheBuilder<V> {
    pub(crate) fn new() -> Self {
        Self {
            clock: Clock::system(),
            ttl: None,
            swr: Duration::ZERO,
            max_entries: DEFAULT_MAX_ENTRIES,
            cache_errors: false,
            store: None,
            events: None,
            _value: PhantomData,
        }
    }
}

impl<V, P> CacheBuilder<V, P> {
    /// Sets the default hard time-to-live for every entry.
    ///
    /// Required; [`build`](Self::build) fails without it.
    #[must_use]
    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    /// Sets the default stale-while-revalidate window.
    ///
    /// Zero (the default) disables stale serving: entries expire hard at
    /// their TTL.
    #[must_use]
    pub fn swr(mut self, swr: Duration) -> Self {
        self.swr = swr;
        self
    }

    /// Caps the number of resident entries; least recently used entries are
    /// evicted beyond this.
    #[must_use]
    pub fn max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = max_entries;
        self
    }

    /// Memoizes producer failures for the TTL by default.
    ///
    /// Off by default: failures propagate but are not cached, so the next
    /// call retries the producer.
    #[must_use]
    pub fn cache_errors(mut self, cache_errors: bool) -> Self {
        self.cache_errors = cache_errors;
        self
    }

    /// Substitutes the time source; tests use a frozen [`Clock`].
    #[must_use]
    pub fn clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Attaches an observer for cache lifecycle events.
    #[must_use]
    pub fn events(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.events = Some(sink);
        self
    }

    /// Attaches a persistent store; values survive beyond memory eviction
    /// and process restarts.
    #[must_use]
    pub fn persistence<P2>(self, store: P2) -> CacheBuilder<V, P2>
    where
        P2: PersistentStore<V>,
    {
        CacheBuilder {
            clock: self.clock,
            ttl: self.ttl,
            swr: self.swr,
            max_entries: self.max_entries,
            cache_errors: self.cache_errors,
            store: Some(Arc::new(store)),
            events: self.events,
            _value: PhantomData,
        }
    }
}

impl<V, P> CacheBuilder<V, P>
where
    V: Clone + Send + Sync + 'static,
    P: PersistentStore<V> + 'static,
{
    /// Builds the cache.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingTtl`] if no TTL was set,
    /// [`ConfigError::ZeroTtl`] for a zero TTL, and
    /// [`ConfigError::ZeroCapacity`] for a zero entry cap.
    pub fn build(self) -> Result<MemoCache<V, P>, ConfigError> {
        let ttl = self.ttl.ok_or(ConfigError::MissingTtl)?;
        if ttl.is_zero() {
            return Err(ConfigError::ZeroTtl);
        }
        let max_entries = NonZeroUsize::new(self.max_entries).ok_or(ConfigError::ZeroCapacity)?;

        let defaults = Policy {
            ttl,
            swr: self.swr,
            cache_errors: self.cache_errors,
        };
        let events = EventPublisher::new(self.events);
        Ok(MemoCache::assemble(
            self.clock,
            defaults,
            max_entries,
            self.store,
            events,
        ))
    }
}

impl<V, P> std::fmt::Debug for CacheBuilder<V, P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheBuilder")
            .field("ttl", &self.ttl)
            .field("swr", &self.swr)
            .field("max_entries", &self.max_entries)
            .field("cache_errors", &self.cache_errors)
            .field("persistence", &self.store.is_some())
            .finish_non_exhaustive()
    }
}
