// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! The memoizing facade over a producer function.

use std::sync::Arc;

use futures::{future::BoxFuture, FutureExt};
use rememo_store::{NullStore, PersistentStore};

use crate::{
    cache::{Inner, Looked},
    config::Policy,
    error::{BoxError, CacheError, ProducerError},
    events::{CacheEvent, EventKind},
    keys,
    record::CacheRecord,
};

type ProducerFn<A, V> = dyn Fn(A) -> BoxFuture<'static, Result<V, BoxError>> + Send + Sync;
type KeyFn<A> = dyn Fn(&A) -> String + Send + Sync;

/// A producer function wrapped in read-through caching.
///
/// Built with [`MemoCache::memoize`](crate::MemoCache::memoize) or
/// [`memoize_with`](crate::MemoCache::memoize_with). Each call derives a key
/// from its arguments, answers from the cache when it can, and otherwise
/// runs the producer exactly once per key no matter how many callers arrive
/// concurrently.
///
/// Cloning is cheap; clones share the producer and the cache.
pub struct Memoized<A, V, P = NullStore> {
    inner: Arc<Inner<V, P>>,
    group: String,
    policy: Policy,
    key_fn: Arc<KeyFn<A>>,
    producer: Arc<ProducerFn<A, V>>,
}

impl<A, V, P> Clone for Memoized<A, V, P> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            group: self.group.clone(),
            policy: self.policy,
            key_fn: Arc::clone(&self.key_fn),
            producer: Arc::clone(&self.producer),
        }
    }
}

impl<A, V, P> std::fmt::Debug for Memoized<A, V, P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Memoized")
            .field("group", &self.group)
            .finish_non_exhaustive()
    }
}

impl<A, V, P> Memoized<A, V, P>
where
    A: Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
    P: PersistentStore<V> + 'static,
{
    pub(crate) fn new<KF, F, Fut, E>(
        inner: Arc<Inner<V, P>>,
        group: &str,
        policy: Policy,
        key_fn: KF,
        producer: F,
    ) -> Self
    where
        KF: Fn(&A) -> String + Send + Sync + 'static,
        F: Fn(A) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<V, E>> + Send + 'static,
        E: Into<BoxError>,
    {
        let producer = Arc::new(move |args: A| {
            let fut = producer(args);
            async move { fut.await.map_err(Into::into) }.boxed()
        });
        Self {
            inner,
            group: group.to_string(),
            policy,
            key_fn: Arc::new(key_fn),
            producer,
        }
    }

    /// Calls through the cache.
    ///
    /// A fresh cached result is returned immediately. A stale one is
    /// returned immediately too, with a single background refresh kicked off
    /// for the key. On a miss the producer runs, deduplicated with every
    /// concurrent caller for the same key; the computation always runs to
    /// completion and lands in the cache, even if this caller stops waiting.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Produce`] when the producer fails, whether
    /// freshly or served from a memoized failure.
    pub async fn call(&self, args: A) -> Result<V, CacheError> {
        let key = (self.key_fn)(&args);
        let composite = keys::compose(&self.group, &key);

        match self.inner.lookup(&composite).await {
            Looked::Fresh(record) => {
                self.inner.stats.record_hit();
                self.inner
                    .events
                    .emit(CacheEvent::new(EventKind::Hit, &self.group, &key));
                record.outcome.map_err(CacheError::Produce)
            }
            Looked::Stale(record) => {
                self.inner.stats.record_hit();
                self.inner
                    .events
                    .emit(CacheEvent::stale_hit(&self.group, &key));
                tracing::debug!(
                    key = composite,
                    age = ?record.age(self.inner.clock.now()),
                    "serving stale value while refreshing"
                );
                self.refresh_in_background(&composite, &key, args);
                record.outcome.map_err(CacheError::Produce)
            }
            Looked::Miss => {
                self.inner.stats.record_miss();
                self.inner
                    .events
                    .emit(CacheEvent::new(EventKind::Miss, &self.group, &key));
                let flight = self
                    .inner
                    .flights
                    .join_or_launch(&composite, || self.produce(composite.clone(), key, args));
                flight.await
            }
        }
    }

    /// Removes any cached result for these arguments, in memory and in the
    /// persistent store. Returns whether an entry was resident in memory.
    pub async fn invalidate(&self, args: &A) -> bool {
        let key = (self.key_fn)(args);
        let composite = keys::compose(&self.group, &key);
        let removed = self.inner.records.lock().remove(&composite);
        if let Some(overlay) = &self.inner.overlay {
            overlay.remove(&composite).await;
        }
        self.inner
            .events
            .emit(CacheEvent::new(EventKind::Invalidate, &self.group, &key));
        removed
    }

    /// Launches a refresh unless one is already in flight for the key.
    fn refresh_in_background(&self, composite: &str, key: &str, args: A) {
        let flight = self.inner.flights.join_or_launch(composite, || {
            self.produce(composite.to_string(), key.to_string(), args)
        });
        drop(flight);
    }

    /// The producer run for one key, detached from any particular caller.
    fn produce(
        &self,
        composite: String,
        key: String,
        args: A,
    ) -> impl Future<Output = Result<V, CacheError>> + Send + 'static {
        let inner = Arc::clone(&self.inner);
        let producer = Arc::clone(&self.producer);
        let group = self.group.clone();
        let policy = self.policy;

        async move {
            match producer(args).await {
                Ok(value) => {
                    let record = CacheRecord::new(
                        Ok(value.clone()),
                        inner.clock.now(),
                        policy.ttl,
                        policy.swr,
                    );
                    inner.commit(&composite, record, &group, &key);
                    Ok(value)
                }
                Err(cause) => {
                    let error = ProducerError::new(cause);
                    if policy.cache_errors {
                        let record = CacheRecord::new(
                            Err(error.clone()),
                            inner.clock.now(),
                            policy.ttl,
                            policy.swr,
                        );
                        inner.commit(&composite, record, &group, &key);
                    }
                    Err(CacheError::Produce(error))
                }
            }
        }
    }
}
