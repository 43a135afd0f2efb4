// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Persistence overlay with degrade-on-failure semantics.
//!
//! The overlay mirrors successful values into a [`PersistentStore`] and
//! hydrates misses from it. The store is strictly an accelerator: every
//! failure it produces is swallowed, logged, and surfaced as a
//! `cache:persist-error` event, and the cache continues memory-only.

use std::{marker::PhantomData, sync::Arc, time::Duration};

use rememo_store::{Envelope, PersistentStore, StoreError};

use crate::events::{CacheEvent, EventKind, EventPublisher};

pub(crate) struct Overlay<V, P> {
    store: Arc<P>,
    events: EventPublisher,
    _value: PhantomData<fn() -> V>,
}

impl<V, P> Clone for Overlay<V, P> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            events: self.events.clone(),
            _value: PhantomData,
        }
    }
}

impl<V, P> std::fmt::Debug for Overlay<V, P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Overlay").finish_non_exhaustive()
    }
}

impl<V, P> Overlay<V, P>
where
    V: Send + Sync,
    P: PersistentStore<V>,
{
    pub fn new(store: Arc<P>, events: EventPublisher) -> Self {
        Self {
            store,
            events,
            _value: PhantomData,
        }
    }

    /// Fetches a persisted envelope; `None` on absence or failure.
    pub async fn read(&self, composite: &str) -> Option<Envelope<V>> {
        match self.store.get(composite).await {
            Ok(found) => found,
            Err(error) => {
                self.degraded("get", composite, &error);
                None
            }
        }
    }

    /// Mirrors an envelope into the store; failures are dropped.
    pub async fn write(&self, composite: &str, envelope: Envelope<V>, ttl: Duration) {
        if let Err(error) = self.store.set(composite, envelope, ttl).await {
            self.degraded("set", composite, &error);
        }
    }

    /// Removes one persisted entry; failures are dropped.
    pub async fn remove(&self, composite: &str) {
        if let Err(error) = self.store.remove(composite).await {
            self.degraded("remove", composite, &error);
        }
    }

    /// Removes every persisted entry under `prefix`; failures are dropped.
    pub async fn remove_prefix(&self, prefix: &str) {
        let keys = match self.store.keys(prefix).await {
            Ok(keys) => keys,
            Err(error) => {
                self.degraded("keys", prefix, &error);
                return;
            }
        };
        for composite in keys {
            if let Err(error) = self.store.remove(&composite).await {
                self.degraded("remove", &composite, &error);
            }
        }
    }

    fn degraded(&self, operation: &str, composite: &str, error: &StoreError) {
        tracing::warn!(operation, key = composite, %error, "persistence degraded, continuing memory-only");
        let (group, key) = composite.split_once(':').unwrap_or((composite, "*"));
        self.events
            .emit(CacheEvent::new(EventKind::PersistError, group, key));
    }
}
