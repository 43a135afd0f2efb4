// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! The core trait for persistent key/value collaborators.

use std::time::Duration;

use crate::{Envelope, StoreError};

/// Trait for persistent key/value stores that mirror cache records.
///
/// The engine consults a store on in-memory misses (hydrate-on-miss) and
/// mirrors successful writes to it. Keys are the engine's composite keys, so
/// a store only needs flat string-keyed operations plus a prefix scan for
/// group-level clears.
///
/// Implementations must be safely concurrent or externally synchronized; the
/// engine calls them from multiple tasks without additional locking.
pub trait PersistentStore<V>: Send + Sync {
    /// Reads the envelope for a key, returning `None` when absent.
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<Envelope<V>>, StoreError>> + Send;

    /// Writes an envelope for a key.
    ///
    /// The `ttl` is the total useful lifetime of the envelope (through the
    /// end of its stale window); stores with native expiry should use it so
    /// dead envelopes are reclaimed without engine involvement.
    fn set(&self, key: &str, envelope: Envelope<V>, ttl: Duration) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Removes a key, returning `true` if it was present.
    fn remove(&self, key: &str) -> impl Future<Output = Result<bool, StoreError>> + Send;

    /// Lists the stored keys starting with the given prefix.
    fn keys(&self, prefix: &str) -> impl Future<Output = Result<Vec<String>, StoreError>> + Send;
}

/// A no-op store for engines configured without persistence.
///
/// Every read misses and every write succeeds without storing anything. This
/// keeps the unpersisted engine the same type shape as a persisted one.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullStore;

impl<V> PersistentStore<V> for NullStore
where
    V: Send + Sync,
{
    async fn get(&self, _key: &str) -> Result<Option<Envelope<V>>, StoreError> {
        Ok(None)
    }

    async fn set(&self, _key: &str, _envelope: Envelope<V>, _ttl: Duration) -> Result<(), StoreError> {
        Ok(())
    }

    async fn remove(&self, _key: &str) -> Result<bool, StoreError> {
        Ok(false)
    }

    async fn keys(&self, _prefix: &str) -> Result<Vec<String>, StoreError> {
        Ok(Vec::new())
    }
}
