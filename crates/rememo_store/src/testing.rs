// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Store test doubles.
//!
//! This module provides [`MemoryStore`], a plain in-memory store usable as a
//! real collaborator in tests and demos, and [`MockStore`], which additionally
//! records all operations and supports failure injection for exercising
//! persistence-degradation paths.

use std::{collections::HashMap, sync::Arc, time::Duration};

use parking_lot::Mutex;

use crate::{Envelope, PersistentStore, StoreError};

/// A plain in-memory persistent store.
///
/// Ignores the write TTL (entries live until removed), which is fine for its
/// purpose: the engine re-checks envelope expiry on every hydration anyway.
///
/// # Examples
///
/// ```
/// use std::time::{Duration, SystemTime};
///
/// use rememo_store::{Envelope, PersistentStore, testing::MemoryStore};
///
/// # futures::executor::block_on(async {
/// let store = MemoryStore::<i32>::new();
/// let now = SystemTime::now();
///
/// store.set("g:k", Envelope::new(42, now, now), Duration::from_secs(60)).await?;
/// assert_eq!(store.get("g:k").await?.map(|e| e.value), Some(42));
/// # Ok::<(), rememo_store::StoreError>(())
/// # });
/// ```
#[derive(Debug, Default)]
pub struct MemoryStore<V> {
    data: Arc<Mutex<HashMap<String, Envelope<V>>>>,
}

impl<V> Clone for MemoryStore<V> {
    fn clone(&self) -> Self {
        Self {
            data: Arc::clone(&self.data),
        }
    }
}

impl<V> MemoryStore<V> {
    /// Creates a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            data: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Returns the number of stored envelopes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.lock().len()
    }

    /// Returns `true` if the store holds no envelopes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.lock().is_empty()
    }

    /// Returns `true` if the store holds an envelope for the key.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.data.lock().contains_key(key)
    }
}

impl<V> PersistentStore<V> for MemoryStore<V>
where
    V: Clone + Send + Sync,
{
    async fn get(&self, key: &str) -> Result<Option<Envelope<V>>, StoreError> {
        Ok(self.data.lock().get(key).cloned())
    }

    async fn set(&self, key: &str, envelope: Envelope<V>, _ttl: Duration) -> Result<(), StoreError> {
        self.data.lock().insert(key.to_owned(), envelope);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<bool, StoreError> {
        Ok(self.data.lock().remove(key).is_some())
    }

    async fn keys(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        Ok(self.data.lock().keys().filter(|k| k.starts_with(prefix)).cloned().collect())
    }
}

/// Recorded store operation with full context.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreOp<V> {
    /// A get operation was performed with the given key.
    Get(String),
    /// A set operation was performed.
    Set {
        /// The key that was written.
        key: String,
        /// The envelope that was written.
        envelope: Envelope<V>,
        /// The useful lifetime passed alongside the write.
        ttl: Duration,
    },
    /// A remove operation was performed with the given key.
    Remove(String),
    /// A prefix scan was performed with the given prefix.
    Keys(String),
}

type FailPredicate<V> = Box<dyn Fn(&StoreOp<V>) -> bool + Send + Sync>;

/// A configurable mock store for testing.
///
/// Stores envelopes in memory, records every operation for later
/// verification, and can be configured to fail operations on demand — the
/// engine must swallow those failures and degrade to memory-only behavior.
///
/// # Examples
///
/// ```
/// use rememo_store::{PersistentStore, testing::{MockStore, StoreOp}};
///
/// # futures::executor::block_on(async {
/// let store = MockStore::<i32>::new();
///
/// // Fail only reads
/// store.fail_when(|op| matches!(op, StoreOp::Get(_)));
/// assert!(store.get("g:k").await.is_err());
/// assert_eq!(store.operations(), vec![StoreOp::Get("g:k".to_string())]);
/// # });
/// ```
pub struct MockStore<V> {
    inner: MemoryStore<V>,
    operations: Arc<Mutex<Vec<StoreOp<V>>>>,
    fail_when: Arc<Mutex<Option<FailPredicate<V>>>>,
}

impl<V> std::fmt::Debug for MockStore<V>
where
    V: std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockStore")
            .field("inner", &self.inner)
            .field("operations", &self.operations)
            .field("fail_when", &self.fail_when.lock().is_some())
            .finish()
    }
}

impl<V> Clone for MockStore<V> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            operations: Arc::clone(&self.operations),
            fail_when: Arc::clone(&self.fail_when),
        }
    }
}

impl<V> Default for MockStore<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> MockStore<V> {
    /// Creates a new empty mock store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: MemoryStore::new(),
            operations: Arc::new(Mutex::new(Vec::new())),
            fail_when: Arc::new(Mutex::new(None)),
        }
    }

    /// Returns the number of stored envelopes.
    #[must_use]
    pub fn envelope_count(&self) -> usize {
        self.inner.len()
    }

    /// Returns `true` if the store holds an envelope for the key.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.inner.contains_key(key)
    }

    /// Sets a predicate that determines when operations should fail.
    pub fn fail_when<F>(&self, predicate: F)
    where
        F: Fn(&StoreOp<V>) -> bool + Send + Sync + 'static,
    {
        *self.fail_when.lock() = Some(Box::new(predicate));
    }

    /// Clears the failure predicate, allowing all operations to succeed.
    pub fn clear_failures(&self) {
        *self.fail_when.lock() = None;
    }

    fn should_fail(&self, op: &StoreOp<V>) -> bool {
        self.fail_when.lock().as_ref().is_some_and(|predicate| predicate(op))
    }

    fn record(&self, op: StoreOp<V>) {
        self.operations.lock().push(op);
    }
}

impl<V> MockStore<V>
where
    V: Clone,
{
    /// Returns a clone of all recorded operations.
    #[must_use]
    pub fn operations(&self) -> Vec<StoreOp<V>> {
        self.operations.lock().clone()
    }

    /// Clears all recorded operations.
    pub fn clear_operations(&self) {
        self.operations.lock().clear();
    }
}

impl<V> PersistentStore<V> for MockStore<V>
where
    V: Clone + Send + Sync,
{
    async fn get(&self, key: &str) -> Result<Option<Envelope<V>>, StoreError> {
        let op = StoreOp::Get(key.to_owned());
        let fail = self.should_fail(&op);
        self.record(op);
        if fail {
            return Err(StoreError::message("mock: get failed"));
        }
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, envelope: Envelope<V>, ttl: Duration) -> Result<(), StoreError> {
        let op = StoreOp::Set {
            key: key.to_owned(),
            envelope: envelope.clone(),
            ttl,
        };
        let fail = self.should_fail(&op);
        self.record(op);
        if fail {
            return Err(StoreError::message("mock: set failed"));
        }
        self.inner.set(key, envelope, ttl).await
    }

    async fn remove(&self, key: &str) -> Result<bool, StoreError> {
        let op = StoreOp::Remove(key.to_owned());
        let fail = self.should_fail(&op);
        self.record(op);
        if fail {
            return Err(StoreError::message("mock: remove failed"));
        }
        self.inner.remove(key).await
    }

    async fn keys(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        let op = StoreOp::Keys(prefix.to_owned());
        let fail = self.should_fail(&op);
        self.record(op);
        if fail {
            return Err(StoreError::message("mock: keys failed"));
        }
        self.inner.keys(prefix).await
    }
}
