// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Persistence contract for the `rememo` memoizing cache engine.
//!
//! This crate defines the [`PersistentStore`] trait that external key/value
//! collaborators implement so cached values can survive process restarts,
//! along with [`Envelope`] (the serialized mirror of a cache record) and
//! [`StoreError`] for fallible store operations.
//!
//! The engine treats a persistent store as a cache of last resort, never as a
//! source of truth: store failures degrade the engine to memory-only behavior
//! and are never surfaced to cache callers.
//!
//! # Implementing a Store
//!
//! ```
//! use std::collections::HashMap;
//! use std::sync::RwLock;
//! use std::time::Duration;
//!
//! use rememo_store::{Envelope, PersistentStore, StoreError};
//!
//! struct SimpleStore<V>(RwLock<HashMap<String, Envelope<V>>>);
//!
//! impl<V> PersistentStore<V> for SimpleStore<V>
//! where
//!     V: Clone + Send + Sync,
//! {
//!     async fn get(&self, key: &str) -> Result<Option<Envelope<V>>, StoreError> {
//!         Ok(self.0.read().unwrap().get(key).cloned())
//!     }
//!
//!     async fn set(&self, key: &str, envelope: Envelope<V>, _ttl: Duration) -> Result<(), StoreError> {
//!         self.0.write().unwrap().insert(key.to_owned(), envelope);
//!         Ok(())
//!     }
//!
//!     async fn remove(&self, key: &str) -> Result<bool, StoreError> {
//!         Ok(self.0.write().unwrap().remove(key).is_some())
//!     }
//!
//!     async fn keys(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
//!         Ok(self.0.read().unwrap().keys().filter(|k| k.starts_with(prefix)).cloned().collect())
//!     }
//! }
//! ```

mod envelope;
pub mod error;
mod store;
#[cfg(any(feature = "test-util", test))]
pub mod testing;

#[doc(inline)]
pub use envelope::Envelope;
#[doc(inline)]
pub use error::{Result, StoreError};
#[doc(inline)]
pub use store::{NullStore, PersistentStore};
