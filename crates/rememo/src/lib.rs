// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! A memoizing read-through cache for async producer functions.
//!
//! [`MemoCache`] holds values in memory under composite `"{group}:{key}"`
//! keys, bounded by LRU eviction, with hard TTL expiry and an optional
//! stale-while-revalidate window. Wrapping an async function with
//! [`MemoCache::memoize`] yields a [`Memoized`] facade that answers repeat
//! calls from the cache and collapses concurrent calls for the same key into
//! a single producer run.
//!
//! An optional [`PersistentStore`] mirrors successful values so they survive
//! eviction and process restarts. The store is strictly best-effort: when it
//! fails, the cache degrades to memory-only and keeps serving.
//!
//! # Examples
//!
//! ```
//! use std::time::Duration;
//!
//! use rememo::{MemoCache, MemoizeOptions};
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//! let cache: MemoCache<String> = MemoCache::builder()
//!     .ttl(Duration::from_secs(30))
//!     .max_entries(10_000)
//!     .build()?;
//!
//! let lookup = cache.memoize("users", MemoizeOptions::default(), |id: u64| async move {
//!     Ok::<_, std::io::Error>(format!("user-{id}"))
//! })?;
//!
//! // The first call runs the producer; the second is served from cache.
//! assert_eq!(lookup.call(42).await?, "user-42");
//! assert_eq!(lookup.call(42).await?, "user-42");
//! # Ok(())
//! # }
//! ```

mod builder;
mod cache;
mod clock;
mod config;
mod error;
mod events;
mod flight;
pub mod keys;
mod memoized;
mod overlay;
mod record;
mod stats;
mod store;

pub use builder::CacheBuilder;
pub use cache::MemoCache;
pub use clock::Clock;
pub use config::{ConfigError, MemoizeOptions, SetOptions};
pub use error::{BoxError, CacheError, ProducerError};
pub use events::{CacheEvent, EventKind, EventSink};
pub use memoized::Memoized;
pub use stats::CacheStats;

pub use rememo_store::{Envelope, NullStore, PersistentStore, StoreError};
