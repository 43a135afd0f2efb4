// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Persistence overlay behavior: mirroring, hydration, and degradation.

mod common;

use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};

use common::{eventually, RecordingSink};
use rememo::{Clock, EventKind, MemoCache, MemoizeOptions, SetOptions};
use rememo_store::testing::{MemoryStore, MockStore, StoreOp};
use rememo_store::{Envelope, PersistentStore, StoreError};
use tokio::sync::Notify;

const TTL: Duration = Duration::from_secs(3);
const SWR: Duration = Duration::from_secs(7);

fn persisted_cache(
    store: MockStore<String>,
    max_entries: usize,
    clock: &Clock,
) -> MemoCache<String, MockStore<String>> {
    MemoCache::builder()
        .ttl(TTL)
        .swr(SWR)
        .max_entries(max_entries)
        .clock(clock.clone())
        .persistence(store)
        .build()
        .expect("valid configuration")
}

#[tokio::test]
async fn successful_writes_are_mirrored_with_their_remaining_life() {
    let clock = Clock::new_frozen();
    let store = MockStore::new();
    let cache = persisted_cache(store.clone(), 16, &clock);

    cache
        .set("users", "42", "Ada".to_string(), SetOptions::default())
        .await
        .expect("set");

    eventually(|| store.contains_key("users:42")).await;
    let mirrored = store
        .operations()
        .into_iter()
        .find_map(|op| match op {
            StoreOp::Set { key, ttl, .. } if key == "users:42" => Some(ttl),
            _ => None,
        })
        .expect("mirrored write");
    assert_eq!(mirrored, TTL + SWR);
}

#[tokio::test]
async fn evicted_entries_rehydrate_from_the_store() {
    let clock = Clock::new_frozen();
    let store = MockStore::new();
    let cache = persisted_cache(store.clone(), 1, &clock);

    cache
        .set("users", "a", "Ada".to_string(), SetOptions::default())
        .await
        .expect("set");
    eventually(|| store.contains_key("users:a")).await;

    // Capacity one: writing "b" evicts "a" from memory.
    cache
        .set("users", "b", "Grace".to_string(), SetOptions::default())
        .await
        .expect("set");
    assert!(!cache.contains("users", "a"));

    assert_eq!(cache.get("users", "a").await.as_deref(), Some("Ada"));
    assert!(cache.contains("users", "a"));
}

#[tokio::test]
async fn expired_envelopes_are_not_served() {
    let clock = Clock::new_frozen();
    let store = MockStore::new();
    let cache = persisted_cache(store.clone(), 1, &clock);

    cache
        .set("users", "a", "Ada".to_string(), SetOptions::default())
        .await
        .expect("set");
    eventually(|| store.contains_key("users:a")).await;
    cache
        .set("users", "b", "Grace".to_string(), SetOptions::default())
        .await
        .expect("set");

    // The envelope is still in the store, but past its stale window.
    clock.advance(TTL + SWR + Duration::from_secs(1));
    assert_eq!(cache.get("users", "a").await, None);
}

#[tokio::test]
async fn memoized_results_survive_a_restart() {
    let clock = Clock::new_frozen();
    let store = MemoryStore::new();
    let runs = Arc::new(AtomicUsize::new(0));

    let producer = {
        let runs = Arc::clone(&runs);
        move |id: u64| {
            let runs = Arc::clone(&runs);
            async move {
                runs.fetch_add(1, Ordering::SeqCst);
                Ok::<_, std::io::Error>(format!("user-{id}"))
            }
        }
    };

    let first: MemoCache<String, MemoryStore<String>> = MemoCache::builder()
        .ttl(TTL)
        .clock(clock.clone())
        .persistence(store.clone())
        .build()
        .expect("valid configuration");
    let lookup = first
        .memoize("users", MemoizeOptions::default(), producer.clone())
        .expect("memoize");
    assert_eq!(lookup.call(42).await.expect("first run"), "user-42");
    eventually(|| store.contains_key("users:42")).await;

    // A fresh cache over the same store answers without re-running.
    let second: MemoCache<String, MemoryStore<String>> = MemoCache::builder()
        .ttl(TTL)
        .clock(clock.clone())
        .persistence(store)
        .build()
        .expect("valid configuration");
    let lookup = second
        .memoize("users", MemoizeOptions::default(), producer)
        .expect("memoize");
    assert_eq!(lookup.call(42).await.expect("hydrated"), "user-42");
    assert_eq!(runs.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn delete_removes_both_layers() {
    let clock = Clock::new_frozen();
    let store = MockStore::new();
    let cache = persisted_cache(store.clone(), 16, &clock);

    cache
        .set("users", "42", "Ada".to_string(), SetOptions::default())
        .await
        .expect("set");
    eventually(|| store.contains_key("users:42")).await;

    assert!(cache.delete("users", "42").await);
    assert!(!store.contains_key("users:42"));
    assert_eq!(cache.get("users", "42").await, None);
}

#[tokio::test]
async fn group_clears_reach_the_store() {
    let clock = Clock::new_frozen();
    let store = MockStore::new();
    let cache = persisted_cache(store.clone(), 16, &clock);
    let options = SetOptions::default();

    cache.set("users", "1", "a".to_string(), options).await.expect("set");
    cache.set("users", "2", "b".to_string(), options).await.expect("set");
    cache.set("sessions", "1", "c".to_string(), options).await.expect("set");
    eventually(|| store.envelope_count() == 3).await;

    cache.clear(Some("users")).await;
    assert_eq!(store.envelope_count(), 1);
    assert!(store.contains_key("sessions:1"));
    assert!(cache.get("sessions", "1").await.is_some());
}

/// A store whose reads fetch their envelope, then park until released. Lets
/// a test hold a hydration open while racing writes against it.
struct GatedStore {
    inner: MemoryStore<String>,
    release: Arc<Notify>,
}

impl PersistentStore<String> for GatedStore {
    async fn get(&self, key: &str) -> Result<Option<Envelope<String>>, StoreError> {
        let found = self.inner.get(key).await;
        self.release.notified().await;
        found
    }

    async fn set(&self, key: &str, envelope: Envelope<String>, ttl: Duration) -> Result<(), StoreError> {
        self.inner.set(key, envelope, ttl).await
    }

    async fn remove(&self, key: &str) -> Result<bool, StoreError> {
        self.inner.remove(key).await
    }

    async fn keys(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        self.inner.keys(prefix).await
    }
}

#[tokio::test]
async fn writes_landing_during_hydration_win() {
    let clock = Clock::new_frozen();
    let release = Arc::new(Notify::new());
    let inner = MemoryStore::new();
    let now = clock.now();
    inner
        .set("users:42", Envelope::new("old".to_string(), now + TTL, now + TTL), TTL)
        .await
        .expect("seed the store");

    let cache: MemoCache<String, GatedStore> = MemoCache::builder()
        .ttl(TTL)
        .clock(clock.clone())
        .persistence(GatedStore {
            inner,
            release: Arc::clone(&release),
        })
        .build()
        .expect("valid configuration");

    // The reader misses memory and parks inside the store read, its stale
    // envelope already in hand.
    let reader = tokio::spawn({
        let cache = cache.clone();
        async move { cache.get("users", "42").await }
    });
    tokio::task::yield_now().await;

    cache
        .set("users", "42", "new".to_string(), SetOptions::default())
        .await
        .expect("set");
    release.notify_one();

    // The write that landed mid-hydration is what everyone sees.
    assert_eq!(reader.await.expect("reader").as_deref(), Some("new"));
    assert_eq!(cache.get("users", "42").await.as_deref(), Some("new"));
}

#[tokio::test]
async fn store_failures_degrade_to_memory_only() {
    let clock = Clock::new_frozen();
    let store = MockStore::new();
    let sink = RecordingSink::new();
    let cache: MemoCache<String, MockStore<String>> = MemoCache::builder()
        .ttl(TTL)
        .clock(clock.clone())
        .events(Arc::new(sink.clone()))
        .persistence(store.clone())
        .build()
        .expect("valid configuration");

    store.fail_when(|_| true);
    cache
        .set("users", "42", "Ada".to_string(), SetOptions::default())
        .await
        .expect("set never surfaces store failures");

    // The value is served from memory while every store call fails.
    assert_eq!(cache.get("users", "42").await.as_deref(), Some("Ada"));
    eventually(|| sink.count_of(EventKind::PersistError) >= 1).await;

    assert!(cache.delete("users", "42").await);
    assert_eq!(cache.get("users", "42").await, None);
}
