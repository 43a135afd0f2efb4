// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! In-flight computation coalescing.
//!
//! At most one computation runs per composite key at any moment. Every caller
//! arriving while one is in flight awaits the same shared result. The
//! computation runs on a detached task, so callers that stop awaiting never
//! cancel it; the result still lands in the cache for future reads.

use std::{collections::HashMap, sync::Arc};

use futures::{future::Shared, FutureExt};
use parking_lot::Mutex;
use tokio::sync::oneshot;

use crate::error::CacheError;

type SharedFlight<V> = Shared<futures::future::BoxFuture<'static, Result<V, CacheError>>>;

/// Tracks one shared flight per composite key.
pub(crate) struct FlightMap<V> {
    slots: Mutex<HashMap<String, SharedFlight<V>>>,
}

/// Vacates a flight's slot when its task ends, even by panic.
struct SlotGuard<V> {
    map: Arc<FlightMap<V>>,
    key: String,
}

impl<V> Drop for SlotGuard<V> {
    fn drop(&mut self) {
        self.map.slots.lock().remove(&self.key);
    }
}

impl<V> FlightMap<V> {
    pub fn new() -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// Number of computations currently in flight.
    pub fn in_flight(&self) -> usize {
        self.slots.lock().len()
    }
}

impl<V> FlightMap<V>
where
    V: Clone + Send + Sync + 'static,
{
    /// Joins the flight for `composite`, launching one with `work` if none
    /// exists.
    ///
    /// The returned future is cheap to clone-and-await from any number of
    /// callers; all of them observe the same settled result. The slot is
    /// vacated as the work settles (even by panic), so a later call starts a
    /// new flight.
    pub fn join_or_launch<F, Fut>(self: &Arc<Self>, composite: &str, work: F) -> SharedFlight<V>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, CacheError>> + Send + 'static,
    {
        let mut slots = self.slots.lock();
        if let Some(flight) = slots.get(composite) {
            return flight.clone();
        }

        let (sender, receiver) = oneshot::channel();
        let flight: SharedFlight<V> = receiver
            .map(|settled| settled.unwrap_or(Err(CacheError::Lost)))
            .boxed()
            .shared();
        slots.insert(composite.to_string(), flight.clone());
        drop(slots);

        let guard = SlotGuard {
            map: Arc::clone(self),
            key: composite.to_string(),
        };
        let fut = work();
        drop(tokio::spawn(async move {
            let outcome = fut.await;
            // Vacate the slot before resolving waiters, so a woken caller
            // that retries immediately starts a new flight. A panicking
            // `fut` unwinds through the guard and vacates the slot too.
            drop(guard);
            // Every caller may have gone away; an unreceived result is fine.
            drop(sender.send(outcome));
        }));

        flight
    }
}

impl<V> std::fmt::Debug for FlightMap<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FlightMap")
            .field("in_flight", &self.in_flight())
            .finish()
    }
}
