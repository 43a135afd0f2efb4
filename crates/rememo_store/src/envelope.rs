// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::time::SystemTime;

use serde::{Deserialize, Serialize};

/// The serialized mirror of a cache record, as held by a persistent store.
///
/// An envelope carries the cached value together with its absolute expiry
/// timestamps. Absolute time (rather than an age or a duration) is what
/// allows a record to be rehydrated with correct freshness after a process
/// restart.
///
/// The invariant `hard_expiry <= stale_expiry` holds for every envelope the
/// engine writes; the two are equal when stale-while-revalidate is disabled.
/// Envelopes read back from a store are still checked against the current
/// time before use, so a tampered or clock-skewed envelope can at worst be
/// ignored.
///
/// # Examples
///
/// ```
/// use std::time::{Duration, SystemTime};
///
/// use rememo_store::Envelope;
///
/// let now = SystemTime::now();
/// let envelope = Envelope::new("payload".to_string(), now + Duration::from_secs(30), now + Duration::from_secs(90));
/// assert_eq!(envelope.value, "payload");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope<V> {
    /// The cached value. Opaque to the engine; serialization is the
    /// collaborator's concern.
    pub value: V,
    /// Timestamp after which the value is no longer fresh.
    pub hard_expiry: SystemTime,
    /// Timestamp after which the value is unusable even as a stale fallback.
    pub stale_expiry: SystemTime,
}

impl<V> Envelope<V> {
    /// Creates an envelope from a value and its expiry timestamps.
    pub fn new(value: V, hard_expiry: SystemTime, stale_expiry: SystemTime) -> Self {
        Self {
            value,
            hard_expiry,
            stale_expiry,
        }
    }

    /// Returns `true` if the value may still be served, at least as a stale
    /// fallback, at the given instant.
    #[must_use]
    pub fn usable_at(&self, now: SystemTime) -> bool {
        now <= self.stale_expiry
    }
}
