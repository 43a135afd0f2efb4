// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Cache records and their freshness lifecycle.

use std::time::{Duration, SystemTime};

use rememo_store::Envelope;

use crate::error::ProducerError;

/// The memoized result of a computation: a value, or a cached failure when
/// error caching is enabled. A tagged result keeps the hit/miss decision for
/// errors structurally explicit.
pub(crate) type Outcome<V> = Result<V, ProducerError>;

/// Where a record sits in its `Fresh -> Stale -> Expired` lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Freshness {
    /// Within the hard TTL; served directly.
    Fresh,
    /// Past the hard TTL but within the SWR window; served while a
    /// background refresh runs.
    Stale,
    /// Past the stale expiry; unusable, removed lazily on discovery.
    Expired,
}

/// One resident cache entry.
///
/// Invariant: `hard_expiry <= stale_expiry`, with equality when SWR is
/// disabled. Both constructors uphold this by deriving `stale_expiry` as
/// `hard_expiry + swr`; envelopes from persistence are re-checked against
/// the clock before use.
#[derive(Clone, Debug)]
pub(crate) struct CacheRecord<V> {
    pub outcome: Outcome<V>,
    pub created_at: SystemTime,
    pub hard_expiry: SystemTime,
    pub stale_expiry: SystemTime,
}

impl<V> CacheRecord<V> {
    pub fn new(outcome: Outcome<V>, now: SystemTime, ttl: Duration, swr: Duration) -> Self {
        let hard_expiry = now + ttl;
        Self {
            outcome,
            created_at: now,
            hard_expiry,
            stale_expiry: hard_expiry + swr,
        }
    }

    /// Rebuilds a record from a persisted envelope.
    ///
    /// The original creation time is not persisted; the hydration time
    /// stands in for it. Expiry timestamps carry over unchanged.
    pub fn from_envelope(envelope: Envelope<V>, now: SystemTime) -> Self {
        Self {
            outcome: Ok(envelope.value),
            created_at: now,
            hard_expiry: envelope.hard_expiry,
            stale_expiry: envelope.stale_expiry,
        }
    }

    pub fn freshness(&self, now: SystemTime) -> Freshness {
        if now <= self.hard_expiry {
            Freshness::Fresh
        } else if now <= self.stale_expiry {
            Freshness::Stale
        } else {
            Freshness::Expired
        }
    }

    /// Remaining useful lifetime, through the end of the stale window.
    pub fn remaining_life(&self, now: SystemTime) -> Duration {
        self.stale_expiry.duration_since(now).unwrap_or_default()
    }

    /// Time since the record was created, or re-hydrated from persistence.
    pub fn age(&self, now: SystemTime) -> Duration {
        now.duration_since(self.created_at).unwrap_or_default()
    }
}

impl<V> CacheRecord<V>
where
    V: Clone,
{
    /// The persistable mirror of this record.
    ///
    /// Only successful outcomes have one: cached failures stay memory-only
    /// because an envelope carries an opaque value, not an error.
    pub fn to_envelope(&self) -> Option<Envelope<V>> {
        self.outcome
            .as_ref()
            .ok()
            .map(|value| Envelope::new(value.clone(), self.hard_expiry, self.stale_expiry))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TTL: Duration = Duration::from_secs(3);
    const SWR: Duration = Duration::from_secs(7);

    #[test]
    fn freshness_transitions_at_expiry_boundaries() {
        let now = SystemTime::now();
        let record = CacheRecord::new(Ok(1), now, TTL, SWR);

        assert_eq!(record.freshness(now), Freshness::Fresh);
        assert_eq!(record.freshness(now + TTL), Freshness::Fresh);
        assert_eq!(record.freshness(now + TTL + Duration::from_millis(1)), Freshness::Stale);
        assert_eq!(record.freshness(now + TTL + SWR), Freshness::Stale);
        assert_eq!(record.freshness(now + TTL + SWR + Duration::from_millis(1)), Freshness::Expired);
    }

    #[test]
    fn zero_swr_collapses_the_stale_window() {
        let now = SystemTime::now();
        let record = CacheRecord::new(Ok(1), now, TTL, Duration::ZERO);

        assert_eq!(record.hard_expiry, record.stale_expiry);
        assert_eq!(record.freshness(now + TTL + Duration::from_millis(1)), Freshness::Expired);
    }

    #[test]
    fn envelope_round_trip_preserves_expiry() {
        let now = SystemTime::now();
        let record = CacheRecord::new(Ok("v".to_string()), now, TTL, SWR);

        let envelope = record.to_envelope().expect("success outcome has an envelope");
        let later = now + Duration::from_secs(1);
        let hydrated = CacheRecord::from_envelope(envelope, later);

        assert_eq!(hydrated.hard_expiry, record.hard_expiry);
        assert_eq!(hydrated.stale_expiry, record.stale_expiry);
        assert_eq!(hydrated.created_at, later);
    }

    #[test]
    fn cached_failures_have_no_envelope() {
        let now = SystemTime::now();
        let record: CacheRecord<i32> = CacheRecord::new(Err(crate::error::ProducerError::new("down".into())), now, TTL, SWR);

        assert!(record.to_envelope().is_none());
    }

    #[test]
    fn age_counts_from_creation() {
        let now = SystemTime::now();
        let record = CacheRecord::new(Ok(1), now, TTL, SWR);

        assert_eq!(record.age(now), Duration::ZERO);
        assert_eq!(record.age(now + TTL), TTL);
        // A clock stepping backwards never yields a negative age.
        assert_eq!(record.age(now - Duration::from_secs(1)), Duration::ZERO);
    }

    #[test]
    fn remaining_life_shrinks_and_bottoms_out() {
        let now = SystemTime::now();
        let record = CacheRecord::new(Ok(1), now, TTL, SWR);

        assert_eq!(record.remaining_life(now), TTL + SWR);
        assert_eq!(record.remaining_life(now + TTL), SWR);
        assert_eq!(record.remaining_life(now + TTL + SWR + SWR), Duration::ZERO);
    }
}
