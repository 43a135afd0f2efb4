// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Observer hooks for cache activity.

use std::sync::Arc;

/// Receives cache lifecycle events.
///
/// Sinks are called synchronously on the operation path, so implementations
/// should hand work off quickly. A sink that panics poisons nothing, but the
/// panic propagates to the caller.
pub trait EventSink: Send + Sync {
    /// Called once per event, after the operation it describes took effect.
    fn publish(&self, event: &CacheEvent);
}

/// What happened to a cache slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EventKind {
    /// A read was answered from the cache.
    Hit,
    /// A read found nothing usable.
    Miss,
    /// A value was stored or refreshed.
    Set,
    /// One or more entries were removed.
    Invalidate,
    /// A persistence operation failed and was dropped.
    PersistError,
}

impl EventKind {
    /// The wire-style topic string for this kind.
    #[must_use]
    pub fn topic(self) -> &'static str {
        match self {
            Self::Hit => "cache:hit",
            Self::Miss => "cache:miss",
            Self::Set => "cache:set",
            Self::Invalidate => "cache:invalidate",
            Self::PersistError => "cache:persist-error",
        }
    }
}

/// A single cache lifecycle event.
#[derive(Clone, Debug)]
pub struct CacheEvent {
    /// What happened.
    pub kind: EventKind,
    /// The group the affected key belongs to.
    pub group: String,
    /// The caller key within the group; `"*"` for group-wide invalidation.
    pub key: String,
    /// Whether a hit was served from the stale window.
    pub stale: bool,
}

impl CacheEvent {
    pub(crate) fn new(kind: EventKind, group: &str, key: &str) -> Self {
        Self {
            kind,
            group: group.to_string(),
            key: key.to_string(),
            stale: false,
        }
    }

    pub(crate) fn stale_hit(group: &str, key: &str) -> Self {
        Self {
            stale: true,
            ..Self::new(EventKind::Hit, group, key)
        }
    }
}

/// Internal fan-out handle; absent sink means events are free.
#[derive(Clone, Default)]
pub(crate) struct EventPublisher {
    sink: Option<Arc<dyn EventSink>>,
}

impl EventPublisher {
    pub fn new(sink: Option<Arc<dyn EventSink>>) -> Self {
        Self { sink }
    }

    pub fn emit(&self, event: CacheEvent) {
        if let Some(sink) = &self.sink {
            sink.publish(&event);
        }
    }
}

impl std::fmt::Debug for EventPublisher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventPublisher")
            .field("attached", &self.sink.is_some())
            .finish()
    }
}
