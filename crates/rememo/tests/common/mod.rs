// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Shared test support.

#![allow(dead_code, reason = "not every test binary uses every helper")]

use std::sync::Arc;

use parking_lot::Mutex;
use rememo::{CacheEvent, EventKind, EventSink};

/// Polls `condition` across task yields until it holds.
///
/// Background work (detached producer runs, mirrored writes) progresses on a
/// current-thread runtime only when the test yields; this bounds the wait
/// without sleeping.
pub async fn eventually(mut condition: impl FnMut() -> bool) {
    for _ in 0..10_000 {
        if condition() {
            return;
        }
        tokio::task::yield_now().await;
    }
    panic!("condition did not hold within the yield budget");
}

/// An event sink that records everything it sees.
///
/// Clones share the same log, so a test can keep one handle and give the
/// cache another.
#[derive(Clone, Default)]
pub struct RecordingSink {
    events: Arc<Mutex<Vec<CacheEvent>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<CacheEvent> {
        self.events.lock().clone()
    }

    pub fn count_of(&self, kind: EventKind) -> usize {
        self.events.lock().iter().filter(|e| e.kind == kind).count()
    }

    pub fn topics(&self) -> Vec<&'static str> {
        self.events.lock().iter().map(|e| e.kind.topic()).collect()
    }
}

impl EventSink for RecordingSink {
    fn publish(&self, event: &CacheEvent) {
        self.events.lock().push(event.clone());
    }
}
