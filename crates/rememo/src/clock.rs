// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Time source abstraction for expiry checks.
//!
//! All freshness decisions go through a [`Clock`] so TTL and SWR behavior can
//! be tested by jumping forward in time rather than sleeping. Cloning a clock
//! is cheap and every clone shares the same underlying state.

use std::{
    sync::Arc,
    time::{Duration, SystemTime},
};

use parking_lot::Mutex;

/// Provides the current absolute time for expiry decisions.
///
/// Expiry timestamps are absolute (`SystemTime`) because they are mirrored
/// into persistent envelopes that must stay meaningful across process
/// restarts.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// use rememo::Clock;
///
/// let clock = Clock::new_frozen();
/// let before = clock.now();
/// clock.advance(Duration::from_secs(5));
/// assert_eq!(clock.now(), before + Duration::from_secs(5));
/// ```
#[derive(Clone, Debug)]
pub struct Clock {
    inner: ClockInner,
}

#[derive(Clone, Debug)]
enum ClockInner {
    System,
    Frozen(Arc<Mutex<SystemTime>>),
}

impl Default for Clock {
    fn default() -> Self {
        Self::system()
    }
}

impl Clock {
    /// Creates a clock backed by the system time.
    #[must_use]
    pub fn system() -> Self {
        Self {
            inner: ClockInner::System,
        }
    }

    /// Creates a frozen clock for tests.
    ///
    /// Time starts at the current system time and only moves when
    /// [`advance`](Self::advance) is called. All clones share the frozen
    /// time, so advancing through one clone is visible everywhere.
    #[must_use]
    pub fn new_frozen() -> Self {
        Self {
            inner: ClockInner::Frozen(Arc::new(Mutex::new(SystemTime::now()))),
        }
    }

    /// Returns the current time according to this clock.
    #[must_use]
    pub fn now(&self) -> SystemTime {
        match &self.inner {
            ClockInner::System => SystemTime::now(),
            ClockInner::Frozen(time) => *time.lock(),
        }
    }

    /// Moves a frozen clock forward by the given duration.
    ///
    /// Has no effect on a system clock.
    pub fn advance(&self, by: Duration) {
        if let ClockInner::Frozen(time) = &self.inner {
            let mut time = time.lock();
            *time += by;
        }
    }
}
