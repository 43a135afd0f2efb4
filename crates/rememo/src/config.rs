// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Expiry and behavior policies for memoization groups and direct writes.

use std::time::Duration;

/// A configuration problem detected while building a cache or registering a
/// memoization group.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// No TTL was supplied and the cache has no default.
    #[error("a time-to-live is required")]
    MissingTtl,

    /// The supplied TTL was zero, which would expire everything instantly.
    #[error("the time-to-live must be greater than zero")]
    ZeroTtl,

    /// The entry capacity was zero, which could never hold a record.
    #[error("the entry capacity must be greater than zero")]
    ZeroCapacity,
}

/// Per-group behavior for memoized calls.
///
/// Unset fields fall back to the cache-wide defaults fixed at build time.
#[derive(Clone, Copy, Debug, Default)]
pub struct MemoizeOptions {
    /// Hard time-to-live override.
    pub ttl: Option<Duration>,
    /// Stale-while-revalidate window override.
    pub swr: Option<Duration>,
    /// Whether producer failures are memoized for the TTL.
    pub cache_errors: Option<bool>,
}

/// Per-call expiry overrides for direct writes.
#[derive(Clone, Copy, Debug, Default)]
pub struct SetOptions {
    /// Hard time-to-live override.
    pub ttl: Option<Duration>,
    /// Stale-while-revalidate window override.
    pub swr: Option<Duration>,
}

/// The fully resolved policy a group or write actually runs under.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Policy {
    pub ttl: Duration,
    pub swr: Duration,
    pub cache_errors: bool,
}

impl Policy {
    /// Resolves overrides against defaults, rejecting unusable TTLs.
    pub fn resolve(
        default_ttl: Option<Duration>,
        default_swr: Duration,
        default_cache_errors: bool,
        options: MemoizeOptions,
    ) -> Result<Self, ConfigError> {
        let ttl = options.ttl.or(default_ttl).ok_or(ConfigError::MissingTtl)?;
        if ttl.is_zero() {
            return Err(ConfigError::ZeroTtl);
        }
        Ok(Self {
            ttl,
            swr: options.swr.unwrap_or(default_swr),
            cache_errors: options.cache_errors.unwrap_or(default_cache_errors),
        })
    }
}
