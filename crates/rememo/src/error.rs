// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Error types for cache operations.

use std::sync::Arc;

/// The error type producers convert into; anything implementing
/// `std::error::Error` fits.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// A failure produced by a wrapped producer function.
///
/// The original error is held behind an `Arc` so a single failure can fan
/// out to every caller joined on the same in-flight computation, and can be
/// memoized when error caching is enabled.
///
/// Use [`downcast_ref`](Self::downcast_ref) to recover the producer's
/// concrete error type.
#[derive(Clone)]
pub struct ProducerError {
    inner: Arc<dyn std::error::Error + Send + Sync>,
}

impl ProducerError {
    pub(crate) fn new(cause: Box<dyn std::error::Error + Send + Sync>) -> Self {
        Self { inner: cause.into() }
    }

    /// Attempts to downcast the underlying cause to a concrete error type.
    ///
    /// # Examples
    ///
    /// ```
    /// # use rememo::ProducerError;
    /// # fn inspect(error: &ProducerError) {
    /// if let Some(io) = error.downcast_ref::<std::io::Error>() {
    ///     eprintln!("io failure: {}", io.kind());
    /// }
    /// # }
    /// ```
    #[must_use]
    pub fn downcast_ref<T: std::error::Error + 'static>(&self) -> Option<&T> {
        (*self.inner).downcast_ref()
    }
}

impl std::fmt::Debug for ProducerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Debug::fmt(&self.inner, f)
    }
}

impl std::fmt::Display for ProducerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(&self.inner, f)
    }
}

impl std::error::Error for ProducerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.inner.source()
    }
}

/// An error returned by a memoized call.
///
/// A correctly configured cache never fails due to its own machinery; the
/// only errors a caller sees are the producer's own, possibly served from a
/// cached negative result when error caching is enabled.
#[derive(Clone, Debug, thiserror::Error)]
pub enum CacheError {
    /// The wrapped producer function failed.
    #[error("producer failed: {0}")]
    Produce(ProducerError),

    /// The in-flight computation terminated without settling (its task
    /// panicked before delivering a result).
    #[error("in-flight computation terminated without settling")]
    Lost,
}

impl CacheError {
    /// Returns the underlying producer failure, if that is what this is.
    #[must_use]
    pub fn producer_error(&self) -> Option<&ProducerError> {
        match self {
            Self::Produce(error) => Some(error),
            Self::Lost => None,
        }
    }
}
