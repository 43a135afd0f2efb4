// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Error types for persistent store operations.

/// An error from a persistent store operation.
///
/// This is an opaque error type that can wrap any underlying failure from a
/// store implementation. The cache engine catches every `StoreError` at the
/// overlay boundary, so these errors are visible to operators (through logs
/// and events) but never to cache callers.
///
/// # Example
///
/// ```
/// use rememo_store::StoreError;
///
/// let error = StoreError::message("connection refused");
/// assert!(error.to_string().contains("connection refused"));
/// ```
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct StoreError {
    message: String,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl StoreError {
    /// Creates an error from a plain message.
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Creates an error wrapping an underlying cause.
    pub fn caused_by(cause: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        let cause = cause.into();
        Self {
            message: cause.to_string(),
            source: Some(cause),
        }
    }
}

/// A specialized [`Result`] type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
