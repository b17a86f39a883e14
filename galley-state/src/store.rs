//! State store trait and error types

use async_trait::async_trait;
use thiserror::Error;

use galley_core::engine::EngineError;

/// Errors that can occur while managing a state store backend
#[derive(Debug, Error)]
pub enum StoreError {
    /// Invalid or missing configuration
    #[error("Store configuration error: {0}")]
    Configuration(String),

    /// The bucket does not exist
    #[error("Bucket not found: {0}")]
    BucketNotFound(String),

    /// Failed to create the bucket
    #[error("Failed to create bucket {bucket}: {message}")]
    BucketCreationFailed { bucket: String, message: String },

    /// The backend exists but cannot be reached or authorized
    #[error("Bucket {bucket} is not accessible: {message}")]
    Inaccessible { bucket: String, message: String },

    /// A non-forced delete was asked to remove a non-empty backend
    #[error("State store {0} is not empty (pass force to purge it)")]
    NotEmpty(String),

    /// An individual object or version delete failed mid-purge. The bucket
    /// is left partially purged; re-list before any retry.
    #[error("Failed to delete object {key} (version {version}): {message}")]
    ObjectDeleteFailed {
        key: String,
        version: String,
        message: String,
    },

    /// Filesystem error
    #[error("I/O error: {0}")]
    Io(String),

    /// Object storage API error
    #[error("Object storage error: {0}")]
    Storage(String),

    /// External engine login/logout failure, propagated verbatim
    #[error(transparent)]
    Engine(#[from] EngineError),
}

impl StoreError {
    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Create an inaccessible-bucket error
    pub fn inaccessible(bucket: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Inaccessible {
            bucket: bucket.into(),
            message: message.into(),
        }
    }

    /// Create a purge failure carrying the offending key and version.
    /// `version` is `None` for a current-listing delete.
    pub fn object_delete_failed(
        key: impl Into<String>,
        version: Option<&str>,
        message: impl Into<String>,
    ) -> Self {
        Self::ObjectDeleteFailed {
            key: key.into(),
            version: version.unwrap_or("current").to_string(),
            message: message.into(),
        }
    }
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Trait for state store backends
///
/// A store is constructed with identity only and performs no side effects
/// until `open`. The URI it returns is a pure function of that identity, so
/// repeated opens succeed and yield the same URI.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Create the backend if absent, verify it is usable, log the engine in,
    /// and return the state URI
    ///
    /// Safe to call repeatedly; an already-existing backend is not an error.
    async fn open(&self) -> StoreResult<String>;

    /// Log the engine out of the store, without deleting any data
    async fn close(&self) -> StoreResult<()>;

    /// Close, then delete the backend, including all data when `force` is
    /// true
    ///
    /// Without `force` the delete fails while the backend still holds any
    /// data; with `force` all contents are purged first.
    async fn delete(&self, force: bool) -> StoreResult<()>;
}
