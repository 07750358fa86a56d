//! Error types for Blobfs
//!
//! Two layers of errors exist:
//! - [`StoreError`]: failure signals reported by an [`ObjectStoreClient`](crate::ObjectStoreClient)
//! - [`Error`]: the taxonomy callers of [`Storage`](crate::Storage) see
//!
//! Store errors are translated at the `Storage` boundary, using the caller's
//! external URI as context. Messages never contain tenant-prefixed store keys.

use thiserror::Error;

/// Result type alias using Blobfs's Error.
pub type Result<T> = std::result::Result<T, Error>;

/// Result type alias for raw object store calls.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Failure reported by the backing object store client.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The addressed object does not exist.
    #[error("blob not found: {0}")]
    BlobNotFound(String),

    /// The container (or another enclosing resource) does not exist.
    #[error("resource not found: {0}")]
    ResourceNotFound(String),

    /// The service answered with an error status.
    #[error("service error (status {status}): {message}")]
    Service { status: u16, message: String },

    /// Transport-level failure talking to the store.
    #[error("transport error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    /// Whether this failure means "the object or prefix is absent".
    pub fn is_not_found(&self) -> bool {
        match self {
            StoreError::BlobNotFound(_) | StoreError::ResourceNotFound(_) => true,
            StoreError::Service { status, .. } => *status == 404,
            StoreError::Io(e) => e.kind() == std::io::ErrorKind::NotFound,
        }
    }
}

/// Blobfs error types.
#[derive(Error, Debug)]
pub enum Error {
    /// The path was rejected before any store call was made.
    #[error("invalid path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },

    /// The key or prefix does not exist.
    #[error("{0} (not found)")]
    NotFound(String),

    /// Any other backend failure: connection, permission, quota.
    #[error("storage io error on {uri}: {source}")]
    StorageIo {
        uri: String,
        #[source]
        source: StoreError,
    },
}

impl Error {
    /// Create an invalid path error.
    pub fn invalid_path(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidPath {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Translate a store failure into the public taxonomy.
    ///
    /// `uri` is the external URI the caller addressed.
    pub fn from_store(uri: impl Into<String>, err: StoreError) -> Self {
        let uri = uri.into();
        if err.is_not_found() {
            Self::NotFound(uri)
        } else {
            Self::StorageIo { uri, source: err }
        }
    }

    /// Check if this is a not-found error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Check if this is an invalid path error.
    pub fn is_invalid_path(&self) -> bool {
        matches!(self, Self::InvalidPath { .. })
    }
}

/// Attach the caller's URI to raw store results.
pub(crate) trait StoreResultExt<T> {
    fn for_uri(self, uri: &str) -> Result<T>;
}

impl<T> StoreResultExt<T> for StoreResult<T> {
    fn for_uri(self, uri: &str) -> Result<T> {
        self.map_err(|e| Error::from_store(uri, e))
    }
}
