//! Metadata store error types.

use thiserror::Error;

use crate::Version;

/// Errors reported by a [`MetadataStore`](crate::MetadataStore) implementation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MetadataStoreError {
    /// The node at `path` does not exist.
    #[error("node not found: {path}")]
    NotFound { path: String },

    /// A node already exists where the caller required absence.
    #[error("node already exists: {path}")]
    AlreadyExists { path: String },

    /// A conditional write or delete observed a different version.
    #[error("bad version at {path}: expected {expected}, found {actual:?}")]
    BadVersion {
        path: String,
        expected: Version,
        actual: Option<Version>,
    },

    /// The node has children and cannot be removed.
    #[error("node not empty: {path}")]
    NotEmpty { path: String },

    /// The path is not a well-formed absolute store path.
    #[error("invalid path {path:?}: {reason}")]
    InvalidPath { path: String, reason: String },

    /// The store handle has been closed.
    #[error("metadata store is closed")]
    Closed,

    /// The store could not be reached or failed mid-call.
    #[error("transport error: {0}")]
    Transport(String),
}

impl MetadataStoreError {
    /// Whether the error came from the transport rather than the data.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Closed | Self::Transport(_))
    }
}

/// Convenience result type.
pub type StoreResult<T> = std::result::Result<T, MetadataStoreError>;
