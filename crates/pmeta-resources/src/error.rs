//! Resource layer error types.

use std::fmt;
use std::time::Duration;

use pmeta_policies::NameError;
use pmeta_store::{MetadataStoreError, Version};
use thiserror::Error;

/// Which resource family an operation was acting on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    NamespacePolicies,
    LocalPolicies,
    IsolationPolicies,
    PartitionedTopic,
}

impl ResourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NamespacePolicies => "namespace policies",
            Self::LocalPolicies => "local policies",
            Self::IsolationPolicies => "isolation policies",
            Self::PartitionedTopic => "partitioned topic",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why the store could not serve a call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UnavailableCause {
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error(transparent)]
    Store(MetadataStoreError),
}

#[derive(Debug, Error)]
pub enum ResourceError {
    #[error("{kind} not found at {path}")]
    NotFound { kind: ResourceKind, path: String },

    #[error("{kind} already exists at {path}")]
    AlreadyExists { kind: ResourceKind, path: String },

    #[error("{kind} at {path} still has children")]
    NotEmpty { kind: ResourceKind, path: String },

    #[error("failed to decode {kind} at {path}: {source}")]
    Deserialization {
        kind: ResourceKind,
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to encode {kind} for {path}: {source}")]
    Serialization {
        kind: ResourceKind,
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("version conflict on {kind} at {path}: expected {expected}, found {actual:?}")]
    VersionConflict {
        kind: ResourceKind,
        path: String,
        expected: Version,
        actual: Option<Version>,
    },

    #[error("metadata store unavailable for {kind} at {path}: {cause}")]
    StoreUnavailable {
        kind: ResourceKind,
        path: String,
        #[source]
        cause: UnavailableCause,
    },

    #[error("invalid {kind} path {path:?}: {reason}")]
    InvalidPath {
        kind: ResourceKind,
        path: String,
        reason: String,
    },

    #[error("invalid {kind} configuration: {reason}")]
    InvalidConfig { kind: ResourceKind, reason: String },
}

impl ResourceError {
    /// Tag a store error with the resource kind and path it was raised for.
    pub fn from_store(kind: ResourceKind, path: &str, err: MetadataStoreError) -> Self {
        let path = path.to_string();
        match err {
            MetadataStoreError::NotFound { .. } => Self::NotFound { kind, path },
            MetadataStoreError::AlreadyExists { .. } => Self::AlreadyExists { kind, path },
            MetadataStoreError::NotEmpty { .. } => Self::NotEmpty { kind, path },
            MetadataStoreError::BadVersion {
                expected, actual, ..
            } => Self::VersionConflict {
                kind,
                path,
                expected,
                actual,
            },
            MetadataStoreError::InvalidPath { reason, .. } => {
                Self::InvalidPath { kind, path, reason }
            }
            err @ (MetadataStoreError::Closed | MetadataStoreError::Transport(_)) => {
                Self::StoreUnavailable {
                    kind,
                    path,
                    cause: UnavailableCause::Store(err),
                }
            }
        }
    }

    pub(crate) fn invalid_name(kind: ResourceKind, name: &str, err: NameError) -> Self {
        Self::InvalidPath {
            kind,
            path: name.to_string(),
            reason: err.to_string(),
        }
    }

    pub fn kind(&self) -> ResourceKind {
        match self {
            Self::NotFound { kind, .. }
            | Self::AlreadyExists { kind, .. }
            | Self::NotEmpty { kind, .. }
            | Self::Deserialization { kind, .. }
            | Self::Serialization { kind, .. }
            | Self::VersionConflict { kind, .. }
            | Self::StoreUnavailable { kind, .. }
            | Self::InvalidPath { kind, .. }
            | Self::InvalidConfig { kind, .. } => *kind,
        }
    }

    /// The store path the failing operation addressed, if any.
    pub fn path(&self) -> Option<&str> {
        match self {
            Self::NotFound { path, .. }
            | Self::AlreadyExists { path, .. }
            | Self::NotEmpty { path, .. }
            | Self::Deserialization { path, .. }
            | Self::Serialization { path, .. }
            | Self::VersionConflict { path, .. }
            | Self::StoreUnavailable { path, .. }
            | Self::InvalidPath { path, .. } => Some(path),
            Self::InvalidConfig { .. } => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    pub fn is_already_exists(&self) -> bool {
        matches!(self, Self::AlreadyExists { .. })
    }

    pub fn is_version_conflict(&self) -> bool {
        matches!(self, Self::VersionConflict { .. })
    }

    pub fn is_store_unavailable(&self) -> bool {
        matches!(self, Self::StoreUnavailable { .. })
    }
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, ResourceError>;
