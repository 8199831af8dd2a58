use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::error::StoreResult;

/// Per-node version counter. Starts at [`Version::INITIAL`] on creation and
/// grows by one with every successful write.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Version(pub i64);

impl Version {
    /// Expected version meaning "the node must not exist yet".
    pub const NEW: Version = Version(-1);

    /// Version assigned to a freshly created node.
    pub const INITIAL: Version = Version(0);

    /// The version a successful write on top of `self` produces.
    pub fn next(self) -> Version {
        Version(self.0 + 1)
    }
}

impl fmt::Debug for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Version({})", self.0)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for Version {
    fn from(v: i64) -> Self {
        Version(v)
    }
}

/// Per-node bookkeeping returned alongside every read and write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stat {
    pub version: Version,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

/// A node together with its stat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetResult {
    pub value: Vec<u8>,
    pub stat: Stat,
}

/// Kind of change carried by a [`Notification`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationType {
    Created,
    Modified,
    Deleted,
    ChildrenChanged,
}

/// A change event delivered to listeners registered on a store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub notification_type: NotificationType,
    pub path: String,
}

impl Notification {
    pub fn new(notification_type: NotificationType, path: impl Into<String>) -> Self {
        Self {
            notification_type,
            path: path.into(),
        }
    }
}

/// Client handle to a hierarchical, versioned, watch-capable metadata store.
///
/// Paths are absolute and slash-delimited (see [`crate::path`]). Every node
/// carries a [`Version`] that increases on each successful write; writes and
/// deletes may be made conditional on the current version.
#[async_trait]
pub trait MetadataStore: Send + Sync {
    /// Read the node at `path`, or `None` if it does not exist.
    async fn get(&self, path: &str) -> StoreResult<Option<GetResult>>;

    /// Write `value` at `path`, creating the node and any missing parents.
    ///
    /// With `expected_version = Some(v)` the write succeeds only if the
    /// current version is `v`; [`Version::NEW`] requires the node to be
    /// absent.
    async fn put(
        &self,
        path: &str,
        value: &[u8],
        expected_version: Option<Version>,
    ) -> StoreResult<Stat>;

    /// Remove the node at `path`, optionally conditional on its version.
    async fn delete(&self, path: &str, expected_version: Option<Version>) -> StoreResult<()>;

    /// List the names of the immediate children of `path`, sorted.
    async fn get_children(&self, path: &str) -> StoreResult<Vec<String>>;

    /// Whether a node exists at `path`.
    async fn exists(&self, path: &str) -> StoreResult<bool>;

    /// Subscribe to change notifications for the whole store.
    fn register_listener(&self) -> broadcast::Receiver<Notification>;

    /// Close the handle. Subsequent calls fail with `Closed`.
    async fn close(&self) -> StoreResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_next() {
        assert_eq!(Version::NEW.next(), Version::INITIAL);
        assert_eq!(Version(4).next(), Version(5));
    }

    #[test]
    fn test_version_display_and_serde() {
        assert_eq!(Version(3).to_string(), "3");
        assert_eq!(format!("{:?}", Version::NEW), "Version(-1)");
        assert_eq!(serde_json::to_string(&Version(9)).unwrap(), "9");
        assert_eq!(Version::from(2), Version(2));
    }

    #[test]
    fn test_notification_new() {
        let n = Notification::new(NotificationType::Deleted, "/a/b");
        assert_eq!(n.path, "/a/b");
        assert_eq!(n.notification_type, NotificationType::Deleted);
    }
}
