//! In-memory hierarchical metadata store backed by a `BTreeMap`.
//!
//! Nodes are keyed by their full path. All data lives behind a
//! `parking_lot::RwLock`; the lock is never held across an await point.
//! Clones share the same tree, notification channel and closed flag.

use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::{Mutex, RwLock};
use tokio::sync::broadcast;

use pmeta_store::{
    child_name, join_path, parent_path, validate_path, GetResult, MetadataStore, MetadataStoreError,
    Notification, NotificationType, Stat, StoreResult, Version, ROOT_PATH,
};

const NOTIFICATION_CAPACITY: usize = 1024;

#[derive(Debug, Clone)]
struct Node {
    value: Vec<u8>,
    stat: Stat,
}

impl Node {
    fn new(value: Vec<u8>) -> Self {
        let now = Utc::now();
        Self {
            value,
            stat: Stat {
                version: Version::INITIAL,
                created_at: now,
                modified_at: now,
            },
        }
    }
}

struct Inner {
    nodes: RwLock<BTreeMap<String, Node>>,
    notifications: broadcast::Sender<Notification>,
    closed: AtomicBool,
    latency: Mutex<Option<Duration>>,
    pending_failures: AtomicU32,
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

/// In-memory [`MetadataStore`] with per-node versions and change notifications.
#[derive(Clone)]
pub struct MemoryMetadataStore {
    inner: Arc<Inner>,
}

impl MemoryMetadataStore {
    /// Create an empty store containing only the root node.
    pub fn new() -> Self {
        let mut nodes = BTreeMap::new();
        nodes.insert(ROOT_PATH.to_string(), Node::new(Vec::new()));
        let (notifications, _) = broadcast::channel(NOTIFICATION_CAPACITY);
        tracing::debug!("created in-memory metadata store");
        Self {
            inner: Arc::new(Inner {
                nodes: RwLock::new(nodes),
                notifications,
                closed: AtomicBool::new(false),
                latency: Mutex::new(None),
                pending_failures: AtomicU32::new(0),
            }),
        }
    }

    /// Number of nodes, including the root.
    pub fn len(&self) -> usize {
        self.inner.nodes.read().len()
    }

    /// Whether the store holds nothing but the root.
    pub fn is_empty(&self) -> bool {
        self.len() == 1
    }

    /// Whether [`MetadataStore::close`] has been called on any clone.
    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::SeqCst)
    }

    /// Delay every subsequent call by `latency` before it touches the tree.
    pub fn set_latency(&self, latency: Option<Duration>) {
        *self.inner.latency.lock() = latency;
    }

    /// Make the next `count` calls fail with a transport error.
    pub fn fail_next(&self, count: u32) {
        self.inner.pending_failures.store(count, Ordering::SeqCst);
    }

    /// Common prologue of every call: closed check, injected latency and
    /// injected failures, in that order.
    async fn enter(&self, path: &str) -> StoreResult<()> {
        if self.is_closed() {
            return Err(MetadataStoreError::Closed);
        }
        let latency = *self.inner.latency.lock();
        if let Some(delay) = latency {
            tokio::time::sleep(delay).await;
        }
        self.take_injected_failure(path)?;
        validate_path(path)
    }

    fn take_injected_failure(&self, path: &str) -> StoreResult<()> {
        let injected = self
            .inner
            .pending_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if injected {
            let reason = format!("injected failure on {path}");
            return Err(MetadataStoreError::Transport(reason));
        }
        Ok(())
    }

    fn notify(&self, notification_type: NotificationType, path: &str) {
        // No receivers is not an error.
        let _ = self
            .inner
            .notifications
            .send(Notification::new(notification_type, path));
    }
}

impl Default for MemoryMetadataStore {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Helper: child enumeration
// ---------------------------------------------------------------------------

/// Collect the names of the immediate children of `parent`.
fn collect_children(map: &BTreeMap<String, Node>, parent: &str) -> Vec<String> {
    let prefix = join_path(parent, "");
    map.range::<str, _>((Bound::Included(prefix.as_str()), Bound::Unbounded))
        .take_while(|(k, _)| k.starts_with(&prefix))
        .filter(|(k, _)| parent_path(k) == Some(parent))
        .map(|(k, _)| child_name(k).to_string())
        .collect()
}

fn has_children(map: &BTreeMap<String, Node>, path: &str) -> bool {
    let prefix = join_path(path, "");
    map.range::<str, _>((Bound::Included(prefix.as_str()), Bound::Unbounded))
        .take_while(|(k, _)| k.starts_with(&prefix))
        .next()
        .is_some()
}

/// Ancestors of `path` from the top down, excluding the root and `path`.
fn ancestors(path: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut current = parent_path(path);
    while let Some(p) = current {
        if p == ROOT_PATH {
            break;
        }
        out.push(p);
        current = parent_path(p);
    }
    out.reverse();
    out
}

#[async_trait]
impl MetadataStore for MemoryMetadataStore {
    async fn get(&self, path: &str) -> StoreResult<Option<GetResult>> {
        self.enter(path).await?;
        let nodes = self.inner.nodes.read();
        Ok(nodes.get(path).map(|node| GetResult {
            value: node.value.clone(),
            stat: node.stat,
        }))
    }

    async fn put(
        &self,
        path: &str,
        value: &[u8],
        expected_version: Option<Version>,
    ) -> StoreResult<Stat> {
        self.enter(path).await?;
        if path == ROOT_PATH {
            return Err(MetadataStoreError::InvalidPath {
                path: path.to_string(),
                reason: "the root node is not writable".to_string(),
            });
        }

        let mut created_parents = Vec::new();
        let (stat, created) = {
            let mut nodes = self.inner.nodes.write();
            let current = nodes.get(path).map(|n| n.stat.version);
            match (expected_version, current) {
                (Some(Version::NEW), Some(_)) => {
                    return Err(MetadataStoreError::AlreadyExists {
                        path: path.to_string(),
                    });
                }
                (Some(Version::NEW), None) | (None, _) => {}
                (Some(expected), actual) if actual != Some(expected) => {
                    return Err(MetadataStoreError::BadVersion {
                        path: path.to_string(),
                        expected,
                        actual,
                    });
                }
                (Some(_), _) => {}
            }

            for ancestor in ancestors(path) {
                if !nodes.contains_key(ancestor) {
                    nodes.insert(ancestor.to_string(), Node::new(Vec::new()));
                    created_parents.push(ancestor.to_string());
                }
            }

            match nodes.get_mut(path) {
                Some(node) => {
                    node.value = value.to_vec();
                    node.stat.version = node.stat.version.next();
                    node.stat.modified_at = Utc::now();
                    (node.stat, false)
                }
                None => {
                    let node = Node::new(value.to_vec());
                    let stat = node.stat;
                    nodes.insert(path.to_string(), node);
                    (stat, true)
                }
            }
        };

        for parent in &created_parents {
            self.notify(NotificationType::Created, parent);
        }
        if created {
            self.notify(NotificationType::Created, path);
            if let Some(parent) = parent_path(path) {
                self.notify(NotificationType::ChildrenChanged, parent);
            }
        } else {
            self.notify(NotificationType::Modified, path);
        }
        Ok(stat)
    }

    async fn delete(&self, path: &str, expected_version: Option<Version>) -> StoreResult<()> {
        self.enter(path).await?;
        {
            let mut nodes = self.inner.nodes.write();
            let current = match nodes.get(path) {
                Some(node) if path != ROOT_PATH => node.stat.version,
                Some(_) => {
                    return Err(MetadataStoreError::InvalidPath {
                        path: path.to_string(),
                        reason: "the root node cannot be deleted".to_string(),
                    });
                }
                None => {
                    return Err(MetadataStoreError::NotFound {
                        path: path.to_string(),
                    });
                }
            };
            if let Some(expected) = expected_version {
                if expected != current {
                    return Err(MetadataStoreError::BadVersion {
                        path: path.to_string(),
                        expected,
                        actual: Some(current),
                    });
                }
            }
            if has_children(&nodes, path) {
                return Err(MetadataStoreError::NotEmpty {
                    path: path.to_string(),
                });
            }
            nodes.remove(path);
        }

        self.notify(NotificationType::Deleted, path);
        if let Some(parent) = parent_path(path) {
            self.notify(NotificationType::ChildrenChanged, parent);
        }
        Ok(())
    }

    async fn get_children(&self, path: &str) -> StoreResult<Vec<String>> {
        self.enter(path).await?;
        let nodes = self.inner.nodes.read();
        if !nodes.contains_key(path) {
            return Err(MetadataStoreError::NotFound {
                path: path.to_string(),
            });
        }
        Ok(collect_children(&nodes, path))
    }

    async fn exists(&self, path: &str) -> StoreResult<bool> {
        self.enter(path).await?;
        Ok(self.inner.nodes.read().contains_key(path))
    }

    fn register_listener(&self) -> broadcast::Receiver<Notification> {
        self.inner.notifications.subscribe()
    }

    async fn close(&self) -> StoreResult<()> {
        self.take_injected_failure(ROOT_PATH)?;
        if !self.inner.closed.swap(true, Ordering::SeqCst) {
            tracing::info!(nodes = self.len(), "closed in-memory metadata store");
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
