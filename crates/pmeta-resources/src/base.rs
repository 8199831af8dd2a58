//! Typed access to one family of metadata store nodes.
//!
//! [`BaseResources<T>`] turns the byte-level [`MetadataStore`] interface into
//! typed reads and writes: values are JSON documents, every store call is
//! bounded by the operation timeout, and every failure names the path and
//! resource kind it concerned. Nothing is cached; the store is the system of
//! record.

use std::fmt;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

use pmeta_store::{MetadataStore, Stat, StoreResult, Version};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{ResourceError, ResourceKind, Result, UnavailableCause};

pub struct BaseResources<T> {
    store: Arc<dyn MetadataStore>,
    kind: ResourceKind,
    operation_timeout: Duration,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for BaseResources<T> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            kind: self.kind,
            operation_timeout: self.operation_timeout,
            _marker: PhantomData,
        }
    }
}

impl<T> fmt::Debug for BaseResources<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BaseResources")
            .field("kind", &self.kind)
            .field("operation_timeout", &self.operation_timeout)
            .finish_non_exhaustive()
    }
}

impl<T> BaseResources<T>
where
    T: Serialize + DeserializeOwned + Send + Sync,
{
    pub fn new(
        store: Arc<dyn MetadataStore>,
        kind: ResourceKind,
        operation_timeout: Duration,
    ) -> Self {
        Self {
            store,
            kind,
            operation_timeout,
            _marker: PhantomData,
        }
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    pub fn operation_timeout(&self) -> Duration {
        self.operation_timeout
    }

    pub fn store(&self) -> &Arc<dyn MetadataStore> {
        &self.store
    }

    // ---- Reads ----

    /// Read and decode the value at `path`. A missing node is `Ok(None)`.
    pub async fn get(&self, path: &str) -> Result<Option<T>> {
        Ok(self.get_with_stat(path).await?.map(|(value, _)| value))
    }

    /// Like [`get`](Self::get), also returning the node's stat.
    pub async fn get_with_stat(&self, path: &str) -> Result<Option<(T, Stat)>> {
        let Some(res) = self.call(path, self.store.get(path)).await? else {
            tracing::debug!(kind = %self.kind, path, "get: absent");
            return Ok(None);
        };
        let value = self.decode(path, &res.value)?;
        tracing::debug!(kind = %self.kind, path, version = %res.stat.version, "get");
        Ok(Some((value, res.stat)))
    }

    pub async fn exists(&self, path: &str) -> Result<bool> {
        self.call(path, self.store.exists(path)).await
    }

    /// Names of the immediate children of `parent`, sorted.
    ///
    /// Fails with `NotFound` when `parent` itself does not exist.
    pub async fn list(&self, parent: &str) -> Result<Vec<String>> {
        let children = self.call(parent, self.store.get_children(parent)).await?;
        tracing::debug!(kind = %self.kind, path = parent, count = children.len(), "list");
        Ok(children)
    }

    // ---- Writes ----

    /// Encode and write `value` at `path`, returning the new version.
    ///
    /// With `expected_version` the write only succeeds if the stored version
    /// matches; otherwise it is last-writer-wins and creates the node if
    /// needed.
    pub async fn put(
        &self,
        path: &str,
        value: &T,
        expected_version: Option<Version>,
    ) -> Result<Version> {
        let bytes = self.encode(path, value)?;
        let put = self.store.put(path, &bytes, expected_version);
        let stat = self.call(path, put).await?;
        tracing::debug!(kind = %self.kind, path, version = %stat.version, "put");
        Ok(stat.version)
    }

    /// Write `value` only if nothing exists at `path` yet.
    pub async fn create(&self, path: &str, value: &T) -> Result<Version> {
        self.put(path, value, Some(Version::NEW)).await
    }

    pub async fn delete(&self, path: &str, expected_version: Option<Version>) -> Result<()> {
        self.call(path, self.store.delete(path, expected_version)).await?;
        tracing::debug!(kind = %self.kind, path, "delete");
        Ok(())
    }

    /// One read-modify-write cycle, conditional on the version that was read.
    ///
    /// `NotFound` if the node is absent. A concurrent write between the read
    /// and the write surfaces as `VersionConflict`; there is no retry.
    pub async fn set<F>(&self, path: &str, modify: F) -> Result<Version>
    where
        F: FnOnce(T) -> T + Send,
    {
        let Some((current, stat)) = self.get_with_stat(path).await? else {
            return Err(ResourceError::NotFound {
                kind: self.kind,
                path: path.to_string(),
            });
        };
        self.put(path, &modify(current), Some(stat.version)).await
    }

    /// Like [`set`](Self::set), but an absent node is created from
    /// `modify(None)`. Losing the creation race is a `VersionConflict`.
    pub async fn set_with_create<F>(&self, path: &str, modify: F) -> Result<Version>
    where
        F: FnOnce(Option<T>) -> T + Send,
    {
        match self.get_with_stat(path).await? {
            Some((current, stat)) => {
                let next = modify(Some(current));
                self.put(path, &next, Some(stat.version)).await
            }
            None => match self.create(path, &modify(None)).await {
                Err(ResourceError::AlreadyExists { kind, path }) => {
                    Err(ResourceError::VersionConflict {
                        kind,
                        path,
                        expected: Version::NEW,
                        actual: None,
                    })
                }
                res => res,
            },
        }
    }

    // ---- Helpers ----

    async fn call<R, F>(&self, path: &str, fut: F) -> Result<R>
    where
        F: Future<Output = StoreResult<R>>,
    {
        let kind = self.kind;
        match tokio::time::timeout(self.operation_timeout, fut).await {
            Ok(res) => res.map_err(|e| ResourceError::from_store(kind, path, e)),
            Err(_) => Err(ResourceError::StoreUnavailable {
                kind: self.kind,
                path: path.to_string(),
                cause: UnavailableCause::Timeout(self.operation_timeout),
            }),
        }
    }

    fn decode(&self, path: &str, bytes: &[u8]) -> Result<T> {
        serde_json::from_slice(bytes).map_err(|source| ResourceError::Deserialization {
            kind: self.kind,
            path: path.to_string(),
            source,
        })
    }

    fn encode(&self, path: &str, value: &T) -> Result<Vec<u8>> {
        serde_json::to_vec(value).map_err(|source| ResourceError::Serialization {
            kind: self.kind,
            path: path.to_string(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use pmeta_store_backends::MemoryMetadataStore;
    use serde::Deserialize;

    use super::*;

    #[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
    struct Doc {
        name: String,
        count: u32,
    }

    fn doc(name: &str, count: u32) -> Doc {
        Doc {
            name: name.into(),
            count,
        }
    }

    fn resources(store: &MemoryMetadataStore) -> BaseResources<Doc> {
        BaseResources::new(
            Arc::new(store.clone()),
            ResourceKind::NamespacePolicies,
            Duration::from_secs(5),
        )
    }

    #[tokio::test]
    async fn test_put_get_round_trip() {
        let store = MemoryMetadataStore::new();
        let res = resources(&store);

        let v0 = res.put("/docs/a", &doc("a", 1), None).await.unwrap();
        assert_eq!(v0, Version::INITIAL);
        assert_eq!(res.get("/docs/a").await.unwrap(), Some(doc("a", 1)));

        let v1 = res.put("/docs/a", &doc("a", 2), None).await.unwrap();
        assert_eq!(v1, Version(1));
        let (value, stat) = res.get_with_stat("/docs/a").await.unwrap().unwrap();
        assert_eq!(value, doc("a", 2));
        assert_eq!(stat.version, Version(1));
    }

    #[tokio::test]
    async fn test_absent_is_none() {
        let store = MemoryMetadataStore::new();
        let res = resources(&store);
        assert_eq!(res.get("/docs/missing").await.unwrap(), None);
        assert!(!res.exists("/docs/missing").await.unwrap());
    }

    #[tokio::test]
    async fn test_conditional_put() {
        let store = MemoryMetadataStore::new();
        let res = resources(&store);
        let v0 = res.put("/docs/a", &doc("a", 1), None).await.unwrap();
        let v1 = res.put("/docs/a", &doc("a", 2), Some(v0)).await.unwrap();

        let stale = doc("a", 3);
        let err = res.put("/docs/a", &stale, Some(v0)).await.unwrap_err();
        assert!(err.is_version_conflict());
        let (value, stat) = res.get_with_stat("/docs/a").await.unwrap().unwrap();
        assert_eq!(value, doc("a", 2));
        assert_eq!(stat.version, v1);

        let err = res
            .put("/docs/b", &doc("b", 1), Some(Version(0)))
            .await
            .unwrap_err();
        assert!(err.is_version_conflict());
    }

    #[tokio::test]
    async fn test_create_twice() {
        let store = MemoryMetadataStore::new();
        let res = resources(&store);
        res.create("/docs/a", &doc("a", 1)).await.unwrap();
        let err = res.create("/docs/a", &doc("a", 2)).await.unwrap_err();
        assert!(err.is_already_exists());
        assert_eq!(res.get("/docs/a").await.unwrap(), Some(doc("a", 1)));
    }

    #[tokio::test]
    async fn test_delete() {
        let store = MemoryMetadataStore::new();
        let res = resources(&store);
        let v0 = res.put("/docs/a", &doc("a", 1), None).await.unwrap();

        let err = res.delete("/docs/a", Some(v0.next())).await.unwrap_err();
        assert!(err.is_version_conflict());
        res.delete("/docs/a", Some(v0)).await.unwrap();
        assert!(!res.exists("/docs/a").await.unwrap());

        let err = res.delete("/docs/a", None).await.unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err.path(), Some("/docs/a"));
    }

    #[tokio::test]
    async fn test_delete_parent_with_children() {
        let store = MemoryMetadataStore::new();
        let res = resources(&store);
        res.put("/docs/a", &doc("a", 1), None).await.unwrap();
        let err = res.delete("/docs", None).await.unwrap_err();
        assert!(matches!(err, ResourceError::NotEmpty { .. }));
    }

    #[tokio::test]
    async fn test_list() {
        let store = MemoryMetadataStore::new();
        let res = resources(&store);
        for name in ["c", "a", "b"] {
            res.put(&format!("/docs/{name}"), &doc(name, 0), None)
                .await
                .unwrap();
        }
        assert_eq!(res.list("/docs").await.unwrap(), vec!["a", "b", "c"]);
        assert!(res.list("/docs/a").await.unwrap().is_empty());
        assert!(res.list("/nothing").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_set() {
        let store = MemoryMetadataStore::new();
        let res = resources(&store);

        let err = res
            .set("/docs/a", |d| Doc {
                count: d.count + 1,
                ..d
            })
            .await
            .unwrap_err();
        assert!(err.is_not_found());

        res.put("/docs/a", &doc("a", 1), None).await.unwrap();
        let v = res
            .set("/docs/a", |d| Doc {
                count: d.count + 1,
                ..d
            })
            .await
            .unwrap();
        assert_eq!(v, Version(1));
        assert_eq!(res.get("/docs/a").await.unwrap(), Some(doc("a", 2)));
    }

    #[tokio::test]
    async fn test_set_with_create() {
        let store = MemoryMetadataStore::new();
        let res = resources(&store);

        let bump = |d: Option<Doc>| {
            let d = d.unwrap_or_else(|| doc("fresh", 0));
            Doc {
                count: d.count + 1,
                ..d
            }
        };
        assert_eq!(
            res.set_with_create("/docs/a", bump).await.unwrap(),
            Version::INITIAL
        );
        assert_eq!(
            res.set_with_create("/docs/a", bump).await.unwrap(),
            Version(1)
        );
        assert_eq!(res.get("/docs/a").await.unwrap(), Some(doc("fresh", 2)));
    }

    #[tokio::test]
    async fn test_malformed_bytes() {
        let store = MemoryMetadataStore::new();
        store.put("/docs/a", b"{not json", None).await.unwrap();
        let res = resources(&store);
        let err = res.get("/docs/a").await.unwrap_err();
        assert!(matches!(err, ResourceError::Deserialization { .. }));
        assert_eq!(err.path(), Some("/docs/a"));
    }

    #[tokio::test]
    async fn test_schema_mismatch() {
        let store = MemoryMetadataStore::new();
        store
            .put("/docs/a", br#"{"name": 3, "count": "x"}"#, None)
            .await
            .unwrap();
        let err = resources(&store).get("/docs/a").await.unwrap_err();
        assert!(matches!(err, ResourceError::Deserialization { .. }));
    }

    #[tokio::test]
    async fn test_map_values() {
        let store = MemoryMetadataStore::new();
        let res: BaseResources<BTreeMap<String, u32>> = BaseResources::new(
            Arc::new(store),
            ResourceKind::IsolationPolicies,
            Duration::from_secs(5),
        );
        let map: BTreeMap<String, u32> = [("x".to_string(), 1)].into_iter().collect();
        res.put("/maps/m", &map, None).await.unwrap();
        assert_eq!(res.get("/maps/m").await.unwrap(), Some(map));
    }

    #[tokio::test]
    async fn test_invalid_path() {
        let store = MemoryMetadataStore::new();
        let err = resources(&store).get("relative/path").await.unwrap_err();
        assert!(matches!(err, ResourceError::InvalidPath { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_is_unavailable() {
        let store = MemoryMetadataStore::new();
        store.set_latency(Some(Duration::from_secs(60)));
        let err = resources(&store).get("/docs/a").await.unwrap_err();
        match err {
            ResourceError::StoreUnavailable {
                cause: UnavailableCause::Timeout(d),
                ..
            } => assert_eq!(d, Duration::from_secs(5)),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_transport_failure_is_unavailable() {
        let store = MemoryMetadataStore::new();
        let res = resources(&store);
        store.fail_next(1);
        let err = res.put("/docs/a", &doc("a", 1), None).await.unwrap_err();
        assert!(err.is_store_unavailable());
        assert_eq!(res.get("/docs/a").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_closed_store_is_unavailable() {
        let store = MemoryMetadataStore::new();
        let res = resources(&store);
        store.close().await.unwrap();
        let err = res.exists("/docs").await.unwrap_err();
        assert!(err.is_store_unavailable());
    }
}
