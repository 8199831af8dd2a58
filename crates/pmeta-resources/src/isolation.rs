use std::ops::Deref;
use std::sync::Arc;
use std::time::Duration;

use pmeta_policies::{IsolationPolicyMap, NamespaceIsolationPolicies};
use pmeta_store::{MetadataStore, Version};

use crate::base::BaseResources;
use crate::error::{ResourceError, ResourceKind, Result};
use crate::paths;

/// Per-cluster namespace isolation policies, kept in the configuration store.
#[derive(Debug, Clone)]
pub struct IsolationPolicyResources {
    base: BaseResources<IsolationPolicyMap>,
}

impl IsolationPolicyResources {
    pub fn new(store: Arc<dyn MetadataStore>, operation_timeout: Duration) -> Self {
        Self {
            base: BaseResources::new(store, ResourceKind::IsolationPolicies, operation_timeout),
        }
    }

    /// The policy set stored at `path`, or `None` if nothing is stored there.
    pub async fn get_policies(&self, path: &str) -> Result<Option<NamespaceIsolationPolicies>> {
        let map = self.base.get(path).await?;
        Ok(map.map(NamespaceIsolationPolicies::new))
    }

    pub async fn get_isolation_data_policies(
        &self,
        cluster: &str,
    ) -> Result<Option<NamespaceIsolationPolicies>> {
        self.get_policies(&self.cluster_path(cluster)?).await
    }

    /// Read-modify-write the policy map of `cluster`; an absent map starts empty.
    pub async fn set_isolation_data_with_create<F>(
        &self,
        cluster: &str,
        modify: F,
    ) -> Result<Version>
    where
        F: FnOnce(IsolationPolicyMap) -> IsolationPolicyMap + Send,
    {
        let path = self.cluster_path(cluster)?;
        self.base
            .set_with_create(&path, |current| modify(current.unwrap_or_default()))
            .await
    }

    pub async fn delete_isolation_data(&self, cluster: &str) -> Result<()> {
        self.base.delete(&self.cluster_path(cluster)?, None).await
    }

    fn cluster_path(&self, cluster: &str) -> Result<String> {
        let kind = self.base.kind();
        paths::isolation_policies_path(cluster)
            .map_err(|e| ResourceError::invalid_name(kind, cluster, e))
    }
}

impl Deref for IsolationPolicyResources {
    type Target = BaseResources<IsolationPolicyMap>;

    fn deref(&self) -> &Self::Target {
        &self.base
    }
}
