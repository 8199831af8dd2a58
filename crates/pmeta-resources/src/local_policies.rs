use std::ops::Deref;
use std::sync::Arc;
use std::time::Duration;

use pmeta_policies::{LocalPolicies, NamespaceName};
use pmeta_store::{MetadataStore, Version};

use crate::base::BaseResources;
use crate::error::{ResourceKind, Result};
use crate::paths;

/// Cluster-local namespace overrides, kept in the local store.
#[derive(Debug, Clone)]
pub struct LocalPoliciesResources {
    base: BaseResources<LocalPolicies>,
}

impl LocalPoliciesResources {
    pub fn new(store: Arc<dyn MetadataStore>, operation_timeout: Duration) -> Self {
        Self {
            base: BaseResources::new(store, ResourceKind::LocalPolicies, operation_timeout),
        }
    }

    pub async fn get_local_policies(&self, ns: &NamespaceName) -> Result<Option<LocalPolicies>> {
        self.base.get(&paths::local_policies_path(ns)).await
    }

    pub async fn create_local_policies(
        &self,
        ns: &NamespaceName,
        policies: &LocalPolicies,
    ) -> Result<Version> {
        let path = paths::local_policies_path(ns);
        self.base.create(&path, policies).await
    }

    pub async fn set_local_policies<F>(&self, ns: &NamespaceName, modify: F) -> Result<Version>
    where
        F: FnOnce(LocalPolicies) -> LocalPolicies + Send,
    {
        self.base.set(&paths::local_policies_path(ns), modify).await
    }

    pub async fn set_local_policies_with_create<F>(
        &self,
        ns: &NamespaceName,
        modify: F,
    ) -> Result<Version>
    where
        F: FnOnce(Option<LocalPolicies>) -> LocalPolicies + Send,
    {
        let path = paths::local_policies_path(ns);
        self.base.set_with_create(&path, modify).await
    }

    pub async fn delete_local_policies(&self, ns: &NamespaceName) -> Result<()> {
        let path = paths::local_policies_path(ns);
        self.base.delete(&path, None).await
    }
}

impl Deref for LocalPoliciesResources {
    type Target = BaseResources<LocalPolicies>;

    fn deref(&self) -> &Self::Target {
        &self.base
    }
}
