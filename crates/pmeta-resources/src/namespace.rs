//! Namespace resource facade.
//!
//! [`NamespaceResources`] owns one instance of each namespace-scoped resource
//! and wires it to the store matching its replication scope:
//!
//! | resource                | store         |
//! |-------------------------|---------------|
//! | namespace policies      | configuration |
//! | partitioned topics      | configuration |
//! | isolation policies      | configuration |
//! | local policy overrides  | local         |

use std::sync::Arc;
use std::time::Duration;

use pmeta_policies::{NamespaceName, Policies};
use pmeta_store::{MetadataStore, Version, ROOT_PATH};

use crate::base::BaseResources;
use crate::config::ResourcesConfig;
use crate::error::{ResourceError, ResourceKind, Result, UnavailableCause};
use crate::isolation::IsolationPolicyResources;
use crate::local_policies::LocalPoliciesResources;
use crate::partitioned_topic::PartitionedTopicResources;
use crate::paths;

/// The two store handles of a broker process.
#[derive(Clone)]
pub struct StoreBindings {
    /// Scoped to this cluster; never replicated.
    pub local: Arc<dyn MetadataStore>,
    /// Shared by every cluster of the deployment.
    pub configuration: Arc<dyn MetadataStore>,
}

impl StoreBindings {
    pub fn new(local: Arc<dyn MetadataStore>, configuration: Arc<dyn MetadataStore>) -> Self {
        Self {
            local,
            configuration,
        }
    }

    /// Standalone deployments serve both scopes from a single store.
    pub fn shared(store: Arc<dyn MetadataStore>) -> Self {
        Self {
            local: Arc::clone(&store),
            configuration: store,
        }
    }

    fn is_shared(&self) -> bool {
        std::ptr::eq(
            Arc::as_ptr(&self.local) as *const (),
            Arc::as_ptr(&self.configuration) as *const (),
        )
    }
}

pub struct NamespaceResources {
    stores: StoreBindings,
    operation_timeout: Duration,
    policies: BaseResources<Policies>,
    isolation_policies: IsolationPolicyResources,
    local_policies: LocalPoliciesResources,
    partitioned_topics: PartitionedTopicResources,
}

impl NamespaceResources {
    pub fn new(stores: StoreBindings, operation_timeout: Duration) -> Result<Self> {
        if operation_timeout.is_zero() {
            return Err(ResourceError::InvalidConfig {
                kind: ResourceKind::NamespacePolicies,
                reason: "operation timeout must be positive".into(),
            });
        }
        let configuration = &stores.configuration;
        Ok(Self {
            policies: BaseResources::new(
                Arc::clone(configuration),
                ResourceKind::NamespacePolicies,
                operation_timeout,
            ),
            isolation_policies: IsolationPolicyResources::new(
                Arc::clone(configuration),
                operation_timeout,
            ),
            partitioned_topics: PartitionedTopicResources::new(
                Arc::clone(configuration),
                operation_timeout,
            ),
            local_policies: LocalPoliciesResources::new(
                Arc::clone(&stores.local),
                operation_timeout,
            ),
            operation_timeout,
            stores,
        })
    }

    pub fn from_config(stores: StoreBindings, config: &ResourcesConfig) -> Result<Self> {
        Self::new(stores, config.operation_timeout())
    }

    pub fn policies(&self) -> &BaseResources<Policies> {
        &self.policies
    }

    pub fn isolation_policies(&self) -> &IsolationPolicyResources {
        &self.isolation_policies
    }

    pub fn local_policies(&self) -> &LocalPoliciesResources {
        &self.local_policies
    }

    pub fn partitioned_topic_resources(&self) -> &PartitionedTopicResources {
        &self.partitioned_topics
    }

    pub fn local_store(&self) -> &Arc<dyn MetadataStore> {
        &self.stores.local
    }

    pub fn configuration_store(&self) -> &Arc<dyn MetadataStore> {
        &self.stores.configuration
    }

    pub fn operation_timeout(&self) -> Duration {
        self.operation_timeout
    }

    // ---- Namespace policies ----

    pub async fn get_policies(&self, ns: &NamespaceName) -> Result<Option<Policies>> {
        self.policies.get(&paths::namespace_policies_path(ns)).await
    }

    pub async fn create_policies(
        &self,
        ns: &NamespaceName,
        policies: &Policies,
    ) -> Result<Version> {
        let path = paths::namespace_policies_path(ns);
        self.policies.create(&path, policies).await
    }

    pub async fn set_policies<F>(&self, ns: &NamespaceName, modify: F) -> Result<Version>
    where
        F: FnOnce(Policies) -> Policies + Send,
    {
        let path = paths::namespace_policies_path(ns);
        self.policies.set(&path, modify).await
    }

    pub async fn delete_policies(&self, ns: &NamespaceName) -> Result<()> {
        let path = paths::namespace_policies_path(ns);
        self.policies.delete(&path, None).await
    }

    pub async fn namespace_exists(&self, ns: &NamespaceName) -> Result<bool> {
        let path = paths::namespace_policies_path(ns);
        self.policies.exists(&path).await
    }

    /// Namespaces of `tenant` that have policies, sorted.
    pub async fn list_namespaces(&self, tenant: &str) -> Result<Vec<NamespaceName>> {
        let kind = self.policies.kind();
        let parent = paths::tenant_policies_path(tenant)
            .map_err(|e| ResourceError::invalid_name(kind, tenant, e))?;
        let children = match self.policies.list(&parent).await {
            Ok(children) => children,
            Err(e) if e.is_not_found() => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };
        children
            .into_iter()
            .map(|name| {
                NamespaceName::new(tenant, name.as_str())
                    .map_err(|e| ResourceError::invalid_name(kind, &name, e))
            })
            .collect()
    }

    // ---- Shutdown ----

    /// Close the store handles. A handle shared by both scopes is closed once.
    /// Both handles are closed even if the first fails; the first error wins.
    pub async fn close(&self) -> Result<()> {
        let configuration = self.close_store(&self.stores.configuration).await;
        let local = if self.stores.is_shared() {
            Ok(())
        } else {
            self.close_store(&self.stores.local).await
        };
        configuration.and(local)?;
        tracing::info!("namespace resources closed");
        Ok(())
    }

    async fn close_store(&self, store: &Arc<dyn MetadataStore>) -> Result<()> {
        store
            .close()
            .await
            .map_err(|e| ResourceError::StoreUnavailable {
                kind: self.policies.kind(),
                path: ROOT_PATH.to_string(),
                cause: UnavailableCause::Store(e),
            })
    }
}
