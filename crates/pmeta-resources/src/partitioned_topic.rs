use std::ops::Deref;
use std::sync::Arc;
use std::time::Duration;

use pmeta_policies::{NamespaceName, PartitionedTopicMetadata, TopicDomain, TopicName};
use pmeta_store::{MetadataStore, Version};

use crate::base::BaseResources;
use crate::error::{ResourceError, ResourceKind, Result};
use crate::paths;

/// Partitioned-topic metadata, kept in the configuration store.
#[derive(Debug, Clone)]
pub struct PartitionedTopicResources {
    base: BaseResources<PartitionedTopicMetadata>,
}

impl PartitionedTopicResources {
    pub fn new(store: Arc<dyn MetadataStore>, operation_timeout: Duration) -> Self {
        Self {
            base: BaseResources::new(store, ResourceKind::PartitionedTopic, operation_timeout),
        }
    }

    pub async fn create_partitioned_topic(
        &self,
        topic: &TopicName,
        metadata: &PartitionedTopicMetadata,
    ) -> Result<Version> {
        let path = paths::partitioned_topic_path(topic);
        self.base.create(&path, metadata).await
    }

    pub async fn get_partitioned_topic_metadata(
        &self,
        topic: &TopicName,
    ) -> Result<Option<PartitionedTopicMetadata>> {
        self.base.get(&paths::partitioned_topic_path(topic)).await
    }

    pub async fn partitioned_topic_exists(&self, topic: &TopicName) -> Result<bool> {
        let path = paths::partitioned_topic_path(topic);
        self.base.exists(&path).await
    }

    pub async fn update_partitioned_topic<F>(
        &self,
        topic: &TopicName,
        modify: F,
    ) -> Result<Version>
    where
        F: FnOnce(PartitionedTopicMetadata) -> PartitionedTopicMetadata + Send,
    {
        let path = paths::partitioned_topic_path(topic);
        self.base.set(&path, modify).await
    }

    pub async fn delete_partitioned_topic(&self, topic: &TopicName) -> Result<()> {
        let path = paths::partitioned_topic_path(topic);
        self.base.delete(&path, None).await
    }

    /// Partitioned topics of `ns` in `domain`, sorted by local name.
    pub async fn list_partitioned_topics(
        &self,
        ns: &NamespaceName,
        domain: TopicDomain,
    ) -> Result<Vec<TopicName>> {
        let parent = paths::partitioned_topics_path(ns, domain);
        let children = match self.base.list(&parent).await {
            Ok(children) => children,
            Err(e) if e.is_not_found() => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };
        children
            .into_iter()
            .map(|name| {
                TopicName::new(domain, ns.clone(), name.as_str())
                    .map_err(|e| ResourceError::invalid_name(self.base.kind(), &name, e))
            })
            .collect()
    }
}

impl Deref for PartitionedTopicResources {
    type Target = BaseResources<PartitionedTopicMetadata>;

    fn deref(&self) -> &Self::Target {
        &self.base
    }
}
