//! Store path layout.
//!
//! ```text
//! /admin/policies/{tenant}/{namespace}                              configuration store
//! /admin/local-policies/{tenant}/{namespace}                        local store
//! /admin/clusters/{cluster}/namespaceIsolationPolicies              configuration store
//! /admin/partitioned-topics/{tenant}/{namespace}/{domain}/{topic}   configuration store
//! ```
//!
//! Every logical name is validated segment by segment before it is joined, so
//! a path maps back to exactly one name within its family.

use pmeta_policies::{validate_name_segment, NameError, NamespaceName, TopicDomain, TopicName};

pub const POLICIES_ROOT: &str = "/admin/policies";
pub const LOCAL_POLICIES_ROOT: &str = "/admin/local-policies";
pub const CLUSTERS_ROOT: &str = "/admin/clusters";
pub const PARTITIONED_TOPICS_ROOT: &str = "/admin/partitioned-topics";

const ISOLATION_POLICIES_NODE: &str = "namespaceIsolationPolicies";

pub fn namespace_policies_path(ns: &NamespaceName) -> String {
    format!("{POLICIES_ROOT}/{ns}")
}

/// Parent node of every namespace of `tenant`.
pub fn tenant_policies_path(tenant: &str) -> Result<String, NameError> {
    validate_name_segment("tenant", tenant)?;
    Ok(format!("{POLICIES_ROOT}/{tenant}"))
}

pub fn local_policies_path(ns: &NamespaceName) -> String {
    format!("{LOCAL_POLICIES_ROOT}/{ns}")
}

pub fn isolation_policies_path(cluster: &str) -> Result<String, NameError> {
    validate_name_segment("cluster", cluster)?;
    let node = ISOLATION_POLICIES_NODE;
    Ok(format!("{CLUSTERS_ROOT}/{cluster}/{node}"))
}

pub fn partitioned_topic_path(topic: &TopicName) -> String {
    let parent = partitioned_topics_path(topic.namespace(), topic.domain());
    format!("{parent}/{}", topic.local_name())
}

/// Parent node of the partitioned topics of one namespace and domain.
pub fn partitioned_topics_path(ns: &NamespaceName, domain: TopicDomain) -> String {
    format!("{PARTITIONED_TOPICS_ROOT}/{ns}/{}", domain.as_str())
}
