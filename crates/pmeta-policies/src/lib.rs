//! Data types stored by the broker resource layer.
//!
//! Every type here is (de)serialized as JSON with the field names the broker
//! has always used on disk, so documents written by older brokers still load.
//!
//! - [`names`] - validated tenant / namespace / topic names
//! - [`policies`] - namespace-wide [`Policies`] (configuration store)
//! - [`local_policies`] - per-cluster [`LocalPolicies`] (local store)
//! - [`isolation`] - [`NamespaceIsolationData`] and its policy-set view
//! - [`partitioned`] - [`PartitionedTopicMetadata`]

pub mod isolation;
pub mod local_policies;
pub mod names;
pub mod partitioned;
pub mod policies;

pub use isolation::{
    AutoFailoverPolicyData, AutoFailoverPolicyType, IsolationDataError, IsolationPolicyMap,
    NamespaceIsolationData, NamespaceIsolationPolicies,
};
pub use local_policies::{BookieAffinityGroupData, LocalPolicies};
pub use names::{validate_name_segment, NameError, NamespaceName, TopicDomain, TopicName};
pub use partitioned::PartitionedTopicMetadata;
pub use policies::{BacklogQuota, BundlesData, Policies, RetentionPolicies};
