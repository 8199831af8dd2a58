//! Typed resource access over the broker's metadata stores.
//!
//! Callers go through [`NamespaceResources`], which routes each resource
//! family to either the local store (per cluster) or the configuration store
//! (shared by all clusters). Each family is a thin wrapper over
//! [`BaseResources<T>`], which handles JSON encoding, operation timeouts and
//! error tagging.

pub mod base;
pub mod config;
pub mod error;
pub mod isolation;
pub mod local_policies;
pub mod namespace;
pub mod partitioned_topic;
pub mod paths;

pub use base::BaseResources;
pub use config::ResourcesConfig;
pub use error::{ResourceError, ResourceKind, Result, UnavailableCause};
pub use isolation::IsolationPolicyResources;
pub use local_policies::LocalPoliciesResources;
pub use namespace::{NamespaceResources, StoreBindings};
pub use partitioned_topic::PartitionedTopicResources;
