//! Client interface of the hierarchical metadata store.
//!
//! Two independent handles exist per broker process: one scoped to the local
//! cluster and one to the configuration namespace shared by every cluster.
//! Concrete implementations live in `pmeta-store-backends`.

pub mod error;
pub mod path;
mod store;

pub use error::{MetadataStoreError, StoreResult};
pub use path::{child_name, join_path, parent_path, validate_path, ROOT_PATH};
pub use store::{GetResult, MetadataStore, Notification, NotificationType, Stat, Version};
