//! Metadata store backend implementations.
//!
//! - **memory** -- In-process hierarchical store backed by a `BTreeMap`.
//!   Used for standalone mode and as the test harness for the resource layer.

pub mod memory;

pub use memory::MemoryMetadataStore;
