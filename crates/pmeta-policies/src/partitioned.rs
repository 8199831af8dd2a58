use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Partition count and properties of a partitioned topic.
///
/// `partitions == 0` denotes a non-partitioned topic.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PartitionedTopicMetadata {
    pub partitions: u32,
    pub properties: Option<BTreeMap<String, String>>,
    pub deleted: bool,
}

impl PartitionedTopicMetadata {
    pub fn new(partitions: u32) -> Self {
        Self {
            partitions,
            ..Self::default()
        }
    }

    pub fn is_partitioned(&self) -> bool {
        self.partitions > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new() {
        let m = PartitionedTopicMetadata::new(8);
        assert!(m.is_partitioned());
        assert!(!PartitionedTopicMetadata::default().is_partitioned());
    }

    #[test]
    fn test_decode_minimal_document() {
        let m: PartitionedTopicMetadata = serde_json::from_str(r#"{"partitions":3}"#).unwrap();
        assert_eq!(m.partitions, 3);
        assert!(m.properties.is_none());
        assert!(!m.deleted);
    }
}
