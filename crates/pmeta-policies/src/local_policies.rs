//! Cluster-local policy overrides. These live in the local store and are never
//! replicated to other clusters.

use serde::{Deserialize, Serialize};

use crate::policies::BundlesData;

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BookieAffinityGroupData {
    pub bookie_affinity_group_primary: String,
    pub bookie_affinity_group_secondary: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LocalPolicies {
    pub bundles: BundlesData,
    pub bookie_affinity_group: Option<BookieAffinityGroupData>,
    pub namespace_anti_affinity_group: Option<String>,
    pub migrated: bool,
}

impl LocalPolicies {
    /// Copy with a different bookie affinity group; the rest is preserved.
    pub fn with_bookie_affinity_group(&self, group: Option<BookieAffinityGroupData>) -> Self {
        Self {
            bookie_affinity_group: group,
            ..self.clone()
        }
    }
}
