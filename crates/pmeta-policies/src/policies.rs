//! Namespace-wide policies, stored in the configuration store so that every
//! broker in every cluster observes the same values.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

/// Bundle split of a namespace's hash range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BundlesData {
    /// Hex-encoded range boundaries, `num_bundles + 1` entries.
    pub boundaries: Vec<String>,
    pub num_bundles: u32,
}

impl BundlesData {
    pub const FULL_LOWER_BOUND: u32 = 0x0000_0000;
    pub const FULL_UPPER_BOUND: u32 = 0xffff_ffff;

    /// Split the full 32-bit hash range into `num_bundles` equal bundles.
    pub fn with_num_bundles(num_bundles: u32) -> Self {
        let num_bundles = num_bundles.max(1);
        let step = u64::from(Self::FULL_UPPER_BOUND) / u64::from(num_bundles);
        let mut boundaries: Vec<String> = (0..num_bundles)
            .map(|i| format!("0x{:08x}", u64::from(i) * step))
            .collect();
        boundaries.push(format!("0x{:08x}", Self::FULL_UPPER_BOUND));
        Self {
            boundaries,
            num_bundles,
        }
    }
}

impl Default for BundlesData {
    fn default() -> Self {
        Self::with_num_bundles(4)
    }
}

/// Backlog quota for one quota type (`destination_storage`, `message_age`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BacklogQuota {
    pub limit_size: i64,
    #[serde(default)]
    pub limit_time: i32,
    /// `producer_request_hold`, `producer_exception` or `consumer_backlog_eviction`.
    pub policy: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetentionPolicies {
    pub retention_time_in_minutes: i32,
    #[serde(rename = "retentionSizeInMB")]
    pub retention_size_in_mb: i64,
}

/// Namespace policies.
///
/// Unset optional fields fall back to the broker-wide defaults; the resource
/// layer does not resolve them.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Policies {
    pub replication_clusters: BTreeSet<String>,
    pub bundles: Option<BundlesData>,
    pub backlog_quota_map: BTreeMap<String, BacklogQuota>,
    pub message_ttl_in_seconds: Option<i32>,
    pub retention_policies: Option<RetentionPolicies>,
    pub deduplication_enabled: Option<bool>,
    pub max_producers_per_topic: Option<i32>,
    pub max_consumers_per_topic: Option<i32>,
    pub encryption_required: bool,
    pub namespace_anti_affinity_group: Option<String>,
    pub deleted: bool,
    pub properties: BTreeMap<String, String>,
}

impl Policies {
    /// Policies replicated to the given clusters, everything else defaulted.
    pub fn for_clusters<I, S>(clusters: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            replication_clusters: clusters.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }
}
