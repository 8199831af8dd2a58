//! Namespace isolation policies.
//!
//! A cluster carries a map from policy name to [`NamespaceIsolationData`].
//! [`NamespaceIsolationPolicies`] is the view brokers evaluate; matching
//! namespaces and broker hostnames against the selectors is done by the load
//! manager, not here.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Policy name -> isolation data, as stored for one cluster.
pub type IsolationPolicyMap = BTreeMap<String, NamespaceIsolationData>;

/// Parameter keys understood by the `min_available` failover policy.
pub const MIN_LIMIT_PARAM: &str = "min_limit";
pub const USAGE_THRESHOLD_PARAM: &str = "usage_threshold";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IsolationDataError {
    #[error("isolation policy must select at least one namespace")]
    NoNamespaces,

    #[error("isolation policy must name at least one primary broker")]
    NoPrimary,

    #[error("blank {0} selector")]
    BlankSelector(&'static str),

    #[error("failover parameter {name} is {reason}")]
    BadParameter { name: &'static str, reason: String },

    #[error("invalid isolation policy name {0:?}")]
    InvalidPolicyName(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AutoFailoverPolicyType {
    #[default]
    MinAvailable,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AutoFailoverPolicyData {
    pub policy_type: AutoFailoverPolicyType,
    pub parameters: BTreeMap<String, String>,
}

impl AutoFailoverPolicyData {
    /// `min_available` policy: fail over to secondaries once fewer than
    /// `min_limit` primaries are below `usage_threshold` percent usage.
    pub fn min_available(min_limit: u32, usage_threshold: u32) -> Self {
        let parameters = [
            (MIN_LIMIT_PARAM.to_string(), min_limit.to_string()),
            (USAGE_THRESHOLD_PARAM.to_string(), usage_threshold.to_string()),
        ]
        .into_iter()
        .collect();
        Self {
            policy_type: AutoFailoverPolicyType::MinAvailable,
            parameters,
        }
    }

    fn integer_param(&self, name: &'static str) -> Result<u32, IsolationDataError> {
        let raw = self
            .parameters
            .get(name)
            .ok_or_else(|| IsolationDataError::BadParameter {
                name,
                reason: "missing".to_string(),
            })?;
        raw.trim()
            .parse()
            .map_err(|_| IsolationDataError::BadParameter {
                name,
                reason: format!("not a non-negative integer: {raw:?}"),
            })
    }

    pub fn validate(&self) -> Result<(), IsolationDataError> {
        match self.policy_type {
            AutoFailoverPolicyType::MinAvailable => {
                self.integer_param(MIN_LIMIT_PARAM)?;
                let threshold = self.integer_param(USAGE_THRESHOLD_PARAM)?;
                if threshold > 100 {
                    return Err(IsolationDataError::BadParameter {
                        name: USAGE_THRESHOLD_PARAM,
                        reason: format!("a percentage above 100: {threshold}"),
                    });
                }
                Ok(())
            }
        }
    }
}

/// One isolation rule: which namespaces it covers and which brokers may own
/// their bundles.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NamespaceIsolationData {
    /// Namespace selectors (regular expressions over `tenant/namespace`).
    pub namespaces: Vec<String>,
    /// Primary broker selectors (regular expressions over hostnames).
    pub primary: Vec<String>,
    /// Secondary broker selectors, used after failover.
    pub secondary: Vec<String>,
    pub auto_failover_policy: AutoFailoverPolicyData,
}

impl NamespaceIsolationData {
    pub fn validate(&self) -> Result<(), IsolationDataError> {
        if self.namespaces.is_empty() {
            return Err(IsolationDataError::NoNamespaces);
        }
        if self.primary.is_empty() {
            return Err(IsolationDataError::NoPrimary);
        }
        let selectors = [
            ("namespace", &self.namespaces),
            ("primary", &self.primary),
            ("secondary", &self.secondary),
        ];
        for (what, list) in selectors {
            if list.iter().any(|s| s.trim().is_empty()) {
                return Err(IsolationDataError::BlankSelector(what));
            }
        }
        self.auto_failover_policy.validate()
    }
}

// ---------------------------------------------------------------------------
// View
// ---------------------------------------------------------------------------

/// The isolation policies of one cluster, as handed to the load manager.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NamespaceIsolationPolicies {
    policies: IsolationPolicyMap,
}

impl NamespaceIsolationPolicies {
    pub fn new(policies: IsolationPolicyMap) -> Self {
        Self { policies }
    }

    pub fn get_policy_by_name(&self, name: &str) -> Option<&NamespaceIsolationData> {
        self.policies.get(name)
    }

    pub fn policies(&self) -> &IsolationPolicyMap {
        &self.policies
    }

    pub fn len(&self) -> usize {
        self.policies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.policies.is_empty()
    }

    /// Insert or replace a policy after validating it.
    pub fn set_policy(
        &mut self,
        name: impl Into<String>,
        data: NamespaceIsolationData,
    ) -> Result<(), IsolationDataError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(IsolationDataError::InvalidPolicyName(name));
        }
        data.validate()?;
        self.policies.insert(name, data);
        Ok(())
    }

    /// Remove a policy, returning it if it existed.
    pub fn delete_policy(&mut self, name: &str) -> Option<NamespaceIsolationData> {
        self.policies.remove(name)
    }

    pub fn into_map(self) -> IsolationPolicyMap {
        self.policies
    }
}

impl From<IsolationPolicyMap> for NamespaceIsolationPolicies {
    fn from(policies: IsolationPolicyMap) -> Self {
        Self::new(policies)
    }
}
