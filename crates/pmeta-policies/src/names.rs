//! Validated tenant, namespace and topic names.
//!
//! Every name segment ends up as one segment of a store path, so a segment
//! may not be empty, contain `/`, or be `.` / `..`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NameError {
    #[error("invalid {what} {value:?}: {reason}")]
    InvalidSegment {
        what: &'static str,
        value: String,
        reason: &'static str,
    },

    #[error("invalid namespace name {0:?}: expected <tenant>/<namespace>")]
    InvalidNamespace(String),

    #[error("invalid topic name {0:?}: expected <domain>://<tenant>/<namespace>/<topic>")]
    InvalidTopic(String),

    #[error("unknown topic domain {0:?}")]
    UnknownDomain(String),
}

/// Check that `value` can be used as a single store path segment.
pub fn validate_name_segment(what: &'static str, value: &str) -> Result<(), NameError> {
    let reason = if value.is_empty() {
        "must not be empty"
    } else if value.contains('/') {
        "must not contain '/'"
    } else if value == "." || value == ".." {
        "must not be a relative path segment"
    } else if value.chars().any(char::is_control) {
        "must not contain control characters"
    } else {
        return Ok(());
    };
    Err(NameError::InvalidSegment {
        what,
        value: value.to_string(),
        reason,
    })
}

// ---------------------------------------------------------------------------
// NamespaceName
// ---------------------------------------------------------------------------

/// A `tenant/namespace` pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NamespaceName {
    tenant: String,
    namespace: String,
}

impl NamespaceName {
    pub fn new(tenant: impl Into<String>, namespace: impl Into<String>) -> Result<Self, NameError> {
        let tenant = tenant.into();
        let namespace = namespace.into();
        validate_name_segment("tenant", &tenant)?;
        validate_name_segment("namespace", &namespace)?;
        Ok(Self { tenant, namespace })
    }

    pub fn tenant(&self) -> &str {
        &self.tenant
    }

    pub fn local_name(&self) -> &str {
        &self.namespace
    }
}

impl FromStr for NamespaceName {
    type Err = NameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('/') {
            Some((tenant, namespace)) if !namespace.contains('/') => Self::new(tenant, namespace),
            _ => Err(NameError::InvalidNamespace(s.to_string())),
        }
    }
}

impl TryFrom<String> for NamespaceName {
    type Error = NameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<NamespaceName> for String {
    fn from(name: NamespaceName) -> Self {
        name.to_string()
    }
}

impl fmt::Display for NamespaceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.tenant, self.namespace)
    }
}

// ---------------------------------------------------------------------------
// TopicDomain / TopicName
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TopicDomain {
    Persistent,
    NonPersistent,
}

impl TopicDomain {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Persistent => "persistent",
            Self::NonPersistent => "non-persistent",
        }
    }
}

impl FromStr for TopicDomain {
    type Err = NameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "persistent" => Ok(Self::Persistent),
            "non-persistent" => Ok(Self::NonPersistent),
            other => Err(NameError::UnknownDomain(other.to_string())),
        }
    }
}

impl fmt::Display for TopicDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fully-qualified topic: `persistent://tenant/namespace/topic`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TopicName {
    domain: TopicDomain,
    namespace: NamespaceName,
    local_name: String,
}

impl TopicName {
    pub fn new(
        domain: TopicDomain,
        namespace: NamespaceName,
        local_name: impl Into<String>,
    ) -> Result<Self, NameError> {
        let local_name = local_name.into();
        validate_name_segment("topic", &local_name)?;
        Ok(Self {
            domain,
            namespace,
            local_name,
        })
    }

    pub fn domain(&self) -> TopicDomain {
        self.domain
    }

    pub fn namespace(&self) -> &NamespaceName {
        &self.namespace
    }

    pub fn local_name(&self) -> &str {
        &self.local_name
    }
}

impl FromStr for TopicName {
    type Err = NameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || NameError::InvalidTopic(s.to_string());
        let (domain, rest) = s.split_once("://").ok_or_else(invalid)?;
        let domain: TopicDomain = domain.parse()?;
        let mut parts = rest.splitn(3, '/');
        let (tenant, namespace, local) = match (parts.next(), parts.next(), parts.next()) {
            (Some(t), Some(n), Some(l)) => (t, n, l),
            _ => return Err(invalid()),
        };
        Self::new(domain, NamespaceName::new(tenant, namespace)?, local)
    }
}

impl fmt::Display for TopicName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}://{}/{}",
            self.domain, self.namespace, self.local_name
        )
    }
}
