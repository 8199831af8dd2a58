use std::time::Duration;

use pmeta_config::{get_integer, get_string, Config, ConfigError};
use pmeta_policies::validate_name_segment;

/// Configuration of the resource layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourcesConfig {
    /// Upper bound on every metadata store call, in seconds.
    pub operation_timeout_secs: u64,
    /// Name of the local cluster; selects the isolation policy node.
    pub cluster_name: String,
}

impl ResourcesConfig {
    pub const MIN_TIMEOUT_SECS: u64 = 1;
    pub const MAX_TIMEOUT_SECS: u64 = 3600;

    pub fn operation_timeout(&self) -> Duration {
        Duration::from_secs(self.operation_timeout_secs)
    }

    /// The fields as a TOML table, for embedding in a larger document.
    pub fn to_table(&self) -> toml::Table {
        let secs = i64::try_from(self.operation_timeout_secs).unwrap_or(i64::MAX);
        let mut table = toml::Table::new();
        table.insert("operation_timeout_secs".into(), secs.into());
        table.insert("cluster_name".into(), self.cluster_name.clone().into());
        table
    }
}

impl Default for ResourcesConfig {
    fn default() -> Self {
        Self {
            operation_timeout_secs: 30,
            cluster_name: "standalone".into(),
        }
    }
}

impl Config for ResourcesConfig {
    fn from_toml(value: &toml::Value) -> Result<Self, ConfigError> {
        let mut cfg = Self::default();
        if let Some(secs) = get_integer(value, "operation_timeout_secs")? {
            cfg.operation_timeout_secs = match u64::try_from(secs) {
                Ok(secs) => secs,
                Err(_) => return Err(timeout_out_of_range(secs)),
            };
        }
        if let Some(name) = get_string(value, "cluster_name")? {
            cfg.cluster_name = name;
        }
        Ok(cfg)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let range = Self::MIN_TIMEOUT_SECS..=Self::MAX_TIMEOUT_SECS;
        if !range.contains(&self.operation_timeout_secs) {
            return Err(timeout_out_of_range(self.operation_timeout_secs));
        }
        if validate_name_segment("cluster", &self.cluster_name).is_err() {
            return Err(ConfigError::TypeMismatch {
                field: "cluster_name".into(),
                expected: "a single path segment".into(),
            });
        }
        Ok(())
    }

    fn hot_update(&mut self, _other: &Self) {
        // The timeout is baked into every resource at construction and the
        // cluster name selects store paths; neither changes live.
    }

    fn render(&self) -> String {
        self.to_table().to_string()
    }
}

fn timeout_out_of_range(value: impl ToString) -> ConfigError {
    ConfigError::OutOfRange {
        field: "operation_timeout_secs".into(),
        value: value.to_string(),
        min: Some(ResourcesConfig::MIN_TIMEOUT_SECS.to_string()),
        max: Some(ResourcesConfig::MAX_TIMEOUT_SECS.to_string()),
    }
}
