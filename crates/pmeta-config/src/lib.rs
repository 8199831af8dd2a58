//! Configuration support.
//!
//! A configuration type implements [`Config`]: it is parsed from a TOML table,
//! validated, and knows which of its fields may change while the process is
//! running. [`ConfigManager`] holds the current value and swaps it atomically.

mod manager;

pub use manager::ConfigManager;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("config field {field} has wrong type, expected {expected}")]
    TypeMismatch { field: String, expected: String },

    #[error("config field {field} = {value} out of range [{}, {}]",
        .min.as_deref().unwrap_or("-inf"), .max.as_deref().unwrap_or("+inf"))]
    OutOfRange {
        field: String,
        value: String,
        min: Option<String>,
        max: Option<String>,
    },
}

/// A configuration section loadable from TOML.
pub trait Config: Sized + Send + Sync + 'static {
    /// Build from a TOML table. Missing keys take their defaults.
    fn from_toml(value: &toml::Value) -> Result<Self, ConfigError>;

    /// Check field ranges and cross-field constraints.
    fn validate(&self) -> Result<(), ConfigError>;

    /// Copy the hot-updatable fields of `other` into `self`.
    fn hot_update(&mut self, other: &Self);

    /// Render as TOML text.
    fn render(&self) -> String;
}

/// Parse a TOML document into a table value.
pub fn parse_toml(content: &str) -> Result<toml::Value, ConfigError> {
    Ok(toml::from_str(content)?)
}

/// Read an optional integer field from a TOML table.
pub fn get_integer(value: &toml::Value, field: &str) -> Result<Option<i64>, ConfigError> {
    match value.get(field) {
        None => Ok(None),
        Some(v) => v
            .as_integer()
            .map(Some)
            .ok_or_else(|| ConfigError::TypeMismatch {
                field: field.into(),
                expected: "integer".into(),
            }),
    }
}

/// Read an optional string field from a TOML table.
pub fn get_string(value: &toml::Value, field: &str) -> Result<Option<String>, ConfigError> {
    match value.get(field) {
        None => Ok(None),
        Some(v) => v
            .as_str()
            .map(|s| Some(s.to_string()))
            .ok_or_else(|| ConfigError::TypeMismatch {
                field: field.into(),
                expected: "string".into(),
            }),
    }
}

/// Read an optional boolean field from a TOML table.
pub fn get_bool(value: &toml::Value, field: &str) -> Result<Option<bool>, ConfigError> {
    match value.get(field) {
        None => Ok(None),
        Some(v) => v
            .as_bool()
            .map(Some)
            .ok_or_else(|| ConfigError::TypeMismatch {
                field: field.into(),
                expected: "boolean".into(),
            }),
    }
}
