use std::path::{Path, PathBuf};
use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::{parse_toml, Config, ConfigError};

/// Holds the current configuration and supports validated hot updates.
pub struct ConfigManager<T: Config> {
    config: ArcSwap<T>,
    path: Option<PathBuf>,
}

impl<T: Config> ConfigManager<T> {
    pub fn new(config: T) -> Self {
        Self {
            config: ArcSwap::from_pointee(config),
            path: None,
        }
    }

    /// Load and validate the configuration file at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let config = read_config::<T>(path)?;
        tracing::info!(path = %path.display(), "config loaded");
        Ok(Self {
            config: ArcSwap::from_pointee(config),
            path: Some(path.to_path_buf()),
        })
    }

    pub fn get(&self) -> arc_swap::Guard<Arc<T>> {
        self.config.load()
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Replace the whole configuration after validating it.
    pub fn update(&self, new_config: T) -> Result<(), ConfigError> {
        new_config.validate()?;
        self.config.store(Arc::new(new_config));
        Ok(())
    }
}

impl<T: Config + Clone> ConfigManager<T> {
    /// Re-read the backing file and apply only the hot-updatable fields.
    pub fn reload(&self) -> Result<(), ConfigError> {
        if let Some(ref path) = self.path {
            let new_config = read_config::<T>(path)?;
            let mut current = (*self.config.load_full()).clone();
            current.hot_update(&new_config);
            self.config.store(Arc::new(current));
            tracing::info!(path = %path.display(), "config reloaded");
        }
        Ok(())
    }

    pub fn snapshot(&self) -> T {
        (*self.config.load_full()).clone()
    }
}

fn read_config<T: Config>(path: &Path) -> Result<T, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let value = parse_toml(&content)?;
    let config = T::from_toml(&value)?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::{get_integer, get_string};

    #[derive(Debug, Clone, PartialEq)]
    struct TestConfig {
        name: String,
        limit: i64,
    }

    impl Default for TestConfig {
        fn default() -> Self {
            Self {
                name: "default".into(),
                limit: 10,
            }
        }
    }

    impl Config for TestConfig {
        fn from_toml(value: &toml::Value) -> Result<Self, ConfigError> {
            let mut cfg = Self::default();
            if let Some(name) = get_string(value, "name")? {
                cfg.name = name;
            }
            if let Some(limit) = get_integer(value, "limit")? {
                cfg.limit = limit;
            }
            Ok(cfg)
        }

        fn validate(&self) -> Result<(), ConfigError> {
            if self.limit < 1 {
                return Err(ConfigError::OutOfRange {
                    field: "limit".into(),
                    value: self.limit.to_string(),
                    min: Some("1".into()),
                    max: None,
                });
            }
            Ok(())
        }

        fn hot_update(&mut self, other: &Self) {
            // Only limit is hot-updatable.
            self.limit = other.limit;
        }

        fn render(&self) -> String {
            format!("name = \"{}\"\nlimit = {}", self.name, self.limit)
        }
    }

    fn write_file(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_load() {
        let file = write_file("name = \"a\"\nlimit = 3");
        let mgr = ConfigManager::<TestConfig>::load(file.path()).unwrap();
        assert_eq!(mgr.get().name, "a");
        assert_eq!(mgr.get().limit, 3);
        assert_eq!(mgr.path(), Some(file.path()));
    }

    #[test]
    fn test_load_rejects_invalid() {
        let file = write_file("limit = 0");
        assert!(matches!(
            ConfigManager::<TestConfig>::load(file.path()),
            Err(ConfigError::OutOfRange { .. })
        ));

        let file = write_file("limit = ");
        assert!(matches!(
            ConfigManager::<TestConfig>::load(file.path()),
            Err(ConfigError::Parse(_))
        ));

        assert!(matches!(
            ConfigManager::<TestConfig>::load("/nonexistent/pmeta.toml"),
            Err(ConfigError::Io(_))
        ));
    }

    #[test]
    fn test_update_validates() {
        let mgr = ConfigManager::new(TestConfig::default());
        assert!(mgr
            .update(TestConfig {
                limit: 0,
                ..TestConfig::default()
            })
            .is_err());
        assert_eq!(mgr.get().limit, 10);
    }

    #[test]
    fn test_reload_applies_only_hot_fields() {
        let file = write_file("name = \"a\"\nlimit = 3");
        let mgr = ConfigManager::<TestConfig>::load(file.path()).unwrap();

        std::fs::write(file.path(), "name = \"b\"\nlimit = 7").unwrap();

        mgr.reload().unwrap();
        let snap = mgr.snapshot();
        assert_eq!(snap.name, "a");
        assert_eq!(snap.limit, 7);
    }
}
