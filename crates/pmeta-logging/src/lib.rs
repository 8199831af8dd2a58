use std::path::PathBuf;

use pmeta_config::{get_bool, get_string, Config, ConfigError};
use serde::{Deserialize, Serialize};
use tracing_appender::rolling;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Re-export tracing macros for convenience.
pub use tracing::{debug, error, info, instrument, trace, warn};

#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("failed to create log file appender in {dir}: {source}")]
    Appender {
        dir: PathBuf,
        #[source]
        source: rolling::InitError,
    },

    #[error("a global subscriber is already installed")]
    AlreadyInitialized,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rotation {
    #[default]
    Hourly,
    Daily,
    Never,
}

impl Rotation {
    fn parse(s: &str) -> Option<Self> {
        match s {
            "hourly" => Some(Self::Hourly),
            "daily" => Some(Self::Daily),
            "never" => Some(Self::Never),
            _ => None,
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            Self::Hourly => "hourly",
            Self::Daily => "daily",
            Self::Never => "never",
        }
    }
}

impl From<Rotation> for rolling::Rotation {
    fn from(r: Rotation) -> Self {
        match r {
            Rotation::Hourly => rolling::Rotation::HOURLY,
            Rotation::Daily => rolling::Rotation::DAILY,
            Rotation::Never => rolling::Rotation::NEVER,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogConfig {
    /// Log level filter (trace, debug, info, warn, error). `RUST_LOG` wins.
    #[serde(default = "default_level")]
    pub level: String,

    /// Directory for log files. If None, no file logging.
    pub log_dir: Option<PathBuf>,

    /// Prefix for log file names.
    #[serde(default = "default_prefix")]
    pub file_prefix: String,

    #[serde(default)]
    pub rotation: Rotation,

    /// Whether to output JSON format.
    #[serde(default)]
    pub json_format: bool,

    /// Whether to also output to console (stdout).
    #[serde(default = "default_true")]
    pub console_output: bool,
}

fn default_level() -> String {
    "info".into()
}

fn default_prefix() -> String {
    "pmeta".into()
}

fn default_true() -> bool {
    true
}

impl Default for LogConfig {
    fn default() -> Self {
        LogConfig {
            level: default_level(),
            log_dir: None,
            file_prefix: default_prefix(),
            rotation: Rotation::default(),
            json_format: false,
            console_output: true,
        }
    }
}

impl LogConfig {
    /// The fields as a TOML table, for embedding in a larger document.
    pub fn to_table(&self) -> toml::Table {
        let mut table = toml::Table::new();
        table.insert("level".into(), self.level.clone().into());
        if let Some(dir) = &self.log_dir {
            let dir = dir.to_string_lossy().into_owned();
            table.insert("log_dir".into(), dir.into());
        }
        table.insert("file_prefix".into(), self.file_prefix.clone().into());
        table.insert("rotation".into(), self.rotation.as_str().into());
        table.insert("json_format".into(), self.json_format.into());
        table.insert("console_output".into(), self.console_output.into());
        table
    }
}

impl Config for LogConfig {
    fn from_toml(value: &toml::Value) -> Result<Self, ConfigError> {
        let mut cfg = Self::default();
        if let Some(level) = get_string(value, "level")? {
            cfg.level = level;
        }
        if let Some(dir) = get_string(value, "log_dir")? {
            cfg.log_dir = Some(PathBuf::from(dir));
        }
        if let Some(prefix) = get_string(value, "file_prefix")? {
            cfg.file_prefix = prefix;
        }
        if let Some(rotation) = get_string(value, "rotation")? {
            cfg.rotation = Rotation::parse(&rotation).ok_or_else(|| ConfigError::TypeMismatch {
                field: "rotation".into(),
                expected: "one of hourly, daily, never".into(),
            })?;
        }
        if let Some(json) = get_bool(value, "json_format")? {
            cfg.json_format = json;
        }
        if let Some(console) = get_bool(value, "console_output")? {
            cfg.console_output = console;
        }
        Ok(cfg)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if EnvFilter::try_new(&self.level).is_err() {
            return Err(ConfigError::TypeMismatch {
                field: "level".into(),
                expected: "a tracing filter directive".into(),
            });
        }
        Ok(())
    }

    fn hot_update(&mut self, _other: &Self) {
        // The subscriber is installed once; nothing here can change live.
    }

    fn render(&self) -> String {
        self.to_table().to_string()
    }
}

/// Initialize the logging system. Should be called once at program startup.
/// Returns a guard that must be held alive for the duration of the program
/// (for the non-blocking file writer).
pub fn init_logging(
    config: &LogConfig,
) -> Result<Option<tracing_appender::non_blocking::WorkerGuard>, LoggingError> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let registry = tracing_subscriber::registry().with(env_filter);

    let console_layer: Option<Box<dyn tracing_subscriber::Layer<_> + Send + Sync>> =
        if config.console_output {
            if config.json_format {
                Some(Box::new(fmt::layer().json()))
            } else {
                Some(Box::new(fmt::layer()))
            }
        } else {
            None
        };

    let (file_layer, guard): (
        Option<Box<dyn tracing_subscriber::Layer<_> + Send + Sync>>,
        Option<tracing_appender::non_blocking::WorkerGuard>,
    ) = if let Some(ref log_dir) = config.log_dir {
        let file_appender = rolling::RollingFileAppender::builder()
            .rotation(config.rotation.into())
            .filename_prefix(&config.file_prefix)
            .filename_suffix("log")
            .build(log_dir)
            .map_err(|source| LoggingError::Appender {
                dir: log_dir.clone(),
                source,
            })?;

        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        let layer: Box<dyn tracing_subscriber::Layer<_> + Send + Sync> = if config.json_format {
            Box::new(fmt::layer().json().with_writer(non_blocking))
        } else {
            Box::new(fmt::layer().with_writer(non_blocking))
        };

        (Some(layer), Some(guard))
    } else {
        (None, None)
    };

    registry
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|_| LoggingError::AlreadyInitialized)?;

    Ok(guard)
}
