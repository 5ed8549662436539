use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use thiserror::Error;

use super::{
    BaseHttpClientConfig, MessageTemplates, MetricsConfig, SnapshotConfig, SubstanceLoader,
    SubstanceLoaderError, TelegramConfig, deserialize_duration_from_seconds,
};
use crate::models::SubstanceRegistry;

/// Provides the default value for polling_interval_secs.
fn default_polling_interval() -> Duration {
    Duration::from_secs(300)
}

/// Provides the default value for max_consecutive_failures.
fn default_max_consecutive_failures() -> u32 {
    5
}

/// Provides the default value for shutdown_timeout_secs.
fn default_shutdown_timeout() -> Duration {
    Duration::from_secs(30)
}

/// Provides the default value for substances_file.
fn default_substances_file() -> String {
    "substances.json".to_string()
}

/// Errors that prevent the sentinel from starting. None of them are retried.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    /// The application configuration could not be read.
    #[error("Failed to load application configuration: {0}")]
    App(#[from] ConfigError),

    /// The substance registry could not be loaded.
    #[error("Failed to load substance registry: {0}")]
    Substances(#[from] SubstanceLoaderError),

    /// A message template does not compile.
    #[error("Invalid message template '{name}': {reason}")]
    Template {
        /// Which template failed.
        name: String,
        /// The compiler error.
        reason: String,
    },

    /// A value is out of its accepted range.
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Application configuration for the pollution sentinel.
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    /// Time between two evaluation cycles.
    #[serde(
        rename = "polling_interval_secs",
        default = "default_polling_interval",
        deserialize_with = "deserialize_duration_from_seconds"
    )]
    pub polling_interval: Duration,

    /// Number of failed cycles in a row after which the process terminates.
    #[serde(default = "default_max_consecutive_failures")]
    pub max_consecutive_failures: u32,

    /// The maximum time to wait for the shutdown notice to go out.
    #[serde(
        rename = "shutdown_timeout_secs",
        default = "default_shutdown_timeout",
        deserialize_with = "deserialize_duration_from_seconds"
    )]
    pub shutdown_timeout: Duration,

    /// Substance file name, relative to the configuration directory.
    #[serde(default = "default_substances_file")]
    pub substances_file: String,

    /// Resolved path of the substance file.
    #[serde(skip_deserializing)]
    pub substances_path: PathBuf,

    /// Metrics backend.
    pub metrics: MetricsConfig,

    /// Dashboard renderer. Notifications are text-only without it.
    #[serde(default)]
    pub snapshot: Option<SnapshotConfig>,

    /// Telegram delivery.
    pub telegram: TelegramConfig,

    /// Notification text templates.
    #[serde(default)]
    pub messages: MessageTemplates,

    /// Configuration for the base HTTP client.
    #[serde(default)]
    pub http_base_config: BaseHttpClientConfig,
}

impl AppConfig {
    /// Creates a new `AppConfig` by reading `app.yaml` from the configuration
    /// directory, with `SENTINEL__*` environment variables taking precedence.
    pub fn new(config_dir: Option<&str>) -> Result<Self, ConfigurationError> {
        let config_dir_str = config_dir.unwrap_or("configs");
        let s = Config::builder()
            .add_source(File::with_name(&format!("{}/app.yaml", config_dir_str)))
            .add_source(Environment::with_prefix("SENTINEL").separator("__"))
            .build()?;
        let mut config: Self = s.try_deserialize()?;

        config.substances_path = Path::new(config_dir_str).join(&config.substances_file);
        config.validate()?;

        Ok(config)
    }

    /// Loads the substance registry this configuration points to.
    pub fn load_substances(&self) -> Result<SubstanceRegistry, ConfigurationError> {
        Ok(SubstanceLoader::new(self.substances_path.clone()).load()?)
    }

    fn validate(&self) -> Result<(), ConfigurationError> {
        if self.polling_interval.is_zero() {
            return Err(ConfigurationError::Invalid(
                "polling_interval_secs must be greater than 0".to_string(),
            ));
        }
        if self.max_consecutive_failures == 0 {
            return Err(ConfigurationError::Invalid(
                "max_consecutive_failures must be greater than 0".to_string(),
            ));
        }
        if self.telegram.token.trim().is_empty() {
            return Err(ConfigurationError::Invalid("telegram.token cannot be empty".to_string()));
        }
        if self.telegram.chat_id.trim().is_empty() {
            return Err(ConfigurationError::Invalid(
                "telegram.chat_id cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}
