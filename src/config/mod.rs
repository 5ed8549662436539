//! Configuration module for the pollution sentinel.

mod app_config;
mod helpers;
mod http_base;
mod http_retry;
mod messages;
mod services;
mod substances;

pub use app_config::{AppConfig, ConfigurationError};
pub use helpers::{
    deserialize_duration_from_ms, deserialize_duration_from_seconds, serialize_duration_to_ms,
    serialize_duration_to_seconds,
};
pub use http_base::BaseHttpClientConfig;
pub use http_retry::{HttpRetryConfig, JitterSetting};
pub use messages::MessageTemplates;
pub use services::{MetricsConfig, SnapshotConfig, TelegramConfig};
pub use substances::{SubstanceLoader, SubstanceLoaderError};
