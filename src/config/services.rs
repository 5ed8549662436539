//! Endpoints of the services the sentinel talks to.

use serde::Deserialize;
use url::Url;

use super::HttpRetryConfig;

fn default_query_template() -> String {
    r#"pollutions{id="{{ id }}", data_source="pogoda_sv_rounded"}"#.to_string()
}

fn default_telegram_api_url() -> Url {
    // Static, always parses.
    Url::parse("https://api.telegram.org").expect("valid default Telegram API URL")
}

/// The Prometheus-compatible backend readings are queried from.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct MetricsConfig {
    /// Base URL of the backend, e.g. `http://prometheus:9090`.
    pub url: Url,

    /// Instant query for one substance. `{{ id }}` is the substance id.
    #[serde(default = "default_query_template")]
    pub query_template: String,

    #[serde(default)]
    pub retry_policy: HttpRetryConfig,
}

/// The dashboard renderer snapshots are taken from.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct SnapshotConfig {
    /// URL that returns the rendered dashboard as an image, e.g. a Grafana
    /// `/render/d-solo/...` link.
    pub url: Url,

    /// Optional bearer token for the renderer.
    #[serde(default)]
    pub auth_token: Option<String>,

    #[serde(default)]
    pub retry_policy: HttpRetryConfig,
}

/// Telegram bot used for both alert and operations messages.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct TelegramConfig {
    /// The bot token.
    pub token: String,

    /// Chat that receives pollution notifications.
    pub chat_id: String,

    /// Chat that receives failures and lifecycle notices. Defaults to
    /// `chat_id`.
    #[serde(default)]
    pub operations_chat_id: Option<String>,

    /// Bot API base URL.
    #[serde(default = "default_telegram_api_url")]
    pub api_url: Url,

    #[serde(default)]
    pub disable_web_preview: bool,

    #[serde(default)]
    pub retry_policy: HttpRetryConfig,
}

impl TelegramConfig {
    /// The chat operational messages go to.
    pub fn operations_chat(&self) -> &str {
        self.operations_chat_id.as_deref().unwrap_or(&self.chat_id)
    }
}
