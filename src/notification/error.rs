//! Error types for notification composition and delivery.

use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

use crate::{
    http_client::HttpClientPoolError, models::SubstanceId, template::TemplateServiceError,
};

/// Bot API URLs carry the token in the path: `/bot<token>/<method>`.
static BOT_TOKEN_PATH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/bot[^/\s)]+").expect("valid bot token pattern"));

/// Replaces the bot token in any Bot API URL inside `text`.
pub fn redact_bot_token(text: &str) -> String {
    BOT_TOKEN_PATH.replace_all(text, "/bot<redacted>").into_owned()
}

/// Errors raised while delivering a notification.
#[derive(Debug, Error)]
pub enum NotificationError {
    /// The destination rejected the message.
    #[error("Notification failed: {0}")]
    NotifyFailed(String),

    /// An error originating from the HTTP client pool.
    #[error("HTTP client error: {0}")]
    HttpClientError(#[from] HttpClientPoolError),

    /// An error from the retrying JSON client. The request URL is stripped.
    #[error("Request error: {0}")]
    RequestError(reqwest_middleware::Error),

    /// An error from the plain upload client. The request URL is stripped.
    #[error("Upload error: {0}")]
    UploadError(reqwest::Error),
}

impl From<reqwest_middleware::Error> for NotificationError {
    fn from(error: reqwest_middleware::Error) -> Self {
        match error {
            reqwest_middleware::Error::Reqwest(e) => {
                Self::RequestError(reqwest_middleware::Error::Reqwest(e.without_url()))
            }
            other => Self::NotifyFailed(redact_bot_token(&other.to_string())),
        }
    }
}

impl From<reqwest::Error> for NotificationError {
    fn from(error: reqwest::Error) -> Self {
        Self::UploadError(error.without_url())
    }
}

/// Errors raised while composing a notification.
#[derive(Debug, Error)]
pub enum ComposeError {
    /// A template failed to render.
    #[error("Template rendering error: {0}")]
    Template(#[from] TemplateServiceError),

    /// The decision names a substance the registry does not know.
    #[error("Unknown substance id in decision: {0}")]
    UnknownSubstance(SubstanceId),
}
