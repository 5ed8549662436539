//! Captures the pollution dashboard through an HTTP image renderer, such as
//! Grafana's `/render` endpoint.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest_middleware::ClientWithMiddleware;

use super::traits::{SnapshotError, SnapshotProvider};
use crate::config::SnapshotConfig;

/// A [`SnapshotProvider`] that downloads a pre-rendered image.
pub struct HttpSnapshotProvider {
    client: Arc<ClientWithMiddleware>,
    config: SnapshotConfig,
}

impl HttpSnapshotProvider {
    /// Creates a provider for the configured renderer URL.
    pub fn new(config: SnapshotConfig, client: Arc<ClientWithMiddleware>) -> Self {
        Self { client, config }
    }
}

#[async_trait]
impl SnapshotProvider for HttpSnapshotProvider {
    #[tracing::instrument(skip(self), level = "debug")]
    async fn capture(&self) -> Result<Vec<u8>, SnapshotError> {
        let mut request = self.client.get(self.config.url.clone());
        if let Some(token) = &self.config.auth_token {
            request = request.header(AUTHORIZATION, format!("Bearer {token}"));
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SnapshotError::Status(status.as_u16()));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        if !content_type.starts_with("image/") {
            return Err(SnapshotError::NotAnImage(content_type));
        }

        let image = response.bytes().await?.to_vec();
        tracing::debug!(bytes = image.len(), %content_type, "Snapshot captured.");
        Ok(image)
    }
}
