//! This module provides the `SupervisorBuilder` for constructing a `Supervisor`.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use super::{FailurePolicy, Supervisor, SupervisorError};
use crate::{
    config::AppConfig,
    engine::PollutionMonitor,
    http_client::HttpClientPool,
    models::SubstanceRegistry,
    notification::{Destination, MessageComposer, Notifier, TelegramNotifier},
    providers::{HttpSnapshotProvider, PrometheusReadingSource, ReadingSource, SnapshotProvider},
};

/// A builder for creating a `Supervisor` instance.
///
/// Only the configuration is required. Components that are not supplied are
/// created from it.
#[derive(Default)]
pub struct SupervisorBuilder {
    config: Option<AppConfig>,
    registry: Option<SubstanceRegistry>,
    reading_source: Option<Arc<dyn ReadingSource>>,
    notifier: Option<Arc<dyn Notifier>>,
    snapshot_provider: Option<Arc<dyn SnapshotProvider>>,
}

impl SupervisorBuilder {
    /// Creates a new, empty `SupervisorBuilder`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the application configuration for the `Supervisor`.
    pub fn config(mut self, config: AppConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Sets the substance registry instead of loading it from the
    /// configured file.
    pub fn registry(mut self, registry: SubstanceRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Sets the reading source instead of the configured metrics backend.
    pub fn reading_source(mut self, reading_source: Arc<dyn ReadingSource>) -> Self {
        self.reading_source = Some(reading_source);
        self
    }

    /// Sets the notifier instead of the configured Telegram bot.
    pub fn notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Sets the snapshot provider instead of the configured renderer.
    pub fn snapshot_provider(mut self, snapshot_provider: Arc<dyn SnapshotProvider>) -> Self {
        self.snapshot_provider = Some(snapshot_provider);
        self
    }

    /// Assembles and validates the components to build a `Supervisor`.
    ///
    /// The registry is loaded and every message template compiled here, so
    /// configuration problems surface before the first cycle runs.
    pub async fn build(self) -> Result<Supervisor, SupervisorError> {
        let config = self.config.ok_or(SupervisorError::MissingConfig)?;
        let pool = HttpClientPool::new(config.http_base_config.clone());

        let registry = match self.registry {
            Some(registry) => registry,
            None => {
                tracing::debug!(
                    path = %config.substances_path.display(),
                    "Loading substance registry..."
                );
                config.load_substances()?
            }
        };
        tracing::info!(count = registry.len(), "Substance registry loaded.");

        let composer = MessageComposer::new(config.messages.clone())?;

        let reading_source = match self.reading_source {
            Some(source) => source,
            None => {
                let client = pool.get_or_create(&config.metrics.retry_policy).await?;
                tracing::info!(url = %config.metrics.url, "Metrics source initialized.");
                Arc::new(PrometheusReadingSource::new(&config.metrics, client)?)
            }
        };

        let notifier = match self.notifier {
            Some(notifier) => notifier,
            None => {
                let client = pool.get_or_create(&config.telegram.retry_policy).await?;
                Arc::new(TelegramNotifier::new(&config.telegram, client, pool.plain_client()?))
            }
        };

        let snapshot = match (self.snapshot_provider, &config.snapshot) {
            (Some(provider), _) => Some(provider),
            (None, Some(snapshot_config)) => {
                let client = pool.get_or_create(&snapshot_config.retry_policy).await?;
                tracing::info!(url = %snapshot_config.url, "Snapshot provider initialized.");
                Some(Arc::new(HttpSnapshotProvider::new(snapshot_config.clone(), client))
                    as Arc<dyn SnapshotProvider>)
            }
            (None, None) => {
                tracing::info!("No snapshot renderer configured, notifications are text-only.");
                None
            }
        };

        Ok(Supervisor {
            monitor: PollutionMonitor::new(reading_source, registry),
            composer,
            notifier,
            snapshot,
            failure_policy: FailurePolicy::new(config.max_consecutive_failures),
            operations: Destination::Chat(config.telegram.operations_chat().to_string()),
            polling_interval: config.polling_interval,
            shutdown_timeout: config.shutdown_timeout,
            cancellation_token: CancellationToken::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::{fs, path::Path};

    use tempfile::tempdir;

    use super::*;
    use crate::{
        config::MessageTemplates,
        models::{AlertState, Reading},
        notification::MockNotifier,
        providers::traits::MockReadingSource,
    };

    fn write_config(dir: &Path, extra: &str) {
        fs::write(
            dir.join("app.yaml"),
            format!(
                r#"
metrics:
  url: "http://localhost:9090"
telegram:
  token: "123:abc"
  chat_id: "-1001"
  operations_chat_id: "-2002"
{extra}
"#
            ),
        )
        .unwrap();
        fs::write(dir.join("substances.json"), r#"{ "1": "NO2", "2": "SO2" }"#).unwrap();
    }

    fn load_config(dir: &Path) -> AppConfig {
        AppConfig::new(Some(dir.to_str().unwrap())).unwrap()
    }

    #[tokio::test]
    async fn build_fails_without_config() {
        let result = SupervisorBuilder::new().build().await;
        assert!(matches!(result, Err(SupervisorError::MissingConfig)));
    }

    #[tokio::test]
    async fn build_succeeds_from_config_alone() {
        let dir = tempdir().unwrap();
        write_config(dir.path(), "");

        let supervisor =
            SupervisorBuilder::new().config(load_config(dir.path())).build().await.unwrap();

        assert_eq!(supervisor.monitor().registry().len(), 2);
        assert_eq!(supervisor.operations, Destination::Chat("-2002".to_string()));
        assert!(supervisor.snapshot.is_none());
        assert_eq!(supervisor.failure_policy.threshold(), 5);
        assert_eq!(supervisor.state(), AlertState::Idle);
    }

    #[tokio::test]
    async fn build_creates_snapshot_provider_when_configured() {
        let dir = tempdir().unwrap();
        write_config(dir.path(), "snapshot:\n  url: \"http://localhost:3000/render/d-solo/pdk\"");

        let supervisor =
            SupervisorBuilder::new().config(load_config(dir.path())).build().await.unwrap();

        assert!(supervisor.snapshot.is_some());
    }

    #[tokio::test]
    async fn build_rejects_invalid_template() {
        let dir = tempdir().unwrap();
        write_config(dir.path(), "");
        let mut config = load_config(dir.path());
        config.messages =
            MessageTemplates { appeared: "{% if %}".to_string(), ..Default::default() };

        let result = SupervisorBuilder::new().config(config).build().await;

        assert!(matches!(result, Err(SupervisorError::Configuration(_))));
    }

    #[tokio::test]
    async fn build_uses_injected_components() {
        let dir = tempdir().unwrap();
        write_config(dir.path(), "");
        let mut source = MockReadingSource::new();
        source.expect_fetch().returning(|_| Ok(Reading::NoData));

        let mut supervisor = SupervisorBuilder::new()
            .config(load_config(dir.path()))
            .registry(SubstanceRegistry::new([(7, "PM10")]).unwrap())
            .reading_source(Arc::new(source))
            .notifier(Arc::new(MockNotifier::new()))
            .build()
            .await
            .unwrap();

        assert_eq!(supervisor.monitor().registry().ids(), vec![7]);
        assert!(supervisor.run_cycle().await.is_ok());
    }
}
