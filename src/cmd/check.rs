//! One-off evaluation against the live metrics backend.
//!
//! Runs a single cycle from a fresh state and prints what would be sent.
//! Nothing is dispatched and nothing is committed.

use std::sync::Arc;

use clap::Parser;
use serde::Serialize;
use thiserror::Error;

use crate::{
    config::{AppConfig, ConfigurationError},
    engine::PollutionMonitor,
    http_client::{HttpClientPool, HttpClientPoolError},
    models::{Decision, Substance},
    notification::{ComposeError, MessageComposer},
    providers::{MetricsSourceError, PrometheusReadingSource},
};

/// Errors raised by the `check` subcommand.
#[derive(Error, Debug)]
pub enum Error {
    /// The configuration or substance file is invalid.
    #[error("Config error: {0}")]
    Config(#[from] ConfigurationError),
    /// No HTTP client could be created.
    #[error("HTTP client error: {0}")]
    HttpClient(#[from] HttpClientPoolError),
    /// A reading could not be fetched.
    #[error("Metrics source error: {0}")]
    Metrics(#[from] MetricsSourceError),
    /// The message could not be composed.
    #[error("Compose error: {0}")]
    Compose(#[from] ComposeError),
    /// The report could not be serialized.
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Arguments of the `check` subcommand.
#[derive(Parser, Debug)]
pub struct CheckArgs {
    /// Directory containing `app.yaml`. Defaults to `configs`.
    #[arg(short, long, env = "SENTINEL_CONFIG_DIR")]
    pub config_dir: Option<String>,
}

/// What a cycle would have produced.
#[derive(Debug, Serialize)]
pub struct CheckReport {
    /// The decision taken from the `Idle` state.
    pub decision: Decision,
    /// Every substance with its fetched value.
    pub substances: Vec<Substance>,
    /// The message that would be sent, if any.
    pub message: Option<String>,
}

/// Evaluates one cycle on `monitor` and composes its message.
pub async fn evaluate(
    monitor: &mut PollutionMonitor,
    composer: &MessageComposer,
) -> Result<CheckReport, Error> {
    let decision = monitor.evaluate_cycle().await?;
    let blocks = composer.compose(&decision, monitor.registry())?;
    Ok(CheckReport {
        decision,
        substances: monitor.registry().substances().to_vec(),
        message: (!blocks.is_empty()).then(|| blocks.join("\n")),
    })
}

/// Runs the `check` subcommand and prints the report as JSON.
pub async fn execute(args: CheckArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::new(args.config_dir.as_deref())?;
    let registry = config.load_substances()?;
    let composer = MessageComposer::new(config.messages.clone())?;

    let pool = HttpClientPool::new(config.http_base_config.clone());
    let client = pool.get_or_create(&config.metrics.retry_policy).await.map_err(Error::from)?;
    let source = PrometheusReadingSource::new(&config.metrics, client).map_err(Error::from)?;
    let mut monitor = PollutionMonitor::new(Arc::new(source), registry);

    tracing::info!(url = %config.metrics.url, "Evaluating a single cycle...");
    let report = evaluate(&mut monitor, &composer).await?;

    println!("{}", serde_json::to_string_pretty(&report).map_err(Error::from)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::MessageTemplates,
        models::{AlertState, Reading, SubstanceRegistry},
        providers::traits::MockReadingSource,
    };

    fn monitor_with(readings: &'static [(u32, Reading)]) -> PollutionMonitor {
        let mut source = MockReadingSource::new();
        source.expect_fetch().returning(move |id| {
            Ok(readings.iter().find(|(sid, _)| *sid == id).map_or(Reading::NoData, |(_, r)| *r))
        });
        PollutionMonitor::new(
            Arc::new(source),
            SubstanceRegistry::new([(1, "NO2"), (2, "SO2")]).unwrap(),
        )
    }

    #[tokio::test]
    async fn test_evaluate_reports_message_without_committing() {
        let mut monitor = monitor_with(&[(1, Reading::Percent(130)), (2, Reading::Percent(20))]);
        let composer = MessageComposer::new(MessageTemplates::default()).unwrap();

        let report = evaluate(&mut monitor, &composer).await.unwrap();

        assert_eq!(report.decision, Decision::Appeared(vec![1]));
        assert_eq!(report.substances[0].current_pct, 130);
        assert_eq!(
            report.message.as_deref(),
            Some("*Pollution limit exceeded*\nNO2: 130% of limit")
        );
        assert_eq!(monitor.state(), AlertState::Idle);
        assert_eq!(monitor.registry().get(1).unwrap().last_reported_pct, 0);
    }

    #[tokio::test]
    async fn test_evaluate_quiet_cycle_has_no_message() {
        let mut monitor = monitor_with(&[]);
        let composer = MessageComposer::new(MessageTemplates::default()).unwrap();

        let report = evaluate(&mut monitor, &composer).await.unwrap();

        assert_eq!(report.decision, Decision::Suppress);
        assert!(report.message.is_none());
    }
}
