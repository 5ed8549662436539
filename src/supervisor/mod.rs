//! The Supervisor module drives the application's polling loop.
//!
//! The `Supervisor` owns every runtime component: the pollution monitor, the
//! message composer, the notifier and the optional snapshot provider.
//!
//! ## Responsibilities
//!
//! - **Cycle driving**: runs one evaluation cycle per polling interval. Ticks
//!   missed while a slow cycle was still running are skipped, not replayed.
//! - **Commit after delivery**: a decision is committed to the alert engine
//!   only once its notification was delivered, so a failed delivery is retried
//!   on the next cycle.
//! - **Failure supervision**: every failed cycle is logged and reported to the
//!   operations chat. The [`FailurePolicy`] decides when a streak of failures
//!   is fatal.
//! - **Graceful shutdown**: it listens for SIGINT and SIGTERM, lets the
//!   in-flight cycle finish, then sends a shutdown notice bounded by the
//!   configured timeout.

mod builder;
mod failure_policy;

use std::{sync::Arc, time::Duration};

pub use builder::SupervisorBuilder;
use chrono::Utc;
pub use failure_policy::{FailurePolicy, FailureVerdict};
use thiserror::Error;
use tokio::{signal, time::MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::{
    config::ConfigurationError,
    engine::PollutionMonitor,
    http_client::HttpClientPoolError,
    models::{AlertState, Decision},
    notification::{ComposeError, Destination, MessageComposer, NotificationError, Notifier},
    providers::{MetricsSourceError, SnapshotProvider},
};

/// Errors that stop the supervisor.
#[derive(Debug, Error)]
pub enum SupervisorError {
    /// A required configuration was not provided to the `SupervisorBuilder`.
    #[error("Missing configuration for Supervisor")]
    MissingConfig,

    /// The configuration or the substance registry is invalid.
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    /// An HTTP client could not be created.
    #[error("HTTP client error: {0}")]
    HttpClient(#[from] HttpClientPoolError),

    /// The metrics source could not be created.
    #[error("Metrics source error: {0}")]
    MetricsSource(#[from] MetricsSourceError),

    /// Too many cycles failed in a row.
    #[error("{failures} consecutive cycles failed, last error: {last_error}")]
    FailureThresholdReached {
        /// Length of the failure streak.
        failures: u32,
        /// The error of the final failed cycle.
        last_error: String,
    },
}

/// Errors that fail a single cycle. Every variant counts toward the
/// consecutive-failure policy.
#[derive(Debug, Error)]
pub enum CycleError {
    /// Readings could not be fetched.
    #[error("Metrics source error: {0}")]
    Metrics(#[from] MetricsSourceError),

    /// The notification could not be composed.
    #[error("Compose error: {0}")]
    Compose(#[from] ComposeError),

    /// The notification could not be delivered.
    #[error("Dispatch error: {0}")]
    Dispatch(#[from] NotificationError),
}

/// The primary runtime manager for the application.
pub struct Supervisor {
    /// Fetches readings and decides what to send.
    monitor: PollutionMonitor,

    /// Renders decisions into text.
    composer: MessageComposer,

    /// Delivers notifications and operational notices.
    notifier: Arc<dyn Notifier>,

    /// Attaches a dashboard image to notifications, when configured.
    snapshot: Option<Arc<dyn SnapshotProvider>>,

    /// Tracks the current failure streak.
    failure_policy: FailurePolicy,

    /// Where failures and lifecycle notices go.
    operations: Destination,

    polling_interval: Duration,
    shutdown_timeout: Duration,

    /// Cancelled on SIGINT/SIGTERM, or by whoever holds a clone.
    cancellation_token: CancellationToken,
}

impl Supervisor {
    /// Returns a new `SupervisorBuilder` instance.
    ///
    /// This is the public entry point for creating a supervisor.
    pub fn builder() -> SupervisorBuilder {
        SupervisorBuilder::new()
    }

    /// A token that stops [`Supervisor::run`] when cancelled.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancellation_token.clone()
    }

    /// The last successfully delivered notification type.
    pub fn state(&self) -> AlertState {
        self.monitor.state()
    }

    /// The pollution monitor, with the values from the latest cycle.
    pub fn monitor(&self) -> &PollutionMonitor {
        &self.monitor
    }

    /// Runs the polling loop until a shutdown signal arrives or too many
    /// cycles fail in a row.
    ///
    /// The first cycle runs immediately. A shutdown signal received while a
    /// cycle is in flight takes effect once that cycle has finished.
    pub async fn run(mut self) -> Result<(), SupervisorError> {
        let signal_listener = tokio::spawn(listen_for_shutdown(self.cancellation_token.clone()));

        self.notify_operations(&format!(
            "Pollution monitoring started, tracking {} substances every {}s.",
            self.monitor.registry().len(),
            self.polling_interval.as_secs()
        ))
        .await;

        let mut interval = tokio::time::interval(self.polling_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let result = loop {
            tokio::select! {
                biased;
                _ = self.cancellation_token.cancelled() => {
                    tracing::info!("Shutdown requested, leaving the polling loop.");
                    break Ok(());
                }
                _ = interval.tick() => {
                    if let Err(e) = self.tick().await {
                        break Err(e);
                    }
                }
            }
        };

        signal_listener.abort();

        if result.is_ok() {
            let notice = self.notify_operations("Pollution monitoring stopped.");
            if tokio::time::timeout(self.shutdown_timeout, notice).await.is_err() {
                tracing::warn!(
                    timeout = ?self.shutdown_timeout,
                    "Shutdown notice was not delivered within the timeout."
                );
            }
        }

        tracing::info!("Supervisor shutdown complete.");
        result
    }

    /// Runs one cycle and applies the failure policy to its outcome.
    ///
    /// Returns an error only when the failure streak reached the threshold,
    /// after the terminating notice has been attempted.
    pub async fn tick(&mut self) -> Result<(), SupervisorError> {
        let error = match self.run_cycle().await {
            Ok(decision) => {
                tracing::debug!(?decision, state = ?self.monitor.state(), "Cycle completed.");
                self.failure_policy.record_success();
                return Ok(());
            }
            Err(e) => e,
        };

        let threshold = self.failure_policy.threshold();
        match self.failure_policy.record_failure() {
            FailureVerdict::Retry { consecutive } => {
                tracing::error!(error = %error, consecutive, threshold, "Cycle failed.");
                self.notify_operations(&format!(
                    "Cycle failed ({consecutive}/{threshold}) at {}: {error}",
                    timestamp()
                ))
                .await;
                Ok(())
            }
            FailureVerdict::Terminate { consecutive } => {
                tracing::error!(
                    error = %error,
                    consecutive,
                    "Consecutive failure threshold reached, terminating."
                );
                self.notify_operations(&format!(
                    "Cycle failed ({consecutive}/{threshold}) at {}: {error}\n\
                     Too many consecutive failures, terminating.",
                    timestamp()
                ))
                .await;
                Err(SupervisorError::FailureThresholdReached {
                    failures: consecutive,
                    last_error: error.to_string(),
                })
            }
        }
    }

    /// Evaluates, composes, delivers and commits one decision.
    ///
    /// Nothing is committed unless delivery succeeded.
    pub async fn run_cycle(&mut self) -> Result<Decision, CycleError> {
        let decision = self.monitor.evaluate_cycle().await?;
        if decision == Decision::Suppress {
            return Ok(decision);
        }

        let blocks = self.composer.compose(&decision, self.monitor.registry())?;
        self.dispatch(&blocks.join("\n")).await?;
        self.monitor.commit(&decision);

        tracing::info!(
            kind = ?decision.kind(),
            substances = ?decision.substance_ids(),
            "Notification delivered."
        );
        Ok(decision)
    }

    async fn dispatch(&self, text: &str) -> Result<(), NotificationError> {
        let Some(snapshot) = &self.snapshot else {
            return self.notifier.send_text(&Destination::Default, text).await;
        };

        match snapshot.capture().await {
            Ok(image) => self.notifier.send_photo(&Destination::Default, &image, text).await,
            Err(e) => {
                tracing::warn!(error = %e, "Snapshot unavailable, sending text only.");
                self.notifier.send_text(&Destination::Default, text).await
            }
        }
    }

    /// Best-effort delivery to the operations chat.
    async fn notify_operations(&self, text: &str) {
        if let Err(e) = self.notifier.send_text(&self.operations, text).await {
            tracing::warn!(error = %e, "Failed to deliver operations notice.");
        }
    }
}

fn timestamp() -> String {
    Utc::now().format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

async fn listen_for_shutdown(cancellation_token: CancellationToken) {
    let ctrl_c = signal::ctrl_c();
    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to register SIGTERM handler.");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("SIGINT (Ctrl+C) received, initiating graceful shutdown."),
        _ = terminate => tracing::info!("SIGTERM received, initiating graceful shutdown."),
    }

    cancellation_token.cancel();
}
