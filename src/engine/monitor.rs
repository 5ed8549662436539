//! Evaluation cycle on top of a [`ReadingSource`].

use std::sync::Arc;

use crate::{
    engine::alert_engine::AlertEngine,
    models::{AlertState, Decision, Reading, SubstanceId, SubstanceRegistry},
    providers::traits::{MetricsSourceError, ReadingSource},
};

/// Fetches fresh readings for every tracked substance and decides what, if
/// anything, should be sent.
pub struct PollutionMonitor {
    /// Where readings come from.
    source: Arc<dyn ReadingSource>,
    /// The registry and cycle-level alert state.
    engine: AlertEngine,
}

impl PollutionMonitor {
    /// Creates a monitor over an already loaded registry.
    pub fn new(source: Arc<dyn ReadingSource>, registry: SubstanceRegistry) -> Self {
        Self { source, engine: AlertEngine::new(registry) }
    }

    /// Runs one evaluation: refreshes every substance, then decides.
    ///
    /// All readings are fetched before any of them is applied, so a failed
    /// fetch leaves the engine exactly as it was.
    pub async fn evaluate_cycle(&mut self) -> Result<Decision, MetricsSourceError> {
        let readings = self.fetch_all().await?;
        self.engine.apply_readings(&readings);

        let decision = self.engine.decide();
        tracing::debug!(state = ?self.engine.state(), decision = ?decision, "Cycle evaluated.");
        Ok(decision)
    }

    /// Records a delivered decision. See [`AlertEngine::commit`].
    pub fn commit(&mut self, decision: &Decision) {
        self.engine.commit(decision);
    }

    /// The registry with the values from the latest cycle.
    pub fn registry(&self) -> &SubstanceRegistry {
        self.engine.registry()
    }

    /// The last successfully delivered notification type.
    pub fn state(&self) -> AlertState {
        self.engine.state()
    }

    async fn fetch_all(&self) -> Result<Vec<(SubstanceId, Reading)>, MetricsSourceError> {
        let ids = self.engine.registry().ids();
        let mut readings = Vec::with_capacity(ids.len());
        for id in ids {
            let reading = self.source.fetch(id).await?;
            if reading == Reading::NoData {
                tracing::debug!(substance_id = id, "No data for substance, treating as 0%.");
            }
            readings.push((id, reading));
        }
        Ok(readings)
    }
}

#[cfg(test)]
mod tests {
    use mockall::predicate::eq;

    use super::*;
    use crate::providers::traits::MockReadingSource;

    fn registry() -> SubstanceRegistry {
        SubstanceRegistry::new([(1, "NO2"), (2, "SO2")]).unwrap()
    }

    #[tokio::test]
    async fn test_evaluate_cycle_applies_readings() {
        let mut source = MockReadingSource::new();
        source.expect_fetch().with(eq(1)).times(1).returning(|_| Ok(Reading::Percent(150)));
        source.expect_fetch().with(eq(2)).times(1).returning(|_| Ok(Reading::NoData));

        let mut monitor = PollutionMonitor::new(Arc::new(source), registry());
        let decision = monitor.evaluate_cycle().await.unwrap();

        assert_eq!(decision, Decision::Appeared(vec![1]));
        assert_eq!(monitor.registry().get(1).unwrap().current_pct, 150);
        assert_eq!(monitor.registry().get(2).unwrap().current_pct, 0);
        assert!(monitor.registry().get(1).unwrap().is_over_limit());
        assert!(!monitor.registry().get(2).unwrap().is_over_limit());
        // Nothing is committed until the caller delivers the notification.
        assert_eq!(monitor.state(), AlertState::Idle);
        assert_eq!(monitor.registry().get(1).unwrap().last_reported_pct, 0);
    }

    #[tokio::test]
    async fn test_failed_fetch_leaves_state_untouched() {
        let mut source = MockReadingSource::new();
        source.expect_fetch().with(eq(1)).times(1).returning(|_| Ok(Reading::Percent(180)));
        source.expect_fetch().with(eq(2)).times(1).returning(|id| {
            Err(MetricsSourceError::MalformedResponse {
                substance_id: id,
                reason: "missing value".to_string(),
            })
        });

        let mut monitor = PollutionMonitor::new(Arc::new(source), registry());
        let before = monitor.registry().clone();

        let result = monitor.evaluate_cycle().await;

        assert!(matches!(result, Err(MetricsSourceError::MalformedResponse { .. })));
        assert_eq!(monitor.registry(), &before);
    }

    #[tokio::test]
    async fn test_commit_after_delivery() {
        let mut source = MockReadingSource::new();
        source.expect_fetch().returning(|id| Ok(Reading::Percent(if id == 1 { 150 } else { 40 })));

        let mut monitor = PollutionMonitor::new(Arc::new(source), registry());
        let decision = monitor.evaluate_cycle().await.unwrap();
        monitor.commit(&decision);

        assert_eq!(monitor.state(), AlertState::Appeared);
        assert_eq!(monitor.registry().get(1).unwrap().last_reported_pct, 150);

        // Same values next cycle: nothing changed, so nothing to send.
        let decision = monitor.evaluate_cycle().await.unwrap();
        assert_eq!(decision, Decision::Suppress);
    }
}
