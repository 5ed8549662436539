//! Alert state machine
//!
//! Turns the per-cycle substance values into a notification decision. The
//! transition rules are a pure function of the previous [`AlertState`] and the
//! current substances, so the hysteresis can be exercised without any I/O.
//! Per-substance bookkeeping is committed through [`AlertEngine::commit`] only
//! after the notification has been delivered.

use crate::models::{
    AlertState, Decision, NotificationKind, Reading, Substance, SubstanceId, SubstanceRegistry,
};

/// A substance that has improved by more than this many percentage points
/// since its last report is worth a follow-up even while still over the limit.
pub const SIGNIFICANT_IMPROVEMENT_PP: i64 = 50;

/// Whether a substance qualifies for a follow-up notification: it is over the
/// limit and either got worse at all or improved by more than
/// [`SIGNIFICANT_IMPROVEMENT_PP`].
pub fn is_significant_change(substance: &Substance) -> bool {
    let delta = substance.delta_since_report();
    substance.is_over_limit() && (delta > 0 || delta < -SIGNIFICANT_IMPROVEMENT_PP)
}

/// Computes the decision for this cycle from the last delivered state.
pub fn decide(state: AlertState, substances: &[Substance]) -> Decision {
    match state {
        AlertState::Idle | AlertState::Cleared => {
            let over_limit = ids_where(substances, Substance::is_over_limit);
            if over_limit.is_empty() {
                Decision::Suppress
            } else {
                Decision::Appeared(over_limit)
            }
        }
        AlertState::Appeared | AlertState::Continues => {
            let changed = ids_where(substances, is_significant_change);
            if !changed.is_empty() {
                Decision::Continues(changed)
            } else if !substances.iter().any(Substance::is_over_limit) {
                Decision::Cleared
            } else {
                Decision::Suppress
            }
        }
    }
}

fn ids_where(substances: &[Substance], predicate: impl Fn(&Substance) -> bool) -> Vec<SubstanceId> {
    substances.iter().filter(|&s| predicate(s)).map(|s| s.id).collect()
}

/// Owns the substance registry and the cycle-level alert state.
#[derive(Debug, Clone)]
pub struct AlertEngine {
    registry: SubstanceRegistry,
    state: AlertState,
}

impl AlertEngine {
    /// Creates an engine in the [`AlertState::Idle`] state.
    pub fn new(registry: SubstanceRegistry) -> Self {
        Self { registry, state: AlertState::Idle }
    }

    /// The last successfully delivered notification type.
    pub fn state(&self) -> AlertState {
        self.state
    }

    /// The substance registry with its current values.
    pub fn registry(&self) -> &SubstanceRegistry {
        &self.registry
    }

    /// Replaces the current value of every substance present in `readings`.
    ///
    /// Readings for ids outside the registry are ignored.
    pub fn apply_readings(&mut self, readings: &[(SubstanceId, Reading)]) {
        for (id, reading) in readings {
            match self.registry.get_mut(*id) {
                Some(substance) => substance.current_pct = reading.percent(),
                None => tracing::warn!(substance_id = id, "Reading for unknown substance ignored."),
            }
        }
    }

    /// Decides what to send for the current values.
    pub fn decide(&self) -> Decision {
        decide(self.state, self.registry.substances())
    }

    /// Records that `decision` was delivered.
    ///
    /// Must only be called after a successful dispatch. A suppressed decision
    /// is a no-op.
    pub fn commit(&mut self, decision: &Decision) {
        let Some(kind) = decision.kind() else {
            return;
        };

        match kind {
            NotificationKind::Appeared | NotificationKind::Continues => {
                for id in decision.substance_ids() {
                    if let Some(substance) = self.registry.get_mut(*id) {
                        substance.last_reported_pct = substance.current_pct;
                        substance.max_pct_since_clear =
                            substance.max_pct_since_clear.max(substance.current_pct);
                    }
                }
            }
            NotificationKind::Cleared => {
                for substance in self.registry.substances_mut() {
                    substance.max_pct_since_clear = 0;
                }
            }
        }

        tracing::debug!(previous = ?self.state, next = %kind, "Alert state committed.");
        self.state = kind.into();
    }
}
