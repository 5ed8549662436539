//! Cycle-level alert state and the decisions derived from it.

use std::fmt;

use serde::Serialize;

use super::substance::SubstanceId;

/// The last notification type that was successfully delivered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertState {
    /// Nothing has been delivered yet.
    #[default]
    Idle,
    /// An "exceeded" notification was delivered.
    Appeared,
    /// A follow-up notification was delivered.
    Continues,
    /// An all-clear notification was delivered.
    Cleared,
}

impl AlertState {
    /// Whether the last delivered notification left the area polluted.
    pub fn is_polluted(&self) -> bool {
        matches!(self, AlertState::Appeared | AlertState::Continues)
    }
}

impl From<NotificationKind> for AlertState {
    fn from(kind: NotificationKind) -> Self {
        match kind {
            NotificationKind::Appeared => AlertState::Appeared,
            NotificationKind::Continues => AlertState::Continues,
            NotificationKind::Cleared => AlertState::Cleared,
        }
    }
}

/// The kind of notification a cycle decided to send.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// At least one substance crossed the limit.
    Appeared,
    /// Pollution persists and some substance changed significantly.
    Continues,
    /// No substance is over the limit any more.
    Cleared,
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NotificationKind::Appeared => "appeared",
            NotificationKind::Continues => "continues",
            NotificationKind::Cleared => "cleared",
        };
        f.write_str(name)
    }
}

/// The outcome of one evaluation cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "substances", rename_all = "snake_case")]
pub enum Decision {
    /// Nothing to send this cycle.
    Suppress,
    /// Substances that crossed the limit.
    Appeared(Vec<SubstanceId>),
    /// Substances that are over the limit and changed significantly.
    Continues(Vec<SubstanceId>),
    /// Everything is back under the limit.
    Cleared,
}

impl Decision {
    /// The notification kind, or `None` for a suppressed cycle.
    pub fn kind(&self) -> Option<NotificationKind> {
        match self {
            Decision::Suppress => None,
            Decision::Appeared(_) => Some(NotificationKind::Appeared),
            Decision::Continues(_) => Some(NotificationKind::Continues),
            Decision::Cleared => Some(NotificationKind::Cleared),
        }
    }

    /// The substances named by the decision. Empty for suppressed and
    /// cleared cycles.
    pub fn substance_ids(&self) -> &[SubstanceId] {
        match self {
            Decision::Appeared(ids) | Decision::Continues(ids) => ids,
            Decision::Suppress | Decision::Cleared => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decision_kind() {
        assert_eq!(Decision::Suppress.kind(), None);
        assert_eq!(Decision::Appeared(vec![1]).kind(), Some(NotificationKind::Appeared));
        assert_eq!(Decision::Continues(vec![1]).kind(), Some(NotificationKind::Continues));
        assert_eq!(Decision::Cleared.kind(), Some(NotificationKind::Cleared));
    }

    #[test]
    fn test_decision_serializes_with_tag() {
        let value = serde_json::to_value(Decision::Appeared(vec![1, 2])).unwrap();
        assert_eq!(value, serde_json::json!({ "type": "appeared", "substances": [1, 2] }));
    }

    #[test]
    fn test_state_from_kind() {
        assert_eq!(AlertState::from(NotificationKind::Cleared), AlertState::Cleared);
        assert!(AlertState::from(NotificationKind::Continues).is_polluted());
        assert!(!AlertState::default().is_polluted());
    }
}
