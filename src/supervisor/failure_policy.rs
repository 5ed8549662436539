//! Bounded tolerance for consecutive cycle failures.

/// What the supervisor should do after a failed cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureVerdict {
    /// Keep polling; `consecutive` failures have happened in a row so far.
    Retry {
        /// Failures in the current streak, including this one.
        consecutive: u32,
    },
    /// The streak reached the threshold; the process should stop.
    Terminate {
        /// Failures in the streak, equal to the threshold.
        consecutive: u32,
    },
}

/// Counts consecutive failed cycles and decides when to give up.
///
/// Any successful cycle resets the streak.
#[derive(Debug, Clone)]
pub struct FailurePolicy {
    threshold: u32,
    consecutive: u32,
}

impl FailurePolicy {
    /// Creates a policy that terminates on the `threshold`-th consecutive
    /// failure. A threshold of zero is treated as one.
    pub fn new(threshold: u32) -> Self {
        Self { threshold: threshold.max(1), consecutive: 0 }
    }

    /// The configured threshold.
    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    /// Failures in the current streak.
    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive
    }

    /// Ends the current streak.
    pub fn record_success(&mut self) {
        if self.consecutive > 0 {
            tracing::info!(
                previous_failures = self.consecutive,
                "Cycle succeeded, failure streak reset."
            );
        }
        self.consecutive = 0;
    }

    /// Extends the current streak and returns the verdict for it.
    pub fn record_failure(&mut self) -> FailureVerdict {
        self.consecutive = self.consecutive.saturating_add(1);
        if self.consecutive >= self.threshold {
            FailureVerdict::Terminate { consecutive: self.consecutive }
        } else {
            FailureVerdict::Retry { consecutive: self.consecutive }
        }
    }
}
