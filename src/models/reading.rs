//! A single sample returned by a reading source.

use serde::{Deserialize, Serialize};

/// The outcome of fetching the current concentration of one substance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Reading {
    /// Concentration as a whole percentage of the regulatory limit.
    Percent(i64),
    /// The source has no sample for this substance right now.
    NoData,
}

impl Reading {
    /// Builds a reading from a raw percentage, rounding to the nearest
    /// integer. Non-finite values are rejected.
    pub fn from_raw(value: f64) -> Option<Self> {
        if value.is_finite() {
            Some(Reading::Percent(value.round() as i64))
        } else {
            None
        }
    }

    /// The value stored on the substance. Missing data counts as 0%.
    pub fn percent(&self) -> i64 {
        match self {
            Reading::Percent(pct) => *pct,
            Reading::NoData => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_raw_rounds_to_nearest() {
        assert_eq!(Reading::from_raw(99.5), Some(Reading::Percent(100)));
        assert_eq!(Reading::from_raw(99.49), Some(Reading::Percent(99)));
        assert_eq!(Reading::from_raw(0.0), Some(Reading::Percent(0)));
    }

    #[test]
    fn test_from_raw_rejects_non_finite() {
        assert_eq!(Reading::from_raw(f64::NAN), None);
        assert_eq!(Reading::from_raw(f64::INFINITY), None);
    }

    #[test]
    fn test_no_data_counts_as_zero() {
        assert_eq!(Reading::NoData.percent(), 0);
        assert_eq!(Reading::Percent(130).percent(), 130);
    }
}
