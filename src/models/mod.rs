//! This module contains the data models for the pollution sentinel.

pub mod alert;
pub mod reading;
pub mod substance;

pub use alert::{AlertState, Decision, NotificationKind};
pub use reading::Reading;
pub use substance::{LIMIT_PCT, Substance, SubstanceId, SubstanceRegistry};
