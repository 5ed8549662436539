//! The engine holds the alert state machine and drives one evaluation cycle
//! against a reading source.

pub mod alert_engine;
pub mod monitor;

pub use alert_engine::{AlertEngine, decide, is_significant_change};
pub use monitor::PollutionMonitor;
