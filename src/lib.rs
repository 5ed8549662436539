#![warn(missing_docs)]
//! Pollution sentinel polls air-quality metrics for a fixed set of substances
//! and notifies a Telegram chat when pollution appears, changes
//! significantly, or clears.

pub mod cmd;
pub mod config;
pub mod engine;
pub mod http_client;
pub mod models;
pub mod notification;
pub mod providers;
pub mod supervisor;
pub mod template;
pub mod test_helpers;
