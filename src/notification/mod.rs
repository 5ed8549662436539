//! # Notification
//!
//! Turns decisions into text and delivers it.
//!
//! - **`MessageComposer`**: renders a decision into ordered text blocks.
//! - **`Notifier` trait**: the delivery contract, with plain text and image
//!   plus caption. Every call names a [`Destination`], either the configured
//!   default chat or an explicit override such as the operations chat.
//! - **`TelegramNotifier`**: delivers through the Telegram Bot API.

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;

pub mod composer;
pub mod error;
pub mod payload_builder;
pub mod telegram;

pub use composer::MessageComposer;
pub use error::{ComposeError, NotificationError};
pub use telegram::TelegramNotifier;

/// Where a message is delivered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    /// The chat configured for pollution notifications.
    Default,
    /// An explicit chat id.
    Chat(String),
}

/// Delivers composed content to a destination.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Sends a text message.
    async fn send_text(
        &self,
        destination: &Destination,
        text: &str,
    ) -> Result<(), NotificationError>;

    /// Sends an image with a caption.
    async fn send_photo(
        &self,
        destination: &Destination,
        image: &[u8],
        caption: &str,
    ) -> Result<(), NotificationError>;
}
