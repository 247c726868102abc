//! Notifier trait definition and shared error types.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Errors that can occur during notification delivery.
#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    #[error("SMTP delivery failed: {0}")]
    Smtp(String),

    #[error("Email API request failed: {0}")]
    Api(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// How a message reaches a subscriber set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryMode {
    /// One send with every recipient on it
    Batch,
    /// One send per recipient, so addresses stay private
    #[default]
    PerRecipient,
}

/// A notification channel.
///
/// Delivery is all-or-nothing per call from the caller's point of view:
/// the orchestrator logs a failure and moves on.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver one message to the given recipients.
    async fn send(
        &self,
        recipients: &[String],
        subject: &str,
        body: &str,
    ) -> Result<(), DeliveryError>;

    /// Human-readable name for this channel (e.g. "smtp", "brevo").
    fn channel_name(&self) -> &str;
}
