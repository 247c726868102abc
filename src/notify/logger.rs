//! Log-only notifier for dry runs.

use super::types::{DeliveryError, Notifier};
use async_trait::async_trait;

/// Writes notifications to the log instead of delivering them.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(
        &self,
        recipients: &[String],
        subject: &str,
        body: &str,
    ) -> Result<(), DeliveryError> {
        tracing::info!(
            channel = "log",
            subject = %subject,
            recipients = recipients.len(),
            "notification (not delivered)\n{body}"
        );
        Ok(())
    }

    fn channel_name(&self) -> &str {
        "log"
    }
}
