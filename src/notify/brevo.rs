//! Brevo transactional email notifier.
//!
//! Sends through `POST /v3/smtp/email` with the account's `api-key` header.

use super::types::{DeliveryError, Notifier};
use crate::http::{HttpClient, HttpClientConfig, RequestConfig};
use async_trait::async_trait;
use serde_json::json;

/// Default Brevo API root
pub const BREVO_BASE_URL: &str = "https://api.brevo.com";

/// Sends notifications through Brevo's HTTP API.
#[derive(Debug)]
pub struct BrevoNotifier {
    client: HttpClient,
    api_key: String,
    sender_email: String,
    sender_name: Option<String>,
}

impl BrevoNotifier {
    /// Create a notifier against the public Brevo API
    pub fn new(
        api_key: impl Into<String>,
        sender_email: impl Into<String>,
        sender_name: Option<String>,
    ) -> Result<Self, DeliveryError> {
        Self::with_base_url(BREVO_BASE_URL, api_key, sender_email, sender_name)
    }

    /// Create a notifier against a specific API root
    pub fn with_base_url(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        sender_email: impl Into<String>,
        sender_name: Option<String>,
    ) -> Result<Self, DeliveryError> {
        let config = HttpClientConfig::builder()
            .base_url(base_url)
            .header("Accept", "application/json")
            .max_retries(0)
            .build();
        let client =
            HttpClient::with_config(config).map_err(|e| DeliveryError::Config(e.to_string()))?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            sender_email: sender_email.into(),
            sender_name,
        })
    }

    fn payload(&self, recipients: &[String], subject: &str, body: &str) -> serde_json::Value {
        let mut sender = json!({ "email": self.sender_email });
        if let Some(name) = &self.sender_name {
            sender["name"] = json!(name);
        }

        let to: Vec<_> = recipients.iter().map(|r| json!({ "email": r })).collect();

        json!({
            "sender": sender,
            "to": to,
            "subject": subject,
            "textContent": body,
        })
    }
}

#[async_trait]
impl Notifier for BrevoNotifier {
    async fn send(
        &self,
        recipients: &[String],
        subject: &str,
        body: &str,
    ) -> Result<(), DeliveryError> {
        let request = RequestConfig::new()
            .header("api-key", self.api_key.as_str())
            .json(self.payload(recipients, subject, body));

        self.client
            .post_with_config("/v3/smtp/email", request)
            .await
            .map_err(|e| DeliveryError::Api(e.to_string()))?;

        tracing::info!(
            channel = "brevo",
            subject = %subject,
            recipients = recipients.len(),
            "notification delivered"
        );

        Ok(())
    }

    fn channel_name(&self) -> &str {
        "brevo"
    }
}
