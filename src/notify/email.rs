//! SMTP email notifier via `lettre` with TLS support.

use super::types::{DeliveryError, Notifier};
use async_trait::async_trait;
use lettre::{
    message::Mailbox, transport::smtp::authentication::Credentials, AsyncSmtpTransport,
    AsyncTransport, Message, Tokio1Executor,
};

/// Sends notifications as emails via SMTP.
#[derive(Debug)]
pub struct SmtpNotifier {
    /// Async SMTP transport for sending emails.
    transport: AsyncSmtpTransport<Tokio1Executor>,
    /// Sender mailbox.
    from: Mailbox,
}

impl SmtpNotifier {
    /// Build an `SmtpNotifier` from SMTP settings.
    ///
    /// - `port`: defaults to 587. Port 465 uses implicit TLS.
    /// - `tls`: STARTTLS on other ports; `false` connects in plain text.
    /// - `credentials`: username and password, when the relay requires them.
    pub fn from_config(
        host: &str,
        port: Option<u16>,
        tls: bool,
        from: &str,
        credentials: Option<(String, String)>,
    ) -> Result<Self, DeliveryError> {
        let from: Mailbox = from
            .parse()
            .map_err(|e: lettre::address::AddressError| DeliveryError::Config(e.to_string()))?;

        let port = port.unwrap_or(587);

        let mut builder = if port == 465 {
            AsyncSmtpTransport::<Tokio1Executor>::relay(host)
                .map_err(|e| DeliveryError::Config(e.to_string()))?
                .port(port)
        } else if tls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)
                .map_err(|e| DeliveryError::Config(e.to_string()))?
                .port(port)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host).port(port)
        };

        if let Some((username, password)) = credentials {
            builder = builder.credentials(Credentials::new(username, password));
        }

        Ok(Self {
            transport: builder.build(),
            from,
        })
    }

    /// Build the email for a set of recipients
    fn build_message(
        &self,
        recipients: &[String],
        subject: &str,
        body: &str,
    ) -> Result<Message, DeliveryError> {
        let mut builder = Message::builder().from(self.from.clone());

        for recipient in recipients {
            let mailbox: Mailbox = recipient.parse().map_err(
                |e: lettre::address::AddressError| {
                    DeliveryError::Config(format!("invalid recipient '{recipient}': {e}"))
                },
            )?;
            builder = builder.to(mailbox);
        }

        builder
            .subject(subject)
            .body(body.to_string())
            .map_err(|e| DeliveryError::Smtp(e.to_string()))
    }
}

#[async_trait]
impl Notifier for SmtpNotifier {
    async fn send(
        &self,
        recipients: &[String],
        subject: &str,
        body: &str,
    ) -> Result<(), DeliveryError> {
        let email = self.build_message(recipients, subject, body)?;

        self.transport
            .send(email)
            .await
            .map_err(|e| DeliveryError::Smtp(e.to_string()))?;

        tracing::info!(
            channel = "smtp",
            subject = %subject,
            recipients = recipients.len(),
            "notification delivered"
        );

        Ok(())
    }

    fn channel_name(&self) -> &str {
        "smtp"
    }
}
