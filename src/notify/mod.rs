//! Notification channels
//!
//! Every channel implements [`Notifier`]: `send(recipients, subject, body)`.
//! The orchestrator only sees that interface, so SMTP, Brevo's HTTP API and
//! the log-only channel are interchangeable.

mod brevo;
mod email;
mod format;
mod logger;
mod types;

pub use brevo::{BrevoNotifier, BREVO_BASE_URL};
pub use email::SmtpNotifier;
pub use format::{
    new_listings_message, no_changes_message, unsubscribe_link, with_unsubscribe_footer, Message,
};
pub use logger::LogNotifier;
pub use types::{DeliveryError, DeliveryMode, Notifier};

#[cfg(test)]
mod tests;
