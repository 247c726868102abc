//! Subscriber registry interface

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Persisted shape of the subscriber collection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriberMode {
    /// Plain list of addresses
    #[default]
    List,
    /// Address mapped to a secret unsubscribe token
    Tokens,
}

/// One recipient
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscriber {
    pub address: String,
    /// Unsubscribe token, when the registry issues them
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl Subscriber {
    /// Subscriber without a token
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            token: None,
        }
    }
}

/// Result of a subscribe call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscribeOutcome {
    /// Normalized address
    pub address: String,
    /// False when the address was already subscribed
    pub added: bool,
    /// Token issued to a newly added subscriber
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

/// The set of notification recipients.
///
/// `add` and `remove` are idempotent: adding a present address or removing
/// an absent one succeeds without change.
#[async_trait]
pub trait SubscriberRegistry: Send + Sync {
    /// Current recipients
    async fn list(&self) -> Result<Vec<Subscriber>>;

    /// Subscribe an address after validating it
    async fn add(&self, address: &str) -> Result<SubscribeOutcome>;

    /// Unsubscribe an address; returns whether it was present.
    ///
    /// Registries that issue tokens reject a missing or wrong token.
    async fn remove(&self, address: &str, token: Option<&str>) -> Result<bool>;

    /// Whether subscribers carry unsubscribe tokens
    fn issues_tokens(&self) -> bool;
}
