//! Engine types
//!
//! Per-source results and configuration for scrape runs.

use crate::notify::DeliveryMode;
use crate::types::Listing;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// Outcome of one source within a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SourceResult {
    /// The detector found listings above the checkpoint; notification was attempted
    NewListings {
        count: usize,
        listings: Vec<Listing>,
    },
    /// Nothing new above the checkpoint (or a baseline was recorded)
    NoChanges { top_listing: Listing },
    /// Fetching or parsing failed; the checkpoint was left alone
    Error { message: String },
}

impl SourceResult {
    /// Create an error result
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    /// Check if this is an error result
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }

    /// New listings found, if any
    pub fn new_listings(&self) -> &[Listing] {
        match self {
            Self::NewListings { listings, .. } => listings,
            _ => &[],
        }
    }
}

/// Result of a run, keyed by source name
pub type RunReport = BTreeMap<String, SourceResult>;

/// Configuration for scrape runs
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Upper bound on a single source fetch
    pub fetch_timeout: Duration,
    /// Send a status message when a source has nothing new
    pub notify_on_no_changes: bool,
    /// One message for everyone, or one per recipient
    pub delivery: DeliveryMode,
    /// Public base URL used to build unsubscribe links
    pub public_url: Option<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            fetch_timeout: Duration::from_secs(30),
            notify_on_no_changes: false,
            delivery: DeliveryMode::PerRecipient,
            public_url: None,
        }
    }
}
