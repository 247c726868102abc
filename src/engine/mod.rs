//! Dispatch engine
//!
//! Runs fetch → detect → notify → checkpoint for every configured source.
//!
//! # Overview
//!
//! - State is loaded once per run and shared by all sources.
//! - Sources run concurrently; a failing source only produces an `error`
//!   entry for itself and keeps its old checkpoint.
//! - A source that fetched successfully always advances its checkpoint to
//!   the fetched top listing, even when notification failed. Failed
//!   deliveries are not retried: re-sending on every run would repeat the
//!   same listings forever while the channel is down.
//! - All checkpoint updates are merged and saved once, after every source
//!   has finished.

mod types;

pub use types::{EngineConfig, RunReport, SourceResult};

use crate::detect::detect;
use crate::error::{Error, Result};
use crate::notify::{
    new_listings_message, no_changes_message, unsubscribe_link, with_unsubscribe_footer,
    DeliveryMode, Message, Notifier,
};
use crate::source::{Fetcher, SourceConfig};
use crate::state::StateManager;
use crate::subscribers::{Subscriber, SubscriberRegistry};
use crate::types::Listing;
use futures::future::join_all;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// What one source contributes to a run
struct SourceOutcome {
    result: SourceResult,
    /// New checkpoint to stage; `None` when the fetch failed
    checkpoint: Option<Listing>,
}

impl SourceOutcome {
    fn failed(message: impl Into<String>) -> Self {
        Self {
            result: SourceResult::error(message),
            checkpoint: None,
        }
    }
}

/// Orchestrates scrape runs over a set of sources
pub struct ScrapeEngine {
    fetcher: Arc<dyn Fetcher>,
    notifier: Arc<dyn Notifier>,
    registry: Arc<dyn SubscriberRegistry>,
    state: StateManager,
    config: EngineConfig,
    /// Held for the duration of a run
    run_lock: Mutex<()>,
}

impl ScrapeEngine {
    /// Create a new engine
    pub fn new(
        fetcher: Arc<dyn Fetcher>,
        notifier: Arc<dyn Notifier>,
        registry: Arc<dyn SubscriberRegistry>,
        state: StateManager,
    ) -> Self {
        Self {
            fetcher,
            notifier,
            registry,
            state,
            config: EngineConfig::default(),
            run_lock: Mutex::new(()),
        }
    }

    /// Set engine configuration
    #[must_use]
    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Get the engine configuration
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Get the state manager
    pub fn state(&self) -> &StateManager {
        &self.state
    }

    /// Get the subscriber registry
    pub fn registry(&self) -> &Arc<dyn SubscriberRegistry> {
        &self.registry
    }

    /// Current checkpoint per source
    pub async fn checkpoints(&self) -> Result<BTreeMap<String, Listing>> {
        Ok(self.state.load().await?.checkpoints)
    }

    /// Run every source once and persist the new checkpoints.
    ///
    /// Fails with [`Error::RunInProgress`] if another run is active, and with
    /// a state error if state cannot be loaded or saved. Per-source failures
    /// are reported in the returned map instead.
    pub async fn run(&self, sources: &[SourceConfig]) -> Result<RunReport> {
        let _run = self.run_lock.try_lock().map_err(|_| Error::RunInProgress)?;
        let start = Instant::now();

        let snapshot = self.state.load().await?;
        let recipients = match self.registry.list().await {
            Ok(recipients) => recipients,
            Err(e) => {
                warn!(error = %e, "Could not list subscribers, notifications will be skipped");
                Vec::new()
            }
        };

        let outcomes = join_all(sources.iter().map(|source| {
            self.process_source(source, snapshot.checkpoint(&source.name), &recipients)
        }))
        .await;

        let mut report = RunReport::new();
        let mut staged = BTreeMap::new();
        for (source, outcome) in sources.iter().zip(outcomes) {
            if let Some(top) = outcome.checkpoint {
                staged.insert(source.name.clone(), top);
            }
            report.insert(source.name.clone(), outcome.result);
        }

        // Every source has finished; merge into the current blob so
        // subscriber changes made during the run are kept.
        let advanced = staged.len();
        self.state
            .update(move |state| {
                for (name, top) in staged {
                    state.set_checkpoint(&name, top);
                }
                Ok(())
            })
            .await?;

        info!(
            sources = sources.len(),
            advanced,
            errors = report.values().filter(|r| r.is_error()).count(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Scrape run complete"
        );

        Ok(report)
    }

    async fn process_source(
        &self,
        source: &SourceConfig,
        checkpoint: Option<&Listing>,
        recipients: &[Subscriber],
    ) -> SourceOutcome {
        let fetch = tokio::time::timeout(self.config.fetch_timeout, self.fetcher.fetch(source));

        let fetched = match fetch.await {
            Ok(Ok(listings)) => listings,
            Ok(Err(e)) => {
                warn!(source = %source.name, error = %e, "Fetch failed");
                return SourceOutcome::failed(e.to_string());
            }
            Err(_) => {
                let e = Error::Timeout {
                    timeout_ms: self.config.fetch_timeout.as_millis() as u64,
                };
                warn!(source = %source.name, error = %e, "Fetch timed out");
                return SourceOutcome::failed(e.to_string());
            }
        };

        let Some(top) = fetched.first().cloned() else {
            warn!(source = %source.name, "Table contained no listings");
            return SourceOutcome::failed("No listings found in table");
        };

        let new = detect(&fetched, checkpoint);

        let result = if new.is_empty() {
            if checkpoint.is_none() {
                info!(source = %source.name, top = %top, "Recorded baseline");
            } else {
                debug!(source = %source.name, "No new listings");
            }
            if self.config.notify_on_no_changes {
                let delivered = self
                    .notify(source, &no_changes_message(&source.label, &top), recipients)
                    .await;
                debug!(source = %source.name, delivered, "No-changes notice sent");
            }
            SourceResult::NoChanges {
                top_listing: top.clone(),
            }
        } else {
            if new.len() == fetched.len() {
                warn!(
                    source = %source.name,
                    count = new.len(),
                    "Checkpoint not found in fetched window, treating every listing as new"
                );
            }
            let delivered = self
                .notify(source, &new_listings_message(&source.label, &new), recipients)
                .await;
            info!(
                source = %source.name,
                count = new.len(),
                delivered,
                recipients = recipients.len(),
                "New listings found"
            );
            SourceResult::NewListings {
                count: new.len(),
                listings: new,
            }
        };

        SourceOutcome {
            result,
            checkpoint: Some(top),
        }
    }

    /// Deliver a message; failures are logged and swallowed.
    ///
    /// Returns how many recipients the message reached.
    async fn notify(
        &self,
        source: &SourceConfig,
        message: &Message,
        recipients: &[Subscriber],
    ) -> usize {
        if recipients.is_empty() {
            debug!(source = %source.name, "No subscribers, skipping notification");
            return 0;
        }

        let channel = self.notifier.channel_name();

        match self.config.delivery {
            DeliveryMode::Batch => {
                let addresses: Vec<String> =
                    recipients.iter().map(|r| r.address.clone()).collect();
                match self
                    .notifier
                    .send(&addresses, &message.subject, &message.body)
                    .await
                {
                    Ok(()) => addresses.len(),
                    Err(e) => {
                        warn!(source = %source.name, channel, error = %e, "Notification failed");
                        0
                    }
                }
            }
            DeliveryMode::PerRecipient => {
                let mut delivered = 0;
                for recipient in recipients {
                    let body = self.personalize(&message.body, recipient);
                    let to = [recipient.address.clone()];
                    match self.notifier.send(&to, &message.subject, &body).await {
                        Ok(()) => delivered += 1,
                        Err(e) => {
                            warn!(source = %source.name, channel, error = %e, "Notification failed");
                        }
                    }
                }
                delivered
            }
        }
    }

    /// Add the recipient's unsubscribe link when one can be built
    fn personalize(&self, body: &str, recipient: &Subscriber) -> String {
        let link = self
            .config
            .public_url
            .as_deref()
            .zip(recipient.token.as_deref())
            .and_then(|(url, token)| unsubscribe_link(url, &recipient.address, token));

        match link {
            Some(link) => with_unsubscribe_footer(body, &link),
            None => body.to_string(),
        }
    }
}

impl std::fmt::Debug for ScrapeEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScrapeEngine")
            .field("config", &self.config)
            .field("state", &self.state.describe())
            .field("channel", &self.notifier.channel_name())
            .finish_non_exhaustive()
    }
}
