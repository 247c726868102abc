//! Subscriber registry kept in the state blob

use super::types::{SubscribeOutcome, Subscriber, SubscriberMode, SubscriberRegistry};
use super::validate::normalize_address;
use crate::error::{Error, Result};
use crate::state::{StateManager, Subscribers};
use async_trait::async_trait;
use std::collections::BTreeMap;
use tracing::{info, warn};

/// Registry stored alongside checkpoints in the state blob.
///
/// Mutations run through [`StateManager::update`], so they serialize with
/// scrape runs instead of racing them.
#[derive(Debug, Clone)]
pub struct StateRegistry {
    state: StateManager,
    mode: SubscriberMode,
}

impl StateRegistry {
    /// Create a registry over a state manager
    pub fn new(state: StateManager, mode: SubscriberMode) -> Self {
        Self { state, mode }
    }

    /// Persisted shape used by this registry
    pub fn mode(&self) -> SubscriberMode {
        self.mode
    }
}

/// Convert the stored collection to the configured shape
fn ensure_shape(subscribers: &mut Subscribers, mode: SubscriberMode) {
    match (mode, &*subscribers) {
        (SubscriberMode::Tokens, Subscribers::List(list)) => {
            let upgraded: BTreeMap<String, String> = list
                .iter()
                .map(|address| (address.clone(), new_token()))
                .collect();
            *subscribers = Subscribers::Tokens(upgraded);
        }
        (SubscriberMode::List, Subscribers::Tokens(map)) => {
            warn!(count = map.len(), "Dropping unsubscribe tokens for plain list mode");
            *subscribers = Subscribers::List(map.keys().cloned().collect());
        }
        _ => {}
    }
}

fn new_token() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

#[async_trait]
impl SubscriberRegistry for StateRegistry {
    async fn list(&self) -> Result<Vec<Subscriber>> {
        let state = self.state.load().await?;
        let subscribers = &state.subscribers;

        Ok(subscribers
            .addresses()
            .into_iter()
            .map(|address| Subscriber {
                token: subscribers.token(&address).map(str::to_string),
                address,
            })
            .collect())
    }

    async fn add(&self, address: &str) -> Result<SubscribeOutcome> {
        let address = normalize_address(address)?;
        let mode = self.mode;

        let outcome = self
            .state
            .update(move |state| {
                let subscribers = &mut state.subscribers;
                ensure_shape(subscribers, mode);

                if subscribers.contains(&address) {
                    return Ok(SubscribeOutcome {
                        address,
                        added: false,
                        token: None,
                    });
                }

                let token = match subscribers {
                    Subscribers::List(list) => {
                        list.push(address.clone());
                        None
                    }
                    Subscribers::Tokens(map) => {
                        let token = new_token();
                        map.insert(address.clone(), token.clone());
                        Some(token)
                    }
                };

                Ok(SubscribeOutcome {
                    address,
                    added: true,
                    token,
                })
            })
            .await?;

        if outcome.added {
            info!(address = %outcome.address, "Subscribed");
        }
        Ok(outcome)
    }

    async fn remove(&self, address: &str, token: Option<&str>) -> Result<bool> {
        let address = normalize_address(address)?;
        let token = token.map(str::to_string);
        let mode = self.mode;

        let removed = self
            .state
            .update(move |state| {
                let subscribers = &mut state.subscribers;
                ensure_shape(subscribers, mode);

                if !subscribers.contains(&address) {
                    return Ok(false);
                }

                if let Subscribers::Tokens(map) = subscribers {
                    let expected = map.get(&address).map(String::as_str);
                    if token.is_none() || token.as_deref() != expected {
                        return Err(Error::unauthorized("invalid unsubscribe token"));
                    }
                }

                Ok(subscribers.remove(&address))
            })
            .await?;

        if removed {
            info!("Unsubscribed one address");
        }
        Ok(removed)
    }

    fn issues_tokens(&self) -> bool {
        self.mode == SubscriberMode::Tokens
    }
}
