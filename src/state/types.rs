//! State types for checkpoints and subscribers
//!
//! These types are serialized to JSON and persisted between runs as a single
//! blob. Parsing is lenient: missing keys and malformed entries fall back to
//! defaults instead of failing the load.

use crate::types::Listing;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Complete persisted state
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct State {
    /// Last-seen top listing per source
    #[serde(default)]
    pub checkpoints: BTreeMap<String, Listing>,

    /// Notification recipients
    #[serde(default)]
    pub subscribers: Subscribers,

    /// When the blob was last written
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl State {
    /// Create a new empty state
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty state whose subscribers are kept with tokens
    pub fn with_token_subscribers() -> Self {
        Self {
            subscribers: Subscribers::Tokens(BTreeMap::new()),
            ..Self::default()
        }
    }

    /// Get the checkpoint for a source
    pub fn checkpoint(&self, source: &str) -> Option<&Listing> {
        self.checkpoints.get(source)
    }

    /// Record the checkpoint for a source
    pub fn set_checkpoint(&mut self, source: &str, listing: Listing) {
        self.checkpoints.insert(source.to_string(), listing);
    }

    /// Parse a raw persisted blob, defaulting anything unreadable
    pub fn parse(raw: &str) -> Self {
        match serde_json::from_str::<Value>(raw) {
            Ok(value) => Self::from_value(value),
            Err(e) => {
                warn!(error = %e, "State blob is not valid JSON, using defaults");
                Self::default()
            }
        }
    }

    /// Build state from a JSON value, keeping every entry that parses
    pub fn from_value(value: Value) -> Self {
        let Value::Object(mut root) = value else {
            warn!("State blob is not a JSON object, using defaults");
            return Self::default();
        };

        let mut state = Self::default();

        if let Some(Value::Object(entries)) = root.remove("checkpoints") {
            for (source, entry) in entries {
                match serde_json::from_value::<Listing>(entry) {
                    Ok(listing) => {
                        state.checkpoints.insert(source, listing);
                    }
                    Err(e) => warn!(source = %source, error = %e, "Dropping malformed checkpoint"),
                }
            }
        }

        // "emails" is the key older deployments used for the plain list.
        let subscribers = root.remove("subscribers").or_else(|| root.remove("emails"));
        state.subscribers = match subscribers {
            Some(Value::Array(items)) => {
                let mut list: Vec<String> = Vec::with_capacity(items.len());
                for address in items.iter().filter_map(Value::as_str).map(fold_address) {
                    if !list.contains(&address) {
                        list.push(address);
                    }
                }
                Subscribers::List(list)
            }
            Some(Value::Object(entries)) => {
                let mut map = BTreeMap::new();
                for (address, token) in entries {
                    if let Some(token) = token.as_str() {
                        map.entry(fold_address(&address))
                            .or_insert_with(|| token.to_string());
                    }
                }
                Subscribers::Tokens(map)
            }
            Some(Value::Null) | None => Subscribers::default(),
            Some(other) => {
                warn!(value = %other, "Ignoring malformed subscriber collection");
                Subscribers::default()
            }
        };

        state.updated_at = root
            .remove("updated_at")
            .and_then(|v| serde_json::from_value(v).ok());

        // Older blobs kept each source's listing at the top level. An entry
        // under "checkpoints" wins over a top-level one for the same source.
        for (source, entry) in root {
            if !entry.is_object() || state.checkpoints.contains_key(&source) {
                continue;
            }
            match serde_json::from_value::<Listing>(entry) {
                Ok(listing) => {
                    debug!(source = %source, "Migrating top-level checkpoint");
                    state.checkpoints.insert(source, listing);
                }
                Err(_) => debug!(key = %source, "Ignoring unknown state key"),
            }
        }

        state
    }
}

/// Stored addresses compare trimmed and lowercased
fn fold_address(address: &str) -> String {
    address.trim().to_lowercase()
}

/// Subscriber collection in one of its two persisted shapes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Subscribers {
    /// Plain list of addresses
    List(Vec<String>),
    /// Address to unsubscribe token
    Tokens(BTreeMap<String, String>),
}

impl Default for Subscribers {
    fn default() -> Self {
        Self::List(Vec::new())
    }
}

impl Subscribers {
    /// Number of subscribers
    pub fn len(&self) -> usize {
        match self {
            Self::List(list) => list.len(),
            Self::Tokens(map) => map.len(),
        }
    }

    /// Whether there are no subscribers
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All addresses, in stored order
    pub fn addresses(&self) -> Vec<String> {
        match self {
            Self::List(list) => list.clone(),
            Self::Tokens(map) => map.keys().cloned().collect(),
        }
    }

    /// Whether an address is subscribed
    pub fn contains(&self, address: &str) -> bool {
        match self {
            Self::List(list) => list.iter().any(|a| a == address),
            Self::Tokens(map) => map.contains_key(address),
        }
    }

    /// The unsubscribe token for an address, if tokens are kept
    pub fn token(&self, address: &str) -> Option<&str> {
        match self {
            Self::List(_) => None,
            Self::Tokens(map) => map.get(address).map(String::as_str),
        }
    }

    /// Whether this collection keeps tokens
    pub fn has_tokens(&self) -> bool {
        matches!(self, Self::Tokens(_))
    }

    /// Remove an address; returns whether it was present
    pub fn remove(&mut self, address: &str) -> bool {
        match self {
            Self::List(list) => {
                let before = list.len();
                list.retain(|a| a != address);
                list.len() != before
            }
            Self::Tokens(map) => map.remove(address).is_some(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_state_default() {
        let state = State::new();
        assert!(state.checkpoints.is_empty());
        assert!(state.subscribers.is_empty());
        assert!(!state.subscribers.has_tokens());
    }

    #[test]
    fn test_state_checkpoint() {
        let mut state = State::new();
        assert!(state.checkpoint("us_internships").is_none());

        state.set_checkpoint("us_internships", Listing::new("Acme", "Engineer", "NYC"));
        assert_eq!(
            state.checkpoint("us_internships").map(Listing::key),
            Some(("Acme", "Engineer", "NYC"))
        );
    }

    #[test]
    fn test_parse_missing_keys_defaults() {
        let state = State::parse("{}");
        assert!(state.checkpoints.is_empty());
        assert!(state.subscribers.is_empty());
    }

    #[test]
    fn test_parse_invalid_json_defaults() {
        let state = State::parse("{not json");
        assert!(state.checkpoints.is_empty());

        let state = State::parse("[1, 2, 3]");
        assert!(state.checkpoints.is_empty());
    }

    #[test]
    fn test_parse_keeps_valid_checkpoints_only() {
        let state = State::from_value(json!({
            "checkpoints": {
                "good": {"company": "Acme", "role": "Engineer", "location": "NYC"},
                "bad": {"company": 42}
            }
        }));

        assert_eq!(state.checkpoints.len(), 1);
        assert!(state.checkpoint("good").is_some());
        assert!(state.checkpoint("bad").is_none());
    }

    #[test]
    fn test_parse_subscriber_shapes() {
        let state = State::from_value(json!({"subscribers": ["a@example.com", 7]}));
        assert_eq!(
            state.subscribers,
            Subscribers::List(vec!["a@example.com".to_string()])
        );

        let state = State::from_value(json!({"subscribers": {"a@example.com": "tok"}}));
        assert_eq!(state.subscribers.token("a@example.com"), Some("tok"));

        let state = State::from_value(json!({"subscribers": "nonsense"}));
        assert!(state.subscribers.is_empty());
    }

    #[test]
    fn test_parse_legacy_emails_key() {
        let state = State::from_value(json!({"emails": ["old@example.com"]}));
        assert!(state.subscribers.contains("old@example.com"));
    }

    #[test]
    fn test_parse_top_level_checkpoints() {
        let state = State::from_value(json!({
            "canadian_internships": {
                "company": "Acme",
                "role": "SWE Intern",
                "location": "Toronto",
                "apply_link": "https://jobs.example/acme",
                "date_posted": "Oct 18"
            },
            "us_internships": {"company": "Old", "role": "R", "location": "L"},
            "checkpoints": {
                "us_internships": {"company": "New", "role": "R", "location": "L"}
            },
            "misc": {"unrelated": true},
            "emails": ["a@example.com"]
        }));

        assert_eq!(state.checkpoints.len(), 2);
        let ca = state.checkpoint("canadian_internships").unwrap();
        assert_eq!(ca.key(), ("Acme", "SWE Intern", "Toronto"));
        assert_eq!(ca.apply_link, "https://jobs.example/acme");
        assert_eq!(state.checkpoint("us_internships").unwrap().company, "New");
        assert!(state.checkpoint("misc").is_none());
        assert!(state.subscribers.contains("a@example.com"));
    }

    #[test]
    fn test_parse_folds_stored_addresses() {
        let state = State::from_value(json!({
            "emails": [" Old@Example.com", "old@example.com", "b@x.io"]
        }));
        assert_eq!(
            state.subscribers,
            Subscribers::List(vec!["old@example.com".to_string(), "b@x.io".to_string()])
        );

        let state = State::from_value(json!({
            "subscribers": {"Old@Example.com": "tok"}
        }));
        assert_eq!(state.subscribers.token("old@example.com"), Some("tok"));
    }

    #[test]
    fn test_subscribers_remove() {
        let mut list = Subscribers::List(vec!["a@x.io".into(), "b@x.io".into()]);
        assert!(list.remove("a@x.io"));
        assert!(!list.remove("a@x.io"));
        assert_eq!(list.addresses(), vec!["b@x.io".to_string()]);

        let mut tokens = Subscribers::Tokens(BTreeMap::from([("a@x.io".into(), "t".into())]));
        assert!(tokens.remove("a@x.io"));
        assert!(tokens.is_empty());
    }

    #[test]
    fn test_state_serialization() {
        let mut state = State::with_token_subscribers();
        state.set_checkpoint("canadian_internships", Listing::new("A", "B", "C"));

        let json = serde_json::to_string(&state).unwrap();
        let restored = State::parse(&json);

        assert!(restored.subscribers.has_tokens());
        assert!(restored.checkpoint("canadian_internships").is_some());
    }
}
