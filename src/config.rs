//! Runtime settings
//!
//! Settings are read once at startup: an optional YAML file, then
//! environment overrides, then validation. Everything downstream receives
//! its values explicitly; nothing reads the environment after this point.

use crate::engine::{EngineConfig, ScrapeEngine};
use crate::error::{Error, Result};
use crate::notify::{BrevoNotifier, DeliveryMode, LogNotifier, Notifier, SmtpNotifier};
use crate::source::{default_sources, SourceConfig, TableFetcher};
use crate::state::{JsonBinStore, State, StateManager};
use crate::subscribers::{StateRegistry, SubscriberMode, SubscriberRegistry};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use url::Url;

// ============================================================================
// Top-Level Settings
// ============================================================================

/// Complete runtime configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Tables to poll
    pub sources: Vec<SourceConfig>,

    /// Upper bound on one source fetch, in seconds
    pub fetch_timeout_secs: u64,

    /// Where the state blob lives
    pub state: StateBackend,

    /// Delivery channel
    pub notifier: NotifierSettings,

    /// Plain list or per-subscriber unsubscribe tokens
    pub subscriber_mode: SubscriberMode,

    /// One message for everyone, or one per recipient
    pub delivery: DeliveryMode,

    /// Send a status message when a source has nothing new
    pub notify_on_no_changes: bool,

    /// Public base URL of the HTTP server, used in unsubscribe links
    pub public_url: Option<String>,

    /// Key required on protected HTTP routes
    #[serde(skip_serializing)]
    pub api_key: Option<String>,

    /// HTTP server port
    pub port: u16,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            sources: default_sources(),
            fetch_timeout_secs: 30,
            state: StateBackend::default(),
            notifier: NotifierSettings::default(),
            subscriber_mode: SubscriberMode::default(),
            delivery: DeliveryMode::default(),
            notify_on_no_changes: false,
            public_url: None,
            api_key: None,
            port: 8080,
        }
    }
}

// ============================================================================
// State Backend
// ============================================================================

/// State storage backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "snake_case")]
pub enum StateBackend {
    /// Local JSON file
    File { path: PathBuf },

    /// Remote JsonBin document
    #[serde(rename = "jsonbin")]
    JsonBin {
        bin_id: String,
        #[serde(skip_serializing)]
        api_key: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        base_url: Option<String>,
    },
}

impl Default for StateBackend {
    fn default() -> Self {
        Self::File {
            path: PathBuf::from("state.json"),
        }
    }
}

// ============================================================================
// Notifier
// ============================================================================

/// Notification channel settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "channel", rename_all = "snake_case")]
pub enum NotifierSettings {
    /// Log messages instead of sending them
    #[default]
    Log,

    /// SMTP relay
    Smtp {
        host: String,
        #[serde(default)]
        port: Option<u16>,
        #[serde(default = "default_true")]
        starttls: bool,
        from: String,
        #[serde(default)]
        username: Option<String>,
        #[serde(default, skip_serializing)]
        password: Option<String>,
    },

    /// Brevo transactional email API
    Brevo {
        #[serde(skip_serializing)]
        api_key: String,
        from: String,
        #[serde(default)]
        sender_name: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        base_url: Option<String>,
    },
}

fn default_true() -> bool {
    true
}

impl NotifierSettings {
    fn set_from(&mut self, address: String) {
        match self {
            Self::Smtp { from, .. } | Self::Brevo { from, .. } => *from = address,
            Self::Log => {}
        }
    }

    fn from_address(&self) -> Option<&str> {
        match self {
            Self::Smtp { from, .. } | Self::Brevo { from, .. } => Some(from),
            Self::Log => None,
        }
    }
}

// ============================================================================
// Loading
// ============================================================================

impl Settings {
    /// Load settings from an optional YAML file and the process environment
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut settings = match path {
            Some(path) => {
                let content = std::fs::read_to_string(path).map_err(|e| {
                    Error::config(format!("Failed to read {}: {e}", path.display()))
                })?;
                Self::from_yaml(&content)?
            }
            None => Self::default(),
        };

        settings.apply_env(|key| std::env::var(key).ok())?;
        settings.validate()?;
        debug!(sources = settings.sources.len(), "Settings loaded");
        Ok(settings)
    }

    /// Parse settings from YAML; missing fields take their defaults
    pub fn from_yaml(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }

    /// Apply environment overrides.
    ///
    /// `lookup` returns the value of a variable; empty values count as unset.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(key) = var("LISTWATCH_API_KEY") {
            self.api_key = Some(key);
        }
        if let Some(url) = var("LISTWATCH_PUBLIC_URL") {
            self.public_url = Some(url);
        }
        if let Some(port) = var("PORT") {
            self.port = parse_port("PORT", &port)?;
        }

        // State backend
        if let Some(path) = var("LISTWATCH_STATE_PATH") {
            self.state = StateBackend::File {
                path: PathBuf::from(path),
            };
        }
        if let Some(bin_id) = var("LISTWATCH_JSONBIN_BIN_ID") {
            let existing_key = match &self.state {
                StateBackend::JsonBin { api_key, .. } => Some(api_key.clone()),
                StateBackend::File { .. } => None,
            };
            self.state = StateBackend::JsonBin {
                bin_id,
                api_key: var("JSONBIN_API_KEY").or(existing_key).unwrap_or_default(),
                base_url: None,
            };
        } else if let (Some(key), StateBackend::JsonBin { api_key, .. }) =
            (var("JSONBIN_API_KEY"), &mut self.state)
        {
            *api_key = key;
        }

        // Notifier: SMTP first, Brevo wins when both are configured
        let from = var("MAIL_FROM");
        if let Some(host) = var("SMTP_HOST") {
            let port = var("SMTP_PORT")
                .map(|p| parse_port("SMTP_PORT", &p))
                .transpose()?;
            self.notifier = NotifierSettings::Smtp {
                host,
                port,
                starttls: true,
                from: from
                    .clone()
                    .or_else(|| self.notifier.from_address().map(str::to_string))
                    .unwrap_or_default(),
                username: var("SMTP_USERNAME"),
                password: var("SMTP_PASSWORD"),
            };
        }
        if let Some(api_key) = var("BREVO_API_KEY") {
            self.notifier = NotifierSettings::Brevo {
                from: from
                    .clone()
                    .or_else(|| self.notifier.from_address().map(str::to_string))
                    .unwrap_or_default(),
                api_key,
                sender_name: None,
                base_url: None,
            };
        }
        if let Some(from) = from {
            self.notifier.set_from(from);
        }

        Ok(())
    }

    /// Check settings for errors that would only surface mid-run
    pub fn validate(&self) -> Result<()> {
        if self.sources.is_empty() {
            return Err(Error::config("No sources configured"));
        }

        let mut seen = HashSet::new();
        for source in &self.sources {
            if source.name.trim().is_empty() {
                return Err(Error::missing_field("sources[].name"));
            }
            if !seen.insert(source.name.as_str()) {
                return Err(Error::config(format!(
                    "Duplicate source name: {}",
                    source.name
                )));
            }
            Url::parse(&source.url).map_err(|e| {
                Error::config(format!("Invalid URL for source '{}': {e}", source.name))
            })?;
            if source.max_rows == 0 {
                return Err(Error::config(format!(
                    "max_rows must be at least 1 for source '{}'",
                    source.name
                )));
            }
        }

        if self.fetch_timeout_secs == 0 {
            return Err(Error::config("fetch_timeout_secs must be at least 1"));
        }

        if let Some(url) = &self.public_url {
            Url::parse(url).map_err(|e| Error::config(format!("Invalid public_url: {e}")))?;
        }

        match &self.state {
            StateBackend::File { path } if path.as_os_str().is_empty() => {
                return Err(Error::missing_field("state.path"));
            }
            StateBackend::JsonBin { bin_id, .. } if bin_id.is_empty() => {
                return Err(Error::missing_field("state.bin_id"));
            }
            StateBackend::JsonBin { api_key, .. } if api_key.is_empty() => {
                return Err(Error::missing_field("JSONBIN_API_KEY"));
            }
            _ => {}
        }

        match &self.notifier {
            NotifierSettings::Log => {}
            NotifierSettings::Smtp {
                host,
                from,
                username,
                password,
                ..
            } => {
                if host.is_empty() {
                    return Err(Error::missing_field("notifier.host"));
                }
                if from.is_empty() {
                    return Err(Error::missing_field("MAIL_FROM"));
                }
                if username.is_some() != password.is_some() {
                    return Err(Error::config(
                        "SMTP username and password must be set together",
                    ));
                }
            }
            NotifierSettings::Brevo { api_key, from, .. } => {
                if api_key.is_empty() {
                    return Err(Error::missing_field("BREVO_API_KEY"));
                }
                if from.is_empty() {
                    return Err(Error::missing_field("MAIL_FROM"));
                }
            }
        }

        Ok(())
    }
}

fn parse_port(name: &str, value: &str) -> Result<u16> {
    value
        .trim()
        .parse()
        .map_err(|_| Error::config(format!("{name} must be a port number, got '{value}'")))
}

// ============================================================================
// Component Construction
// ============================================================================

impl Settings {
    /// Fetch timeout as a duration
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    /// Orchestrator policies
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            fetch_timeout: self.fetch_timeout(),
            notify_on_no_changes: self.notify_on_no_changes,
            delivery: self.delivery,
            public_url: self.public_url.clone(),
        }
    }

    /// State manager for the configured backend
    pub fn state_manager(&self) -> Result<StateManager> {
        let manager = match &self.state {
            StateBackend::File { path } => StateManager::file(path),
            StateBackend::JsonBin {
                bin_id,
                api_key,
                base_url,
            } => {
                let store = match base_url {
                    Some(base) => JsonBinStore::with_base_url(base, bin_id, api_key)?,
                    None => JsonBinStore::new(bin_id, api_key)?,
                };
                StateManager::new(store)
            }
        };

        let bootstrap = match self.subscriber_mode {
            SubscriberMode::List => State::new(),
            SubscriberMode::Tokens => State::with_token_subscribers(),
        };
        Ok(manager.with_bootstrap(bootstrap))
    }

    /// Notification channel
    pub fn notifier(&self) -> Result<Arc<dyn Notifier>> {
        let notifier: Arc<dyn Notifier> = match &self.notifier {
            NotifierSettings::Log => Arc::new(LogNotifier),
            NotifierSettings::Smtp {
                host,
                port,
                starttls,
                from,
                username,
                password,
            } => {
                let credentials = username.clone().zip(password.clone());
                Arc::new(
                    SmtpNotifier::from_config(host, *port, *starttls, from, credentials)
                        .map_err(|e| Error::config(e.to_string()))?,
                )
            }
            NotifierSettings::Brevo {
                api_key,
                from,
                sender_name,
                base_url,
            } => {
                let notifier = match base_url {
                    Some(base) => {
                        BrevoNotifier::with_base_url(base, api_key, from, sender_name.clone())
                    }
                    None => BrevoNotifier::new(api_key, from, sender_name.clone()),
                };
                Arc::new(notifier.map_err(|e| Error::config(e.to_string()))?)
            }
        };
        Ok(notifier)
    }

    /// Subscriber registry over a state manager
    pub fn registry(&self, state: StateManager) -> Arc<dyn SubscriberRegistry> {
        Arc::new(StateRegistry::new(state, self.subscriber_mode))
    }

    /// Assemble the orchestrator with every configured component
    pub fn build_engine(&self) -> Result<ScrapeEngine> {
        let state = self.state_manager()?;
        let fetcher = Arc::new(TableFetcher::new(self.fetch_timeout())?);
        let engine = ScrapeEngine::new(
            fetcher,
            self.notifier()?,
            self.registry(state.clone()),
            state,
        )
        .with_config(self.engine_config());
        Ok(engine)
    }
}
