//! State manager implementation
//!
//! Wraps a [`StateStore`] with bootstrap-on-first-load and a single writer
//! lock. Every load, save and read-modify-write goes through the same lock,
//! so overlapping runs and subscriber edits cannot drop each other's writes.

use super::store::{FileStore, MemoryStore, StateStore};
use super::types::State;
use crate::error::{Error, Result};
use chrono::Utc;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// State manager for persisting and loading state
#[derive(Debug, Clone)]
pub struct StateManager {
    /// Backend holding the blob
    store: Arc<dyn StateStore>,
    /// Blob written on first load when the store is empty
    bootstrap: State,
    /// Serializes all access to the store
    writer: Arc<Mutex<()>>,
}

impl StateManager {
    /// Create a state manager over any store
    pub fn new(store: impl StateStore + 'static) -> Self {
        Self::from_store(Arc::new(store))
    }

    /// Create a state manager over a shared store
    pub fn from_store(store: Arc<dyn StateStore>) -> Self {
        Self {
            store,
            bootstrap: State::new(),
            writer: Arc::new(Mutex::new(())),
        }
    }

    /// Create a state manager backed by a JSON file
    pub fn file(path: impl AsRef<Path>) -> Self {
        Self::new(FileStore::new(path))
    }

    /// Create an in-memory state manager (no file persistence)
    pub fn in_memory() -> Self {
        Self::new(MemoryStore::new())
    }

    /// Set the blob persisted when no state exists yet
    #[must_use]
    pub fn with_bootstrap(mut self, bootstrap: State) -> Self {
        self.bootstrap = bootstrap;
        self
    }

    /// Description of the backing store
    pub fn describe(&self) -> String {
        self.store.describe()
    }

    /// Load state, bootstrapping and persisting the default if none exists
    pub async fn load(&self) -> Result<State> {
        let _guard = self.writer.lock().await;
        self.load_locked().await
    }

    /// Overwrite the whole persisted blob
    pub async fn save(&self, state: &State) -> Result<()> {
        let _guard = self.writer.lock().await;
        self.save_locked(state).await
    }

    /// Load, mutate and save under the writer lock.
    ///
    /// Nothing is written when `f` returns an error.
    pub async fn update<T, F>(&self, f: F) -> Result<T>
    where
        T: Send,
        F: FnOnce(&mut State) -> Result<T> + Send,
    {
        let _guard = self.writer.lock().await;
        let mut state = self.load_locked().await?;
        let out = f(&mut state)?;
        self.save_locked(&state).await?;
        Ok(out)
    }

    async fn load_locked(&self) -> Result<State> {
        match self.store.read().await? {
            Some(raw) => {
                debug!(store = %self.store.describe(), "Loaded state");
                Ok(State::parse(&raw))
            }
            None => {
                let state = self.bootstrap.clone();
                self.save_locked(&state).await?;
                info!(store = %self.store.describe(), "Bootstrapped empty state");
                Ok(state)
            }
        }
    }

    async fn save_locked(&self, state: &State) -> Result<()> {
        let mut stamped = state.clone();
        stamped.updated_at = Some(Utc::now());

        let contents = serde_json::to_string_pretty(&stamped)
            .map_err(|e| Error::state(format!("Failed to serialize state: {e}")))?;

        self.store.write(&contents).await
    }
}
