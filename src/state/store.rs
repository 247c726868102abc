//! State storage backends
//!
//! A backend only moves the raw blob. Parsing, defaults and locking live in
//! [`StateManager`](super::StateManager).

use crate::error::{Error, Result};
use crate::http::{HttpClient, HttpClientConfig, RequestConfig};
use async_trait::async_trait;
use reqwest::Method;
use std::fmt;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;

/// Durable storage for the whole state blob
#[async_trait]
pub trait StateStore: Send + Sync + fmt::Debug {
    /// Read the blob; `None` when nothing has been stored yet
    async fn read(&self) -> Result<Option<String>>;

    /// Replace the blob
    async fn write(&self, contents: &str) -> Result<()>;

    /// Short description for logs
    fn describe(&self) -> String;
}

// ============================================================================
// File Store
// ============================================================================

/// JSON file on local disk
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    /// Create a file store at the given path
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Path of the state file
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl StateStore for FileStore {
    async fn read(&self) -> Result<Option<String>> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Error::state(format!("Failed to read state file: {e}"))),
        }
    }

    async fn write(&self, contents: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|e| Error::state(format!("Failed to create state dir: {e}")))?;
            }
        }

        // Write to temp file first, then rename for atomicity
        let temp_path = self.path.with_extension("tmp");
        tokio::fs::write(&temp_path, contents)
            .await
            .map_err(|e| Error::state(format!("Failed to write state file: {e}")))?;

        tokio::fs::rename(&temp_path, &self.path)
            .await
            .map_err(|e| Error::state(format!("Failed to rename state file: {e}")))?;

        Ok(())
    }

    fn describe(&self) -> String {
        format!("file:{}", self.path.display())
    }
}

// ============================================================================
// Memory Store
// ============================================================================

/// In-process store for tests and dry runs
#[derive(Debug, Default)]
pub struct MemoryStore {
    contents: RwLock<Option<String>>,
}

impl MemoryStore {
    /// Create an empty memory store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a memory store holding an initial blob
    pub fn with_contents(contents: impl Into<String>) -> Self {
        Self {
            contents: RwLock::new(Some(contents.into())),
        }
    }

    /// Current raw blob
    pub async fn contents(&self) -> Option<String> {
        self.contents.read().await.clone()
    }
}

#[async_trait]
impl StateStore for MemoryStore {
    async fn read(&self) -> Result<Option<String>> {
        Ok(self.contents.read().await.clone())
    }

    async fn write(&self, contents: &str) -> Result<()> {
        *self.contents.write().await = Some(contents.to_string());
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}

// ============================================================================
// JsonBin Store
// ============================================================================

/// Default JsonBin API root
pub const JSONBIN_BASE_URL: &str = "https://api.jsonbin.io/v3";

/// Remote JSON document hosted on jsonbin.io
#[derive(Debug)]
pub struct JsonBinStore {
    client: HttpClient,
    bin_id: String,
    api_key: String,
}

impl JsonBinStore {
    /// Create a store for a bin on the public JsonBin API
    pub fn new(bin_id: impl Into<String>, api_key: impl Into<String>) -> Result<Self> {
        Self::with_base_url(JSONBIN_BASE_URL, bin_id, api_key)
    }

    /// Create a store against a specific API root
    pub fn with_base_url(
        base_url: impl Into<String>,
        bin_id: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Result<Self> {
        let config = HttpClientConfig::builder()
            .base_url(base_url)
            .header("Content-Type", "application/json")
            .build();

        Ok(Self {
            client: HttpClient::with_config(config)?,
            bin_id: bin_id.into(),
            api_key: api_key.into(),
        })
    }

    fn request(&self) -> RequestConfig {
        RequestConfig::new().header("X-Master-Key", self.api_key.as_str())
    }
}

#[async_trait]
impl StateStore for JsonBinStore {
    async fn read(&self) -> Result<Option<String>> {
        let path = format!("/b/{}/latest", self.bin_id);
        let config = self.request().header("X-Bin-Meta", "false");

        match self.client.get_with_config(&path, config).await {
            Ok(response) => {
                let body = response.text().await?;
                Ok(Some(body))
            }
            Err(Error::HttpStatus { status: 404, .. }) => Ok(None),
            Err(e) => Err(Error::state(format!("Failed to read JsonBin state: {e}"))),
        }
    }

    async fn write(&self, contents: &str) -> Result<()> {
        let body: serde_json::Value = serde_json::from_str(contents)?;
        let path = format!("/b/{}", self.bin_id);

        self.client
            .request(Method::PUT, &path, self.request().json(body))
            .await
            .map_err(|e| Error::state(format!("Failed to write JsonBin state: {e}")))?;

        Ok(())
    }

    fn describe(&self) -> String {
        format!("jsonbin:{}", self.bin_id)
    }
}
