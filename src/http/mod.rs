//! HTTP client module
//!
//! Provides an HTTP client with retries and backoff.
//!
//! # Features
//!
//! - **Automatic Retries**: 429, 5xx, timeouts and connection errors
//! - **Exponential Backoff**: Doubling delays up to a ceiling
//! - **Retry-After**: Honoured on 429 responses, within the same ceiling

mod client;

pub use client::{
    HttpClient, HttpClientConfig, HttpClientConfigBuilder, RequestConfig, BROWSER_USER_AGENT,
};
