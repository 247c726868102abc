// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::ref_option)]
#![allow(clippy::unused_self)]
#![allow(clippy::struct_excessive_bools)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::match_wildcard_for_single_variants)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::unused_async)]

//! # listing-watch
//!
//! Watches job-listing tables and emails subscribers when new postings
//! appear above the last-seen listing.
//!
//! ## Features
//!
//! - **Table scraping**: Reads the top rows of HTML listing tables
//! - **Change detection**: Everything above the stored checkpoint is new
//! - **Durable state**: Checkpoints and subscribers in a local file or JsonBin
//! - **Notifications**: SMTP, Brevo, or log-only delivery
//! - **Control surface**: CLI and an HTTP server with an API-key guard
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use listing_watch::{config::Settings, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let settings = Settings::load(None)?;
//!     let engine = settings.build_engine()?;
//!
//!     let report = engine.run(&settings.sources).await?;
//!     for (source, result) in &report {
//!         println!("{source}: {result:?}");
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                  ScrapeEngine::run(sources)                  │
//! │   fetch → detect → notify → stage checkpoint  (per source)   │
//! │              merge + save once  (join point)                 │
//! └──────────────────────────────────────────────────────────────┘
//!                                │
//! ┌────────────┬───────────┬─────┴──────┬─────────────┬──────────┐
//! │  Source    │  Detect   │   State    │ Subscribers │  Notify  │
//! ├────────────┼───────────┼────────────┼─────────────┼──────────┤
//! │ HTML table │ Prefix    │ File       │ Plain list  │ SMTP     │
//! │ Retry      │ above     │ JsonBin    │ Tokens      │ Brevo    │
//! │ Timeout    │ checkpoint│ Writer lock│ Validation  │ Log      │
//! └────────────┴───────────┴────────────┴─────────────┴──────────┘
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types
pub mod error;

/// Common types
pub mod types;

/// Checkpoint-based change detection
pub mod detect;

/// HTTP client with retry and backoff
pub mod http;

/// Listing sources and table fetching
pub mod source;

/// Checkpoint and subscriber persistence
pub mod state;

/// Subscriber registry
pub mod subscribers;

/// Notification channels
pub mod notify;

/// Run orchestration
pub mod engine;

/// Runtime settings
pub mod config;

/// Command-line interface and HTTP server
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};
pub use types::*;

pub use config::Settings;
pub use engine::{ScrapeEngine, SourceResult};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
