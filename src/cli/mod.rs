//! CLI module
//!
//! Command-line interface and HTTP control surface.
//!
//! # Commands
//!
//! - `serve` - Start HTTP server mode
//! - `run` - Scrape every source once
//! - `checkpoints` - Show stored checkpoints
//! - `subscribers` / `subscribe` / `unsubscribe` - Manage recipients
//! - `sources` - List configured sources

mod auth;
mod commands;
mod runner;
mod server;

pub use auth::{authorize, AuthDecision, API_KEY_HEADER};
pub use commands::{Cli, Commands};
pub use runner::Runner;
pub use server::{router, serve, AppState};
