//! State management module
//!
//! Persists per-source checkpoints and the subscriber collection as one
//! JSON blob, read and replaced whole.
//!
//! # Overview
//!
//! The state module provides:
//! - `State` - Checkpoints and subscribers
//! - `StateStore` - Backends: local file, JsonBin, memory
//! - `StateManager` - Bootstrap, lenient parsing and serialized writes

mod manager;
mod store;
mod types;

pub use manager::StateManager;
pub use store::{FileStore, JsonBinStore, MemoryStore, StateStore, JSONBIN_BASE_URL};
pub use types::{State, Subscribers};

#[cfg(test)]
mod manager_tests;
