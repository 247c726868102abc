//! Subscriber registry
//!
//! The orchestrator only needs "who are the current recipients"; the control
//! surface also adds and removes them. [`StateRegistry`] keeps the collection
//! in the state blob, either as a plain list or with per-subscriber
//! unsubscribe tokens.

mod store;
mod types;
mod validate;

pub use store::StateRegistry;
pub use types::{SubscribeOutcome, Subscriber, SubscriberMode, SubscriberRegistry};
pub use validate::normalize_address;
