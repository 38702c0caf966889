//! Event errors.

use thiserror::Error;

use crate::key::EventKey;

#[derive(Debug, Error)]
pub enum EventError {
    /// A listener returned an error
    #[error("listener for event {key} failed: {cause:#}")]
    Listener { key: EventKey, cause: anyhow::Error },

    /// The key is pinned to another payload type
    #[error("event {key} carries {expected}, not {found}")]
    PayloadMismatch {
        key: EventKey,
        expected: &'static str,
        found: &'static str,
    },

    /// The dispatcher has not been created yet
    #[error("event dispatcher is not ready")]
    NotReady,
}
