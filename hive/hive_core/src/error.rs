//! Error types shared by components and the runtime.
//!
//! Hooks themselves return `anyhow::Result<()>`; the errors here describe
//! failures of the component contract: decoding a declaration into a typed
//! component, binding references, and using a reference before it is bound.

use thiserror::Error;

/// A declaration could not be turned into a typed component.
#[derive(Debug, Error)]
pub enum SetupError {
    /// `Options` did not match the shape the component expects
    #[error("invalid Options: {0}")]
    Options(#[source] serde_json::Error),

    /// `Refs` did not match the reference labels the component expects
    #[error("invalid Refs: {0}")]
    Refs(#[source] serde_json::Error),
}

/// A `Refs` entry could not be bound to a live instance.
#[derive(Debug, Error)]
pub enum BindError {
    /// The target UUID is not declared anywhere
    #[error("reference {label} targets unknown UUID {target:?}")]
    UnknownTarget {
        /// Field label of the reference
        label: String,

        /// UUID the reference points at
        target: String,
    },

    /// The target exists but does not expose the expected capability
    #[error(
        "reference {label} targets {target:?}, which does not provide {capability} (provides: [{available}])"
    )]
    Incompatible {
        /// Field label of the reference
        label: String,

        /// UUID the reference points at
        target: String,

        /// Name of the capability the field expects
        capability: &'static str,

        /// Capabilities the target does provide, comma separated
        available: String,
    },

    /// The reference was bound twice
    #[error("reference {label} is already bound")]
    AlreadyBound {
        /// Field label of the reference
        label: String,
    },
}

/// A reference was used before the runtime bound it.
#[derive(Debug, Error)]
#[error("reference to {uuid:?} ({capability}) is not bound yet")]
pub struct ReferenceError {
    /// UUID the reference points at
    pub uuid: String,

    /// Name of the expected capability
    pub capability: &'static str,
}

/// Bounded work did not finish before the context deadline.
#[derive(Debug, Error)]
#[error("deadline exceeded")]
pub struct DeadlineExceeded;
