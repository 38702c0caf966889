//! Top-level runtime errors.

use hive_config::ConfigError;
use thiserror::Error;

use crate::graph::ResolutionError;
use crate::lifecycle::{LifecycleError, TeardownError};
use crate::registry::RegistryError;

/// Any error that aborts a run.
#[derive(Debug, Error)]
pub enum Error {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("registration error: {0}")]
    Registration(#[from] RegistryError),

    #[error("resolution error: {0}")]
    Resolution(#[from] ResolutionError),

    #[error("lifecycle error: {0}")]
    Lifecycle(#[from] LifecycleError),

    #[error("teardown error: {0}")]
    Teardown(#[from] TeardownError),

    #[error("invalid runtime configuration: {0}")]
    InvalidConfig(String),

    #[error("invalid state: {0}")]
    InvalidState(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
