//! # Hive Runtime
//!
//! Orchestrates components declared in configuration:
//!
//! - **registry**: component name to constructor, sealed before configuration
//!   is read.
//! - **graph**: instantiates every declaration and binds `Refs` to the
//!   capabilities their targets export.
//! - **lifecycle**: runs `init` and `start` in declaration order, `shutdown`
//!   and `uninit` in reverse, with unwind on failure.
//! - **service**: load, resolve, run.

pub mod config;
pub mod error;
pub mod graph;
pub mod lifecycle;
pub mod registry;
pub mod service;

pub use config::RuntimeConfig;
pub use error::{Error, Result};
pub use graph::{ComponentGraph, ResolutionError};
pub use lifecycle::{HookFailure, LifecycleError, Sequencer, TeardownError};
pub use registry::{global, Registry, RegistryError};
pub use service::Service;
