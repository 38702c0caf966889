//! # Hive Core
//!
//! `hive_core` defines the contract every Hive component is written against.
//! The runtime (`hive_runtime`) instantiates components from configuration,
//! binds their references and drives them through the lifecycle; this crate
//! only describes what a component looks like from the inside.
//!
//! ## Building blocks
//!
//! - **component**: the [`Component`] trait with defaulted lifecycle hooks and
//!   the [`Base`] adapter carrying decoded options, references and the
//!   identity-bound [`Logger`].
//! - **capability**: narrow interfaces a component exposes to others
//!   ([`Capability`], [`Exports`]) and the typed [`Reference`] used to depend
//!   on them.
//! - **instance**: the type-erased [`Instance`] the runtime works with, and the
//!   [`Constructor`] stored in the registry.
//! - **context**: the [`Context`] handed to every hook, carrying a deadline
//!   and the stop signal.
//! - **state**: lifecycle [`Phase`]s and per-instance [`ComponentState`].
//! - **logging** / **version**: log level parsing and build metadata.
//!
//! ## Lifecycle contract
//!
//! ```text
//! Created ──init──▶ Initialized ──start──▶ Started ──▶ Running
//!                                                        │
//!          Terminated ◀── Uninitialized ◀──uninit── ShuttingDown ◀──shutdown
//! ```
//!
//! References are bound before any hook runs, but the referenced component is
//! only guaranteed to be constructed at that point. Calling into a reference
//! is safe from `start` onward.

pub mod capability;
pub mod component;
pub mod context;
pub mod error;
pub mod instance;
pub mod logging;
pub mod state;
pub mod version;

pub use capability::{Binder, Capability, Exports, NoRefs, Reference, Refs, Resolve};
pub use component::{Base, Component, Identity, Logger};
pub use context::{Context, StopHandle};
pub use error::{BindError, DeadlineExceeded, ReferenceError, SetupError};
pub use instance::{constructor, Constructor, Instance, Setup};
pub use logging::LogLevel;
pub use state::{ComponentState, Phase};
pub use version::VersionInfo;
