//! The component contract.
//!
//! A component is a user type that embeds a [`Base`] and implements
//! [`Component`]. All four lifecycle hooks default to doing nothing, so a
//! component only overrides the phases it cares about.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;

use crate::capability::{Exports, NoRefs, Refs};
use crate::context::Context;

/// Name and UUID of one declared instance.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identity {
    /// Registered component name
    pub name: String,

    /// Instance UUID, defaults to the name
    pub uuid: String,
}

impl Identity {
    /// Create an identity. An empty `uuid` falls back to `name`.
    pub fn new(name: impl Into<String>, uuid: impl Into<String>) -> Self {
        let name = name.into();
        let uuid = uuid.into();
        let uuid = if uuid.is_empty() { name.clone() } else { uuid };
        Self { name, uuid }
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.name == self.uuid {
            f.write_str(&self.name)
        } else {
            write!(f, "{}({})", self.name, self.uuid)
        }
    }
}

/// Logger bound to one instance. Every record carries the component name and
/// UUID as structured fields.
#[derive(Debug, Clone)]
pub struct Logger {
    name: Arc<str>,
    uuid: Arc<str>,
    span: tracing::Span,
}

impl Logger {
    /// Create a logger for `identity`.
    pub fn new(identity: &Identity) -> Self {
        let span = tracing::info_span!(
            "component",
            component = %identity.name,
            uuid = %identity.uuid
        );
        Self {
            name: Arc::from(identity.name.as_str()),
            uuid: Arc::from(identity.uuid.as_str()),
            span,
        }
    }

    /// Span covering the instance; useful to instrument spawned tasks.
    pub fn span(&self) -> &tracing::Span {
        &self.span
    }

    pub fn trace(&self, message: impl fmt::Display) {
        tracing::trace!(component = %self.name, uuid = %self.uuid, "{}", message);
    }

    pub fn debug(&self, message: impl fmt::Display) {
        tracing::debug!(component = %self.name, uuid = %self.uuid, "{}", message);
    }

    pub fn info(&self, message: impl fmt::Display) {
        tracing::info!(component = %self.name, uuid = %self.uuid, "{}", message);
    }

    pub fn warn(&self, message: impl fmt::Display) {
        tracing::warn!(component = %self.name, uuid = %self.uuid, "{}", message);
    }

    pub fn error(&self, message: impl fmt::Display) {
        tracing::error!(component = %self.name, uuid = %self.uuid, "{}", message);
    }
}

/// State every component embeds: identity, decoded options, typed references
/// and a logger.
///
/// Built by the runtime from a declaration; a component's factory receives it
/// and stores it.
#[derive(Debug)]
pub struct Base<O, R = NoRefs> {
    identity: Identity,
    options: O,
    refs: R,
    logger: Logger,
}

impl<O, R> Base<O, R> {
    /// Assemble a base from already decoded parts.
    pub fn new(identity: Identity, options: O, refs: R) -> Self {
        let logger = Logger::new(&identity);
        Self {
            identity,
            options,
            refs,
            logger,
        }
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    /// Registered component name.
    pub fn name(&self) -> &str {
        &self.identity.name
    }

    /// Instance UUID.
    pub fn uuid(&self) -> &str {
        &self.identity.uuid
    }

    /// Decoded `Options`.
    pub fn options(&self) -> &O {
        &self.options
    }

    /// Typed `Refs`. Bound before any lifecycle hook runs.
    pub fn refs(&self) -> &R {
        &self.refs
    }

    pub fn logger(&self) -> &Logger {
        &self.logger
    }
}

/// A unit of functionality managed by the runtime.
///
/// # Lifecycle
///
/// `init` and `start` run in declaration order and stop at the first failure.
/// `shutdown` and `uninit` run in reverse order and are best-effort. A hook is
/// only ever invoked on an instance whose previous phase succeeded.
#[async_trait]
pub trait Component: Send + Sync + Sized + 'static {
    /// Shape of the declaration's `Options`. A missing or null `Options`
    /// yields `Default::default()`.
    type Options: DeserializeOwned + Default + Send + Sync + 'static;

    /// Shape of the declaration's `Refs`.
    type Refs: Refs;

    /// The embedded base.
    fn base(&self) -> &Base<Self::Options, Self::Refs>;

    /// Publish the capabilities other components may reference.
    fn export(this: &Arc<Self>, exports: &mut Exports) {
        let _ = (this, exports);
    }

    /// Acquire resources. Other components may not be usable yet.
    async fn init(&self, _ctx: &Context) -> anyhow::Result<()> {
        Ok(())
    }

    /// Begin active work. References are safe to use from here on.
    async fn start(&self, _ctx: &Context) -> anyhow::Result<()> {
        Ok(())
    }

    /// Stop active work. The context carries the shutdown deadline.
    async fn shutdown(&self, _ctx: &Context) -> anyhow::Result<()> {
        Ok(())
    }

    /// Release what `init` acquired.
    async fn uninit(&self, _ctx: &Context) -> anyhow::Result<()> {
        Ok(())
    }
}
