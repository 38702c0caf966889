//! Service
//!
//! Ties the pieces together: load the configuration, resolve the component
//! graph against the registry, then run the lifecycle.

use std::future::{self, Future};

use hive_config::{Document, Source};
use hive_core::StopHandle;
use tracing::info;

use crate::config::RuntimeConfig;
use crate::error::Error;
use crate::graph::ComponentGraph;
use crate::lifecycle::Sequencer;
use crate::registry::Registry;

/// One run of the runtime over a registry.
pub struct Service<'r> {
    registry: &'r Registry,
    config: RuntimeConfig,
    stop: StopHandle,
}

impl<'r> Service<'r> {
    /// Create a service. Seals `registry`: no component can be registered
    /// once configuration handling begins.
    pub fn new(registry: &'r Registry, config: RuntimeConfig) -> Result<Self, Error> {
        config.validate()?;
        registry.seal();
        Ok(Self {
            registry,
            config,
            stop: StopHandle::new(),
        })
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    pub fn registry(&self) -> &'r Registry {
        self.registry
    }

    /// Handle to request that a running service stops.
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// Load and validate the component configuration.
    pub async fn load(&self, source: &Source) -> Result<Document, Error> {
        let options = self.config.loader_options(source)?;
        info!(source = %source, format = options.codec.name, "loading configuration");
        Ok(hive_config::load(source, options).await?)
    }

    /// Instantiate and resolve the declared components.
    pub fn build(&self, document: &Document) -> Result<ComponentGraph, Error> {
        ComponentGraph::build(self.registry, &document.components)
    }

    /// A sequencer over `graph`, wired to this service's stop handle.
    pub fn sequencer(&self, graph: ComponentGraph) -> Sequencer {
        Sequencer::new(graph, self.config.shutdown_timeout(), self.stop.clone())
    }

    /// Load, resolve and run until every component has started, then tear
    /// down. Components that need to keep the process alive block in their
    /// `start` hook.
    pub async fn run(&self, source: &Source) -> Result<(), Error> {
        self.run_until(source, future::ready(())).await
    }

    /// Load, resolve and run until `trigger` resolves or a stop is requested.
    pub async fn run_until<F>(&self, source: &Source, trigger: F) -> Result<(), Error>
    where
        F: Future<Output = ()>,
    {
        let document = self.load(source).await?;
        let graph = self.build(&document)?;
        self.sequencer(graph).run_until(trigger).await
    }
}
