//! Component Graph
//!
//! Instantiates every declaration through the registry and binds each
//! instance's references to the capabilities exported by their targets.
//! Resolution is a single synchronous pass that runs before any lifecycle
//! hook; a reference may target an instance declared later.

use std::collections::HashMap;
use std::sync::Arc;

use hive_config::Declaration;
use hive_core::{
    BindError, Binder, Capability, Exports, Identity, Instance, Resolve, Setup, SetupError,
};
use thiserror::Error;
use tracing::{debug, info};

use crate::error::Error;
use crate::registry::Registry;

/// Errors that can occur while resolving the graph
#[derive(Debug, Error)]
pub enum ResolutionError {
    #[error("component #{index} {component}: {source}")]
    Setup {
        index: usize,
        component: Identity,
        #[source]
        source: SetupError,
    },

    #[error(
        "UUID {uuid:?} is declared by components #{first} and #{second} but must be unique: {referrer} references it as {label}"
    )]
    DuplicateUuid {
        uuid: String,
        first: usize,
        second: usize,
        referrer: Identity,
        label: String,
    },

    #[error("{referrer}: reference {label} targets unknown UUID {target:?}")]
    UnknownTarget {
        referrer: Identity,
        label: String,
        target: String,
    },

    #[error("{referrer}: {source}")]
    Bind {
        referrer: Identity,
        #[source]
        source: BindError,
    },
}

/// Instantiated, reference-bound components in declaration order.
pub struct ComponentGraph {
    nodes: Vec<Arc<dyn Instance>>,

    /// UUID to declaration indices
    by_uuid: HashMap<String, Vec<usize>>,
}

impl ComponentGraph {
    /// Instantiate and resolve `declarations`.
    ///
    /// # Arguments
    ///
    /// * `registry` - Where component names are looked up.
    /// * `declarations` - Components to create, in order.
    ///
    /// # Returns
    ///
    /// The resolved graph, or the first registration or resolution error.
    pub fn build(registry: &Registry, declarations: &[Declaration]) -> Result<Self, Error> {
        let mut nodes = Vec::with_capacity(declarations.len());
        for (index, declaration) in declarations.iter().enumerate() {
            let identity = Identity::new(&declaration.name, declaration.uuid());
            let construct = registry.lookup(&declaration.name)?;
            let instance = construct(Setup {
                identity: identity.clone(),
                options: &declaration.options,
                refs: &declaration.refs,
            })
            .map_err(|source| ResolutionError::Setup {
                index,
                component: identity,
                source,
            })?;
            nodes.push(instance);
        }

        let mut by_uuid: HashMap<String, Vec<usize>> = HashMap::new();
        for (index, node) in nodes.iter().enumerate() {
            by_uuid
                .entry(node.identity().uuid.clone())
                .or_default()
                .push(index);
        }

        for (declaration, node) in declarations.iter().zip(&nodes) {
            for (label, target) in &declaration.refs {
                match by_uuid.get(target).map(Vec::as_slice) {
                    Some([_]) => {}
                    Some([first, second, ..]) => {
                        return Err(ResolutionError::DuplicateUuid {
                            uuid: target.clone(),
                            first: *first,
                            second: *second,
                            referrer: node.identity().clone(),
                            label: label.clone(),
                        }
                        .into());
                    }
                    _ => {
                        return Err(ResolutionError::UnknownTarget {
                            referrer: node.identity().clone(),
                            label: label.clone(),
                            target: target.clone(),
                        }
                        .into());
                    }
                }
            }
        }

        let graph = Self { nodes, by_uuid };
        for node in &graph.nodes {
            node.bind(&mut Binder::new(&graph))
                .map_err(|source| ResolutionError::Bind {
                    referrer: node.identity().clone(),
                    source,
                })?;
            debug!(
                component = %node.identity().name,
                uuid = %node.identity().uuid,
                exports = ?node.exports().names(),
                "component resolved"
            );
        }

        info!(components = graph.len(), "component graph resolved");
        Ok(graph)
    }

    /// Instances in declaration order.
    pub fn nodes(&self) -> &[Arc<dyn Instance>] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The instance declared under `uuid`, if exactly one is.
    pub fn get(&self, uuid: &str) -> Option<&Arc<dyn Instance>> {
        match self.by_uuid.get(uuid)?.as_slice() {
            [index] => self.nodes.get(*index),
            _ => None,
        }
    }

    /// A capability exported by the instance declared under `uuid`.
    pub fn capability<C: Capability + ?Sized>(&self, uuid: &str) -> Option<Arc<C>> {
        self.get(uuid)?.exports().get::<C>()
    }

    pub(crate) fn into_nodes(self) -> Vec<Arc<dyn Instance>> {
        self.nodes
    }
}

impl Resolve for ComponentGraph {
    fn resolve(&self, uuid: &str) -> Option<&Exports> {
        self.get(uuid).map(|node| node.exports())
    }
}
