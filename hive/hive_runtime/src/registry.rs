//! Component Registry
//!
//! Maps a component name to the constructor that builds it. Registrations
//! happen before any configuration is read; once the registry is sealed,
//! further registrations are rejected.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};

use hive_core::{constructor, Base, Component, Constructor};
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use thiserror::Error;
use tracing::debug;

/// Errors that can occur in registry operations
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("component {0:?} is already registered")]
    Duplicate(String),

    #[error("component {0:?} is not registered")]
    NotFound(String),

    #[error("component {0:?} registered after the registry was sealed")]
    Closed(String),
}

/// Name to constructor map.
#[derive(Default)]
pub struct Registry {
    constructors: RwLock<BTreeMap<String, Constructor>>,
    sealed: AtomicBool,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a component type under `name`.
    ///
    /// # Arguments
    ///
    /// * `name` - The name declarations refer to.
    /// * `factory` - Wraps a decoded [`Base`] into the component.
    pub fn register<C, F>(&self, name: &str, factory: F) -> Result<(), RegistryError>
    where
        C: Component,
        F: Fn(Base<C::Options, C::Refs>) -> C + Send + Sync + 'static,
    {
        self.register_constructor(name, constructor::<C, F>(factory))
    }

    /// Register a type-erased constructor under `name`.
    pub fn register_constructor(
        &self,
        name: &str,
        constructor: Constructor,
    ) -> Result<(), RegistryError> {
        if self.is_sealed() {
            return Err(RegistryError::Closed(name.to_string()));
        }

        let mut constructors = self.constructors.write();
        if constructors.contains_key(name) {
            return Err(RegistryError::Duplicate(name.to_string()));
        }
        constructors.insert(name.to_string(), constructor);

        debug!(component = name, "component registered");
        Ok(())
    }

    /// Close the registration window.
    pub fn seal(&self) {
        self.sealed.store(true, Ordering::Release);
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed.load(Ordering::Acquire)
    }

    /// Constructor registered under `name`.
    pub fn lookup(&self, name: &str) -> Result<Constructor, RegistryError> {
        self.constructors
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| RegistryError::NotFound(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.constructors.read().contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<String> {
        self.constructors.read().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.constructors.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.constructors.read().is_empty()
    }
}

static GLOBAL: Lazy<Registry> = Lazy::new(Registry::new);

/// The process-wide registry.
pub fn global() -> &'static Registry {
    &GLOBAL
}
