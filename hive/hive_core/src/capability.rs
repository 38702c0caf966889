//! Capability references.
//!
//! A component never depends on another component's concrete type. It depends
//! on a *capability*: a narrow trait the target chooses to export. Capability
//! traits are tagged with a stable name by implementing [`Capability`] for the
//! trait object type:
//!
//! ```
//! use std::sync::Arc;
//! use hive_core::{Capability, Exports};
//!
//! pub trait Greeter: Send + Sync {
//!     fn greet(&self, who: &str) -> String;
//! }
//!
//! impl Capability for dyn Greeter {
//!     const NAME: &'static str = "example.greeter";
//! }
//!
//! struct English;
//!
//! impl Greeter for English {
//!     fn greet(&self, who: &str) -> String {
//!         format!("hello, {who}")
//!     }
//! }
//!
//! let mut exports = Exports::new();
//! exports.export::<dyn Greeter>(Arc::new(English));
//! let greeter = exports.get::<dyn Greeter>().expect("exported above");
//! assert_eq!(greeter.greet("bob"), "hello, bob");
//! ```
//!
//! The depending component declares a [`Reference`] per `Refs` label in its
//! [`Refs`] type. The runtime resolves the label's UUID, looks the capability
//! up in the target's [`Exports`], and binds it.

use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use once_cell::sync::OnceCell;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{BindError, ReferenceError};

/// A narrow interface that components export for others to depend on.
pub trait Capability: Send + Sync + 'static {
    /// Stable, human readable capability name used in diagnostics.
    const NAME: &'static str;
}

/// Capabilities exported by one component instance.
#[derive(Default)]
pub struct Exports {
    entries: BTreeMap<&'static str, Box<dyn Any + Send + Sync>>,
}

impl Exports {
    /// Create an empty export set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Export a capability. A later export of the same capability replaces
    /// the earlier one.
    pub fn export<C: Capability + ?Sized>(&mut self, capability: Arc<C>) -> &mut Self {
        self.entries.insert(C::NAME, Box::new(capability));
        self
    }

    /// Look up an exported capability.
    pub fn get<C: Capability + ?Sized>(&self) -> Option<Arc<C>> {
        self.entries
            .get(C::NAME)
            .and_then(|entry| entry.downcast_ref::<Arc<C>>())
            .cloned()
    }

    /// Whether the capability is exported.
    pub fn provides<C: Capability + ?Sized>(&self) -> bool {
        self.get::<C>().is_some()
    }

    /// Names of all exported capabilities, sorted.
    pub fn names(&self) -> Vec<&'static str> {
        self.entries.keys().copied().collect()
    }

    /// Number of exported capabilities.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is exported.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for Exports {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.entries.keys()).finish()
    }
}

/// A typed reference to another component's capability.
///
/// Deserializes from the target UUID string found in the declaration's
/// `Refs`. It is bound exactly once by the runtime, before any lifecycle hook
/// runs, and is immutable afterwards.
pub struct Reference<C: Capability + ?Sized> {
    uuid: String,
    target: OnceCell<Arc<C>>,
}

impl<C: Capability + ?Sized> Reference<C> {
    /// Create an unbound reference to `uuid`.
    pub fn new(uuid: impl Into<String>) -> Self {
        Self {
            uuid: uuid.into(),
            target: OnceCell::new(),
        }
    }

    /// UUID of the referenced instance.
    pub fn uuid(&self) -> &str {
        &self.uuid
    }

    /// Whether the runtime has bound this reference.
    pub fn is_bound(&self) -> bool {
        self.target.get().is_some()
    }

    /// The bound capability.
    pub fn get(&self) -> Result<&Arc<C>, ReferenceError> {
        self.target.get().ok_or_else(|| ReferenceError {
            uuid: self.uuid.clone(),
            capability: C::NAME,
        })
    }

    fn bind(&self, target: Arc<C>) -> bool {
        self.target.set(target).is_ok()
    }
}

impl<C: Capability + ?Sized> fmt::Debug for Reference<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reference")
            .field("uuid", &self.uuid)
            .field("capability", &C::NAME)
            .field("bound", &self.is_bound())
            .finish()
    }
}

impl<'de, C: Capability + ?Sized> Deserialize<'de> for Reference<C> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(Reference::new)
    }
}

impl<C: Capability + ?Sized> Serialize for Reference<C> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.uuid)
    }
}

/// Looks up the exports of a declared instance by UUID.
pub trait Resolve {
    /// Exports of the instance declared under `uuid`, if any.
    fn resolve(&self, uuid: &str) -> Option<&Exports>;
}

/// Binds the references of one component against a resolver.
pub struct Binder<'a> {
    resolver: &'a dyn Resolve,
}

impl<'a> Binder<'a> {
    /// Create a binder over `resolver`.
    pub fn new(resolver: &'a dyn Resolve) -> Self {
        Self { resolver }
    }

    /// Bind `reference`, declared under `label`, to its target's capability.
    pub fn bind<C: Capability + ?Sized>(
        &mut self,
        label: &str,
        reference: &Reference<C>,
    ) -> Result<(), BindError> {
        let exports =
            self.resolver
                .resolve(reference.uuid())
                .ok_or_else(|| BindError::UnknownTarget {
                    label: label.to_string(),
                    target: reference.uuid().to_string(),
                })?;

        let capability = exports
            .get::<C>()
            .ok_or_else(|| BindError::Incompatible {
                label: label.to_string(),
                target: reference.uuid().to_string(),
                capability: C::NAME,
                available: exports.names().join(", "),
            })?;

        if !reference.bind(capability) {
            return Err(BindError::AlreadyBound {
                label: label.to_string(),
            });
        }
        Ok(())
    }

    /// Bind an optional reference. Absent references are skipped.
    pub fn bind_optional<C: Capability + ?Sized>(
        &mut self,
        label: &str,
        reference: &Option<Reference<C>>,
    ) -> Result<(), BindError> {
        match reference {
            Some(reference) => self.bind(label, reference),
            None => Ok(()),
        }
    }
}

/// The typed shape of a component's `Refs` mapping.
///
/// Implementors are plain structs of [`Reference`] fields deserialized from
/// the declaration's `Refs`, usually with `#[serde(deny_unknown_fields)]` so
/// that a misspelt label fails loudly.
pub trait Refs: DeserializeOwned + Send + Sync + 'static {
    /// Bind every reference field.
    fn bind(&self, binder: &mut Binder<'_>) -> Result<(), BindError>;
}

/// `Refs` for components that depend on nothing.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NoRefs {}

impl Refs for NoRefs {
    fn bind(&self, _binder: &mut Binder<'_>) -> Result<(), BindError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    trait Clock: Send + Sync {
        fn now(&self) -> u64;
    }

    impl Capability for dyn Clock {
        const NAME: &'static str = "test.clock";
    }

    trait Store: Send + Sync {}

    impl Capability for dyn Store {
        const NAME: &'static str = "test.store";
    }

    struct Fixed(u64);

    impl Clock for Fixed {
        fn now(&self) -> u64 {
            self.0
        }
    }

    struct Table(HashMap<String, Exports>);

    impl Resolve for Table {
        fn resolve(&self, uuid: &str) -> Option<&Exports> {
            self.0.get(uuid)
        }
    }

    fn table() -> Table {
        let mut exports = Exports::new();
        exports.export::<dyn Clock>(Arc::new(Fixed(42)));
        Table(HashMap::from([("clock".to_string(), exports)]))
    }

    #[test]
    fn test_exports_lookup() {
        let table = table();
        let exports = table.resolve("clock").unwrap();
        assert!(exports.provides::<dyn Clock>());
        assert!(!exports.provides::<dyn Store>());
        assert_eq!(exports.names(), vec!["test.clock"]);
        assert_eq!(exports.get::<dyn Clock>().unwrap().now(), 42);
    }

    #[test]
    fn test_reference_deserializes_from_uuid() {
        let reference: Reference<dyn Clock> = serde_json::from_str("\"clock\"").unwrap();
        assert_eq!(reference.uuid(), "clock");
        assert!(!reference.is_bound());
        let err = reference.get().err().unwrap();
        assert_eq!(err.capability, "test.clock");
    }

    #[test]
    fn test_bind_resolves_capability() {
        let table = table();
        let reference = Reference::<dyn Clock>::new("clock");
        Binder::new(&table).bind("Clock", &reference).unwrap();
        assert_eq!(reference.get().unwrap().now(), 42);

        let again = Binder::new(&table).bind("Clock", &reference);
        assert!(matches!(again, Err(BindError::AlreadyBound { .. })));
    }

    #[test]
    fn test_bind_reports_unknown_and_incompatible() {
        let table = table();

        let missing = Reference::<dyn Clock>::new("nope");
        let err = Binder::new(&table).bind("Clock", &missing).unwrap_err();
        assert!(matches!(err, BindError::UnknownTarget { ref target, .. } if target == "nope"));

        let wrong = Reference::<dyn Store>::new("clock");
        let err = Binder::new(&table).bind("Store", &wrong).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("test.store"), "{message}");
        assert!(message.contains("test.clock"), "{message}");
    }

    #[test]
    fn test_bind_optional_skips_absent() {
        let table = table();
        let absent: Option<Reference<dyn Clock>> = None;
        Binder::new(&table).bind_optional("Clock", &absent).unwrap();
    }

    #[test]
    fn test_no_refs_rejects_labels() {
        assert!(serde_json::from_str::<NoRefs>("{}").is_ok());
        assert!(serde_json::from_str::<NoRefs>(r#"{"Clock":"clock"}"#).is_err());
    }
}
