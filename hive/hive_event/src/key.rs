//! Event identity.

use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

/// Explicit identifier of one kind of event.
///
/// Keys are plain names, so the set of keys a dispatcher knows about can be
/// listed and logged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EventKey(&'static str);

impl EventKey {
    pub const fn new(name: &'static str) -> Self {
        Self(name)
    }

    pub fn as_str(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for EventKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// An event payload type, tied to its key.
pub trait Event: Send + Sync + 'static {
    const KEY: EventKey;
}

/// A type-erased event on its way to listeners.
#[derive(Clone)]
pub struct Envelope {
    key: EventKey,
    payload: Arc<dyn Any + Send + Sync>,
    type_id: TypeId,
    type_name: &'static str,
}

impl Envelope {
    pub fn new<E: Event>(event: E) -> Self {
        Self::from_arc(Arc::new(event))
    }

    pub fn from_arc<E: Event>(event: Arc<E>) -> Self {
        Self {
            key: E::KEY,
            payload: event,
            type_id: TypeId::of::<E>(),
            type_name: std::any::type_name::<E>(),
        }
    }

    pub fn key(&self) -> EventKey {
        self.key
    }

    /// Rust type name of the payload.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub(crate) fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// The payload, if it is an `E`.
    pub fn downcast<E: Event>(&self) -> Option<Arc<E>> {
        self.payload.clone().downcast::<E>().ok()
    }
}

impl fmt::Debug for Envelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Envelope")
            .field("key", &self.key)
            .field("type", &self.type_name)
            .finish()
    }
}
