//! The in-process dispatcher.

use std::any::TypeId;
use std::collections::HashMap;

use async_trait::async_trait;
use futures::stream::{FuturesUnordered, StreamExt};
use hive_core::{Capability, Context};
use parking_lot::RwLock;
use tracing::{debug, warn};

use crate::error::EventError;
use crate::key::{Envelope, Event, EventKey};
use crate::listener::Listener;

/// Capability exported by components that route events.
#[async_trait]
pub trait EventDispatcher: Send + Sync {
    /// Register a listener under its event key.
    fn add_listener(&self, listener: Listener) -> Result<(), EventError>;

    /// Deliver an event to every listener registered under its key.
    async fn dispatch_envelope(&self, ctx: &Context, envelope: Envelope) -> Result<(), EventError>;
}

impl Capability for dyn EventDispatcher {
    const NAME: &'static str = "hive.event.dispatcher";
}

/// Typed helpers over any [`EventDispatcher`].
#[async_trait]
pub trait DispatchExt: EventDispatcher {
    /// Dispatch a typed event.
    async fn dispatch<E: Event>(&self, ctx: &Context, event: E) -> Result<(), EventError> {
        self.dispatch_envelope(ctx, Envelope::new(event)).await
    }

    /// Register a typed handler.
    fn listen<E, F, Fut>(&self, handler: F) -> Result<(), EventError>
    where
        E: Event,
        F: Fn(Context, std::sync::Arc<E>) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.add_listener(Listener::new::<E, F, Fut>(handler))
    }
}

impl<T: EventDispatcher + ?Sized> DispatchExt for T {}

#[derive(Default)]
struct Table {
    listeners: HashMap<EventKey, Vec<Listener>>,

    /// Payload type each key was first registered with
    schema: HashMap<EventKey, (TypeId, &'static str)>,
}

/// Routes events to listeners by key.
///
/// In ordered mode listeners run one after another in registration order,
/// and the first failure stops the dispatch. In unordered mode they all run
/// concurrently on the dispatching task; every listener runs to completion
/// and the first failure observed is returned.
pub struct Dispatcher {
    ordered: bool,
    table: RwLock<Table>,
}

impl Dispatcher {
    pub fn new(ordered: bool) -> Self {
        Self {
            ordered,
            table: RwLock::new(Table::default()),
        }
    }

    pub fn is_ordered(&self) -> bool {
        self.ordered
    }

    /// Keys with at least one registered listener, sorted.
    pub fn keys(&self) -> Vec<EventKey> {
        let mut keys: Vec<_> = self.table.read().listeners.keys().copied().collect();
        keys.sort();
        keys
    }

    pub fn listener_count(&self, key: EventKey) -> usize {
        self.table
            .read()
            .listeners
            .get(&key)
            .map(Vec::len)
            .unwrap_or(0)
    }

    fn check_schema(
        table: &Table,
        key: EventKey,
        type_id: TypeId,
        type_name: &'static str,
    ) -> Result<(), EventError> {
        match table.schema.get(&key) {
            Some((expected, expected_name)) if *expected != type_id => {
                Err(EventError::PayloadMismatch {
                    key,
                    expected: *expected_name,
                    found: type_name,
                })
            }
            _ => Ok(()),
        }
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new(true)
    }
}

#[async_trait]
impl EventDispatcher for Dispatcher {
    fn add_listener(&self, listener: Listener) -> Result<(), EventError> {
        let mut table = self.table.write();
        let key = listener.key();
        Self::check_schema(&table, key, listener.type_id(), listener.type_name())?;
        table
            .schema
            .entry(key)
            .or_insert((listener.type_id(), listener.type_name()));
        table.listeners.entry(key).or_default().push(listener);
        debug!(key = %key, "event listener added");
        Ok(())
    }

    async fn dispatch_envelope(&self, ctx: &Context, envelope: Envelope) -> Result<(), EventError> {
        let key = envelope.key();
        let listeners = {
            let table = self.table.read();
            Self::check_schema(&table, key, envelope.type_id(), envelope.type_name())?;
            match table.listeners.get(&key) {
                Some(listeners) => listeners.clone(),
                None => return Ok(()),
            }
        };

        if self.ordered {
            for listener in &listeners {
                listener
                    .call(ctx.clone(), envelope.clone())
                    .await
                    .map_err(|cause| EventError::Listener { key, cause })?;
            }
            return Ok(());
        }

        let mut pending: FuturesUnordered<_> = listeners
            .iter()
            .map(|listener| listener.call(ctx.clone(), envelope.clone()))
            .collect();
        let mut first = None;
        while let Some(result) = pending.next().await {
            if let Err(cause) = result {
                if first.is_none() {
                    first = Some(cause);
                } else {
                    warn!(key = %key, error = %format!("{cause:#}"), "event listener failed");
                }
            }
        }

        match first {
            Some(cause) => Err(EventError::Listener { key, cause }),
            None => Ok(()),
        }
    }
}
