//! Typed listeners.

use std::any::TypeId;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::future::{self, BoxFuture, FutureExt};
use hive_core::Context;

use crate::key::{Envelope, Event, EventKey};

type Handler = Arc<dyn Fn(Context, Envelope) -> BoxFuture<'static, anyhow::Result<()>> + Send + Sync>;

/// A handler registered for one event key.
#[derive(Clone)]
pub struct Listener {
    key: EventKey,
    type_id: TypeId,
    type_name: &'static str,
    handler: Handler,
}

impl Listener {
    /// Listen for events of type `E`.
    pub fn new<E, F, Fut>(handler: F) -> Self
    where
        E: Event,
        F: Fn(Context, Arc<E>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        let erased = move |ctx: Context, envelope: Envelope| -> BoxFuture<'static, anyhow::Result<()>> {
            match envelope.downcast::<E>() {
                Some(event) => handler(ctx, event).boxed(),
                None => future::ready(Err(anyhow::anyhow!(
                    "listener for {} expects {}, got {}",
                    E::KEY,
                    std::any::type_name::<E>(),
                    envelope.type_name()
                )))
                .boxed(),
            }
        };

        Self {
            key: E::KEY,
            type_id: TypeId::of::<E>(),
            type_name: std::any::type_name::<E>(),
            handler: Arc::new(erased),
        }
    }

    pub fn key(&self) -> EventKey {
        self.key
    }

    /// Rust type name of the payload this listener accepts.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub(crate) fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub(crate) fn call(
        &self,
        ctx: Context,
        envelope: Envelope,
    ) -> BoxFuture<'static, anyhow::Result<()>> {
        (self.handler)(ctx, envelope)
    }
}

impl fmt::Debug for Listener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listener")
            .field("key", &self.key)
            .field("type", &self.type_name)
            .finish()
    }
}
