//! Event System
//!
//! Hosts the process's event [`Dispatcher`] and exports it as the
//! [`EventDispatcher`] capability. The dispatcher exists between `init` and
//! `uninit`; outside that window every call fails with
//! [`EventError::NotReady`].

use std::sync::Arc;

use async_trait::async_trait;
use hive_core::{Base, Component, Context, Exports, NoRefs};
use hive_event::{Dispatcher, Envelope, EventDispatcher, EventError, Listener};
use parking_lot::RwLock;
use serde::Deserialize;

pub const NAME: &str = "eventsystem";

#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct EventSystemOptions {
    /// Deliver events to listeners one at a time, in registration order
    pub ordered: bool,
}

impl Default for EventSystemOptions {
    fn default() -> Self {
        Self { ordered: true }
    }
}

pub struct EventSystem {
    base: Base<EventSystemOptions>,
    dispatcher: RwLock<Option<Arc<Dispatcher>>>,
}

impl EventSystem {
    pub fn new(base: Base<EventSystemOptions>) -> Self {
        Self {
            base,
            dispatcher: RwLock::new(None),
        }
    }

    fn dispatcher(&self) -> Result<Arc<Dispatcher>, EventError> {
        self.dispatcher.read().clone().ok_or(EventError::NotReady)
    }
}

#[async_trait]
impl EventDispatcher for EventSystem {
    fn add_listener(&self, listener: Listener) -> Result<(), EventError> {
        self.dispatcher()?.add_listener(listener)
    }

    async fn dispatch_envelope(&self, ctx: &Context, envelope: Envelope) -> Result<(), EventError> {
        let dispatcher = self.dispatcher()?;
        dispatcher.dispatch_envelope(ctx, envelope).await
    }
}

#[async_trait]
impl Component for EventSystem {
    type Options = EventSystemOptions;
    type Refs = NoRefs;

    fn base(&self) -> &Base<EventSystemOptions> {
        &self.base
    }

    fn export(this: &Arc<Self>, exports: &mut Exports) {
        exports.export::<dyn EventDispatcher>(this.clone());
    }

    async fn init(&self, _ctx: &Context) -> anyhow::Result<()> {
        let ordered = self.base.options().ordered;
        *self.dispatcher.write() = Some(Arc::new(Dispatcher::new(ordered)));
        self.base
            .logger()
            .debug(format_args!("dispatcher created (ordered: {ordered})"));
        Ok(())
    }

    async fn uninit(&self, _ctx: &Context) -> anyhow::Result<()> {
        self.dispatcher.write().take();
        Ok(())
    }
}
