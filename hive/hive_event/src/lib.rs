//! # Hive Event
//!
//! Keyed, in-process event dispatch.
//!
//! Every event type names its [`EventKey`] explicitly. A [`Dispatcher`] pins
//! each key to the payload type it was first registered with, so mismatched
//! listeners and dispatches fail loudly instead of being silently skipped.
//!
//! ```
//! use std::sync::Arc;
//! use hive_core::Context;
//! use hive_event::{DispatchExt, Dispatcher, Event, EventKey};
//!
//! struct Joined {
//!     user: String,
//! }
//!
//! impl Event for Joined {
//!     const KEY: EventKey = EventKey::new("chat.joined");
//! }
//!
//! # tokio_test_block(async {
//! let dispatcher = Dispatcher::new(true);
//! dispatcher
//!     .listen(|_ctx: Context, event: Arc<Joined>| async move {
//!         println!("{} joined", event.user);
//!         Ok::<(), anyhow::Error>(())
//!     })
//!     .unwrap();
//! dispatcher
//!     .dispatch(&Context::background(), Joined { user: "bob".into() })
//!     .await
//!     .unwrap();
//! # });
//! # fn tokio_test_block<F: std::future::Future>(f: F) {
//! #     tokio::runtime::Runtime::new().unwrap().block_on(f);
//! # }
//! ```

pub mod dispatcher;
pub mod error;
pub mod key;
pub mod listener;

pub use dispatcher::{DispatchExt, Dispatcher, EventDispatcher};
pub use error::EventError;
pub use key::{Envelope, Event, EventKey};
pub use listener::Listener;
