//! # Hive Components
//!
//! Demo components for the Hive runtime:
//!
//! - **logger**: installs the `tracing` subscriber.
//! - **eventsystem**: exports an event dispatcher.
//! - **httpserver**: serves routes registered by other components.
//! - **auth**: `/login`, announcing each login as an event.
//! - **users**: `/profile`, fed by login events.
//! - **blockexit**: blocks until Ctrl-C or a stop request.

pub mod auth;
pub mod blockexit;
pub mod eventsystem;
pub mod httpserver;
pub mod logger;
pub mod users;

use hive_runtime::{Registry, RegistryError};

/// Register every demo component under its name.
pub fn register_all(registry: &Registry) -> Result<(), RegistryError> {
    registry.register(logger::NAME, logger::LoggerComponent::new)?;
    registry.register(eventsystem::NAME, eventsystem::EventSystem::new)?;
    registry.register(httpserver::NAME, httpserver::HttpServer::new)?;
    registry.register(auth::NAME, auth::Auth::new)?;
    registry.register(users::NAME, users::Users::new)?;
    registry.register(blockexit::NAME, blockexit::BlockExit::new)?;
    Ok(())
}
