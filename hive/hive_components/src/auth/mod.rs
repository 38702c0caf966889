//! Auth
//!
//! Registers `/login` on the HTTP server. A successful login is announced
//! with a [`LoginEvent`] before the response is written, so listeners have
//! seen it by the time the client gets its reply.

pub mod api;

use std::sync::Arc;

use async_trait::async_trait;
use hive_core::{BindError, Binder, Base, Component, Context, Logger, Reference, Refs};
use hive_event::{DispatchExt, EventDispatcher};
use serde::Deserialize;

use crate::httpserver::{HttpRequest, HttpResponse, HttpRouter, HttpRouterExt};

pub use api::LoginEvent;

pub const NAME: &str = "auth";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct AuthOptions {
    pub secret: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuthRefs {
    #[serde(rename = "HTTPServer")]
    pub http_server: Reference<dyn HttpRouter>,

    #[serde(rename = "EventSystem")]
    pub event_system: Reference<dyn EventDispatcher>,
}

impl Refs for AuthRefs {
    fn bind(&self, binder: &mut Binder<'_>) -> Result<(), BindError> {
        binder.bind("HTTPServer", &self.http_server)?;
        binder.bind("EventSystem", &self.event_system)
    }
}

pub struct Auth {
    base: Base<AuthOptions, AuthRefs>,
}

impl Auth {
    pub fn new(base: Base<AuthOptions, AuthRefs>) -> Self {
        Self { base }
    }
}

async fn login(
    events: Arc<dyn EventDispatcher>,
    logger: Logger,
    request: HttpRequest,
) -> HttpResponse {
    let Some(username) = request.param("username") else {
        return HttpResponse::bad_request("Invalid username");
    };

    let event = LoginEvent {
        username: username.to_string(),
    };
    match events.dispatch(&Context::background(), event).await {
        Ok(()) => HttpResponse::ok("Login successful"),
        Err(err) => {
            logger.error(format_args!("login of {username} failed: {err}"));
            HttpResponse::internal_error("Login failed")
        }
    }
}

#[async_trait]
impl Component for Auth {
    type Options = AuthOptions;
    type Refs = AuthRefs;

    fn base(&self) -> &Base<AuthOptions, AuthRefs> {
        &self.base
    }

    async fn start(&self, _ctx: &Context) -> anyhow::Result<()> {
        let logger = self.base.logger().clone();
        logger.info("Starting Auth component");
        if self.base.options().secret.is_empty() {
            logger.warn("no secret configured");
        }

        let refs = self.base.refs();
        let events = refs.event_system.get()?.clone();
        refs.http_server.get()?.handle_func("/login", move |request| {
            login(events.clone(), logger.clone(), request)
        });
        Ok(())
    }
}
