//! Users
//!
//! Tracks logged-in users from [`LoginEvent`]s and serves `/profile`.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use hive_core::{BindError, Base, Binder, Component, Context, Logger, Reference, Refs};
use hive_event::{DispatchExt, EventDispatcher};
use parking_lot::RwLock;
use serde::Deserialize;

use crate::auth::LoginEvent;
use crate::httpserver::{HttpRequest, HttpResponse, HttpRouter, HttpRouterExt};

pub const NAME: &str = "users";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct UsersOptions {
    /// Logged-in user count above which a warning is logged
    pub max_users: usize,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UsersRefs {
    #[serde(rename = "HTTPServer")]
    pub http_server: Reference<dyn HttpRouter>,

    #[serde(rename = "EventSystem")]
    pub event_system: Reference<dyn EventDispatcher>,
}

impl Refs for UsersRefs {
    fn bind(&self, binder: &mut Binder<'_>) -> Result<(), BindError> {
        binder.bind("HTTPServer", &self.http_server)?;
        binder.bind("EventSystem", &self.event_system)
    }
}

type Sessions = Arc<RwLock<HashSet<String>>>;

pub struct Users {
    base: Base<UsersOptions, UsersRefs>,
    logged_in: Sessions,
}

impl Users {
    pub fn new(base: Base<UsersOptions, UsersRefs>) -> Self {
        Self {
            base,
            logged_in: Sessions::default(),
        }
    }
}

fn record_login(sessions: &Sessions, logger: &Logger, max_users: usize, event: &LoginEvent) {
    logger.info(format_args!("User logged in: {}", event.username));
    let count = {
        let mut sessions = sessions.write();
        sessions.insert(event.username.clone());
        sessions.len()
    };
    if count > max_users {
        logger.warn(format_args!("Too many users logged in ({count} > {max_users})"));
    }
}

fn profile(sessions: &Sessions, request: &HttpRequest) -> HttpResponse {
    let Some(username) = request.param("username") else {
        return HttpResponse::bad_request("Username is required");
    };
    if sessions.read().contains(username) {
        HttpResponse::ok(format!("Profile for user: {username}"))
    } else {
        HttpResponse::unauthorized("User not logged in")
    }
}

#[async_trait]
impl Component for Users {
    type Options = UsersOptions;
    type Refs = UsersRefs;

    fn base(&self) -> &Base<UsersOptions, UsersRefs> {
        &self.base
    }

    async fn init(&self, _ctx: &Context) -> anyhow::Result<()> {
        self.logged_in.write().clear();
        Ok(())
    }

    async fn start(&self, _ctx: &Context) -> anyhow::Result<()> {
        let logger = self.base.logger().clone();
        logger.info("Starting Users component");
        let refs = self.base.refs();

        let sessions = self.logged_in.clone();
        refs.http_server.get()?.handle_func("/profile", move |request| {
            let response = profile(&sessions, &request);
            async move { response }
        });

        let sessions = self.logged_in.clone();
        let max_users = self.base.options().max_users;
        refs.event_system
            .get()?
            .listen(move |_ctx: Context, event: Arc<LoginEvent>| {
                record_login(&sessions, &logger, max_users, &event);
                async { Ok::<(), anyhow::Error>(()) }
            })?;
        Ok(())
    }
}
