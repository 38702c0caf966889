//! HTTP Server
//!
//! Serves the routes other components register through the
//! [`HttpRouter`] capability. Routes live in a shared table consulted on
//! every request, so they can be added before or after the listener starts.

pub mod api;

use std::collections::{BTreeMap, HashMap};
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{bail, Context as _};
use async_trait::async_trait;
use axum::extract::{FromRequest, Query, Request, State};
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderMap, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::{Form, Router};
use hive_core::{Base, Component, Context, Exports};
use parking_lot::{Mutex, RwLock};
use serde::Deserialize;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::Instrument;

pub use api::{Handler, HttpRequest, HttpResponse, HttpRouter, HttpRouterExt};

pub const NAME: &str = "httpserver";

const DEFAULT_ADDR: &str = "0.0.0.0:80";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct HttpServerOptions {
    /// `host:port`, or `:port` for every interface. Empty means port 80.
    pub addr: String,
}

/// Normalize a configured address into something `bind` accepts.
pub fn listen_addr(addr: &str) -> String {
    let addr = addr.trim();
    if addr.is_empty() {
        DEFAULT_ADDR.to_string()
    } else if addr.starts_with(':') {
        format!("0.0.0.0{addr}")
    } else {
        addr.to_string()
    }
}

/// Pattern to handler map.
#[derive(Default)]
pub struct RouteTable {
    routes: RwLock<BTreeMap<String, Handler>>,
}

impl RouteTable {
    pub fn insert(&self, pattern: &str, handler: Handler) {
        self.routes.write().insert(pattern.to_string(), handler);
    }

    /// Handler for `path`: an exact match first, then the longest subtree
    /// pattern containing it.
    pub fn find(&self, path: &str) -> Option<Handler> {
        let routes = self.routes.read();
        if let Some(handler) = routes.get(path) {
            return Some(handler.clone());
        }
        routes
            .iter()
            .filter(|(pattern, _)| pattern.ends_with('/') && path.starts_with(pattern.as_str()))
            .max_by_key(|(pattern, _)| pattern.len())
            .map(|(_, handler)| handler.clone())
    }

    pub fn patterns(&self) -> Vec<String> {
        self.routes.read().keys().cloned().collect()
    }
}

fn is_form(method: &Method, headers: &HeaderMap) -> bool {
    if method == Method::GET || method == Method::HEAD {
        return false;
    }
    headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("application/x-www-form-urlencoded"))
}

async fn route(State(table): State<Arc<RouteTable>>, request: Request) -> Response {
    let (parts, body) = request.into_parts();
    let Some(handler) = table.find(parts.uri.path()) else {
        return to_response(HttpResponse::not_found());
    };
    let query = match Query::<HashMap<String, String>>::try_from_uri(&parts.uri) {
        Ok(Query(query)) => query,
        Err(rejection) => return to_response(HttpResponse::bad_request(rejection.body_text())),
    };

    let method = parts.method.to_string();
    let path = parts.uri.path().to_string();
    let form = if is_form(&parts.method, &parts.headers) {
        let request = Request::from_parts(parts, body);
        match Form::<HashMap<String, String>>::from_request(request, &()).await {
            Ok(Form(form)) => form,
            Err(rejection) => {
                return to_response(HttpResponse::bad_request(rejection.body_text()))
            }
        }
    } else {
        HashMap::new()
    };

    let request = HttpRequest {
        method,
        path,
        query,
        form,
    };
    to_response(handler(request).await)
}

fn to_response(response: HttpResponse) -> Response {
    let status = StatusCode::from_u16(response.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, response.body).into_response()
}

/// The axum application serving `table`.
pub fn router(table: Arc<RouteTable>) -> Router {
    Router::new().fallback(route).with_state(table)
}

struct Serving {
    shutdown: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

pub struct HttpServer {
    base: Base<HttpServerOptions>,
    routes: Arc<RouteTable>,
    addr: Mutex<Option<String>>,
    local_addr: Mutex<Option<SocketAddr>>,
    serving: Mutex<Option<Serving>>,
}

impl HttpServer {
    pub fn new(base: Base<HttpServerOptions>) -> Self {
        Self {
            base,
            routes: Arc::new(RouteTable::default()),
            addr: Mutex::new(None),
            local_addr: Mutex::new(None),
            serving: Mutex::new(None),
        }
    }
}

impl HttpRouter for HttpServer {
    fn handle(&self, pattern: &str, handler: Handler) {
        self.base
            .logger()
            .debug(format_args!("route {pattern} registered"));
        self.routes.insert(pattern, handler);
    }

    fn local_addr(&self) -> Option<SocketAddr> {
        *self.local_addr.lock()
    }
}

#[async_trait]
impl Component for HttpServer {
    type Options = HttpServerOptions;
    type Refs = hive_core::NoRefs;

    fn base(&self) -> &Base<HttpServerOptions> {
        &self.base
    }

    fn export(this: &Arc<Self>, exports: &mut Exports) {
        exports.export::<dyn HttpRouter>(this.clone());
    }

    async fn init(&self, _ctx: &Context) -> anyhow::Result<()> {
        *self.addr.lock() = Some(listen_addr(&self.base.options().addr));
        Ok(())
    }

    async fn start(&self, _ctx: &Context) -> anyhow::Result<()> {
        let Some(addr) = self.addr.lock().clone() else {
            bail!("HTTP server started before init");
        };
        let listener = TcpListener::bind(&addr)
            .await
            .with_context(|| format!("failed to bind {addr}"))?;
        let local = listener.local_addr()?;
        *self.local_addr.lock() = Some(local);

        let logger = self.base.logger().clone();
        logger.info(format_args!("Starting HTTP server on {local}"));
        logger.debug(format_args!("routes: {}", self.routes.patterns().join(" ")));

        let app = router(self.routes.clone());
        let (shutdown, signal) = oneshot::channel::<()>();
        let span = logger.span().clone();
        let task = tokio::spawn(
            async move {
                let served = axum::serve(listener, app)
                    .with_graceful_shutdown(async {
                        let _ = signal.await;
                    })
                    .await;
                if let Err(err) = served {
                    logger.error(format_args!("HTTP server error: {err}"));
                }
            }
            .instrument(span),
        );

        *self.serving.lock() = Some(Serving { shutdown, task });
        Ok(())
    }

    async fn shutdown(&self, ctx: &Context) -> anyhow::Result<()> {
        let serving = self.serving.lock().take();
        let Some(Serving { shutdown, task }) = serving else {
            return Ok(());
        };

        self.base.logger().info("Shutting down HTTP server");
        let _ = shutdown.send(());
        let abort = task.abort_handle();
        match ctx.bounded(task).await {
            Ok(joined) => joined.context("HTTP server task failed")?,
            Err(deadline) => {
                abort.abort();
                return Err(deadline).context("HTTP server did not drain in time");
            }
        }

        *self.local_addr.lock() = None;
        Ok(())
    }
}
