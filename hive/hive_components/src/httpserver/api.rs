//! The `HttpRouter` capability and the request/response types handlers see.

use std::collections::HashMap;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt};
use hive_core::Capability;

/// A request as seen by a route handler.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: String,
    pub path: String,

    /// Decoded query string parameters
    pub query: HashMap<String, String>,

    /// Fields of an `application/x-www-form-urlencoded` body
    pub form: HashMap<String, String>,
}

impl HttpRequest {
    /// A form field or query parameter, treating an empty value as absent.
    /// Body fields shadow query parameters of the same name.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.form
            .get(name)
            .or_else(|| self.query.get(name))
            .map(String::as_str)
            .filter(|value| !value.is_empty())
    }
}

/// Status and plain-text body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn ok(body: impl Into<String>) -> Self {
        Self::new(200, body)
    }

    pub fn bad_request(body: impl Into<String>) -> Self {
        Self::new(400, body)
    }

    pub fn unauthorized(body: impl Into<String>) -> Self {
        Self::new(401, body)
    }

    pub fn not_found() -> Self {
        Self::new(404, "404 page not found")
    }

    pub fn internal_error(body: impl Into<String>) -> Self {
        Self::new(500, body)
    }
}

/// A type-erased route handler.
pub type Handler = Arc<dyn Fn(HttpRequest) -> BoxFuture<'static, HttpResponse> + Send + Sync>;

/// Capability exported by components that route HTTP requests.
///
/// A pattern ending in `/` matches every path below it; any other pattern
/// matches its path exactly. Handlers may be added while the server is
/// already serving.
pub trait HttpRouter: Send + Sync {
    /// Register `handler` under `pattern`, replacing any previous one.
    fn handle(&self, pattern: &str, handler: Handler);

    /// Address the server is listening on, once started.
    fn local_addr(&self) -> Option<SocketAddr>;
}

impl Capability for dyn HttpRouter {
    const NAME: &'static str = "hive.http.router";
}

/// Typed helpers over any [`HttpRouter`].
pub trait HttpRouterExt: HttpRouter {
    /// Register an async function as a handler.
    fn handle_func<F, Fut>(&self, pattern: &str, handler: F)
    where
        F: Fn(HttpRequest) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HttpResponse> + Send + 'static,
    {
        self.handle(pattern, Arc::new(move |request| handler(request).boxed()));
    }
}

impl<T: HttpRouter + ?Sized> HttpRouterExt for T {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_param_is_absent() {
        let request = HttpRequest {
            query: HashMap::from([
                ("username".to_string(), "bob".to_string()),
                ("empty".to_string(), String::new()),
            ]),
            ..Default::default()
        };
        assert_eq!(request.param("username"), Some("bob"));
        assert_eq!(request.param("empty"), None);
        assert_eq!(request.param("missing"), None);
    }

    #[test]
    fn test_form_field_shadows_query() {
        let request = HttpRequest {
            query: HashMap::from([
                ("username".to_string(), "query".to_string()),
                ("page".to_string(), "2".to_string()),
            ]),
            form: HashMap::from([("username".to_string(), "form".to_string())]),
            ..Default::default()
        };
        assert_eq!(request.param("username"), Some("form"));
        assert_eq!(request.param("page"), Some("2"));
    }
}
