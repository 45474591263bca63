//! Radix-tree request router.
//!
//! One tree per HTTP method. O(path-length) lookup. You register a path, you
//! get a handler; a validating interceptor or a middleware chain is just
//! another handler.

use std::collections::HashMap;
use std::sync::Arc;

use bytes::Bytes;
use http::{Method, StatusCode};
use matchit::Router as MatchitRouter;
use tracing::debug;

use crate::handler::{BoxedHandler, ErasedHandler, Handler};
use crate::request::Request;
use crate::response::Response;

/// The application router.
///
/// Build it once at startup and hand [`Router::dispatch`] to whatever server
/// the application runs. Each [`Router::on`] call returns `self` so
/// registrations chain naturally.
pub struct Router {
    routes: HashMap<Method, MatchitRouter<BoxedHandler>>,
}

impl Router {
    pub fn new() -> Self {
        Self { routes: HashMap::new() }
    }

    /// Register a handler for a method + path pair. Returns `self` for chaining.
    ///
    /// Path parameters use `{name}` syntax — `req.param("name")` retrieves them.
    ///
    /// # Panics
    ///
    /// Panics if `path` is not a valid route or conflicts with one already
    /// registered for `method`.
    pub fn on(mut self, method: Method, path: &str, handler: impl Handler) -> Self {
        self.routes
            .entry(method)
            .or_default()
            .insert(path, handler.into_boxed_handler())
            .unwrap_or_else(|e| panic!("invalid route `{path}`: {e}"));
        self
    }

    /// Routes one buffered request and produces one response.
    ///
    /// Unmatched method/path pairs are answered with `404 Not Found`.
    pub async fn dispatch(&self, req: http::Request<Bytes>) -> http::Response<Bytes> {
        let method = req.method().clone();
        let path = req.uri().path().to_owned();

        let response = match self.lookup(&method, &path) {
            Some((handler, params)) => {
                handler.call(Request::from_http(req).with_params(params)).await
            }
            None => Response::status(StatusCode::NOT_FOUND),
        };

        debug!(%method, path = %path, status = response.status_code().as_u16(), "dispatched");
        response.into_http()
    }

    fn lookup(
        &self,
        method: &Method,
        path: &str,
    ) -> Option<(BoxedHandler, HashMap<String, String>)> {
        let tree = self.routes.get(method)?;
        let matched = tree.at(path).ok()?;
        let handler = Arc::clone(matched.value);
        let params = matched.params.iter()
            .map(|(k, v)| (k.to_owned(), v.to_owned()))
            .collect();
        Some((handler, params))
    }
}

impl Default for Router {
    fn default() -> Self { Self::new() }
}
