//! Middleware layer.
//!
//! A middleware sees the request before the endpoint does and decides
//! whether the chain goes on:
//!
//! ```text
//! async fn name(req: Request, next: Next) -> impl IntoResponse
//! ```
//!
//! Calling [`Next::run`] hands the request to the next link. Returning
//! without calling it stops the chain. When the last middleware calls
//! `next`, the chain's endpoint runs, or `404 Not Found` is sent if the
//! chain has none.
//!
//! ```rust,no_run
//! # use http::Method;
//! # use tsu_validate::{Request, Router, Schemas, validate};
//! # async fn create_user(_: Request) -> &'static str { "created" }
//! use tsu_validate::middleware::{Chain, Next, from_fn};
//!
//! let validation = validate(None);
//! let route = Chain::new()
//!     .with(from_fn(|req: Request, next: Next| next.run(req)))
//!     .with(validation.bind(Schemas::new()))
//!     .then(create_user);
//! let router = Router::new().on(Method::POST, "/users", route);
//! # let _ = router;
//! ```
//!
//! Built-in middleware:
//! - [`validate`] — schema validation of body, headers and query

pub mod validate;

use std::future::Future;
use std::sync::Arc;

use http::StatusCode;
use tracing::trace;

use crate::handler::{BoxFuture, BoxedHandler, ErasedHandler, Handler, private};
use crate::request::Request;
use crate::response::{IntoResponse, Response};

#[doc(hidden)]
pub trait ErasedMiddleware {
    fn call(&self, req: Request, next: Next) -> BoxFuture;
}

#[doc(hidden)]
pub type BoxedMiddleware = Arc<dyn ErasedMiddleware + Send + Sync + 'static>;

/// Implemented for every valid middleware.
///
/// Satisfied by any `Fn(Request, Next) -> impl Future<Output = impl IntoResponse>`
/// and by the validating [`Interceptor`](validate::Interceptor).
pub trait Middleware: private::Sealed + Send + Sync + 'static {
    #[doc(hidden)]
    fn into_boxed_middleware(self) -> BoxedMiddleware;
}

impl<F, Fut, R> private::Sealed for MiddlewareFn<F>
where
    F: Fn(Request, Next) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
}

impl<F, Fut, R> Middleware for MiddlewareFn<F>
where
    F: Fn(Request, Next) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
    fn into_boxed_middleware(self) -> BoxedMiddleware {
        Arc::new(self)
    }
}

/// Adapts a `(Request, Next)` closure into a [`Middleware`].
///
/// A wrapper is needed because a bare closure would collide with the
/// `Handler` blanket impl's sealing trait.
pub fn from_fn<F, Fut, R>(f: F) -> MiddlewareFn<F>
where
    F: Fn(Request, Next) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
    MiddlewareFn(f)
}

/// A closure middleware. See [`from_fn`].
pub struct MiddlewareFn<F>(F);

impl<F, Fut, R> ErasedMiddleware for MiddlewareFn<F>
where
    F: Fn(Request, Next) -> Fut + Send + Sync,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
    fn call(&self, req: Request, next: Next) -> BoxFuture {
        let fut = (self.0)(req, next);
        Box::pin(async move { fut.await.into_response() })
    }
}

// ── Next ──────────────────────────────────────────────────────────────────────

/// The continuation handed to a middleware: "proceed to the next link".
pub struct Next {
    links: Arc<[BoxedMiddleware]>,
    index: usize,
    endpoint: Option<BoxedHandler>,
}

impl Next {
    /// Runs the rest of the chain.
    pub async fn run(self, req: Request) -> Response {
        match self.links.get(self.index) {
            Some(link) => {
                let link = Arc::clone(link);
                let next = Next { index: self.index + 1, ..self };
                link.call(req, next).await
            }
            None => match self.endpoint {
                Some(endpoint) => endpoint.call(req).await,
                None => {
                    trace!("end of chain without endpoint");
                    Response::status(StatusCode::NOT_FOUND)
                }
            },
        }
    }
}

// ── Chain ─────────────────────────────────────────────────────────────────────

/// An ordered list of middleware with an optional endpoint.
///
/// A `Chain` is itself a [`Handler`], so it registers on the router like any
/// other route handler.
pub struct Chain {
    links: Vec<BoxedMiddleware>,
    endpoint: Option<BoxedHandler>,
}

impl Chain {
    pub fn new() -> Self {
        Self { links: Vec::new(), endpoint: None }
    }

    /// Appends a middleware. Returns `self` for chaining.
    pub fn with(mut self, middleware: impl Middleware) -> Self {
        self.links.push(middleware.into_boxed_middleware());
        self
    }

    /// Sets the endpoint that runs after the last middleware.
    pub fn then(mut self, handler: impl Handler) -> Self {
        self.endpoint = Some(handler.into_boxed_handler());
        self
    }
}

impl Default for Chain {
    fn default() -> Self { Self::new() }
}

struct ChainHandler {
    links: Arc<[BoxedMiddleware]>,
    endpoint: Option<BoxedHandler>,
}

impl ErasedHandler for ChainHandler {
    fn call(&self, req: Request) -> BoxFuture {
        let next = Next {
            links: Arc::clone(&self.links),
            index: 0,
            endpoint: self.endpoint.clone(),
        };
        Box::pin(next.run(req))
    }
}

impl private::Sealed for Chain {}

impl Handler for Chain {
    fn into_boxed_handler(self) -> BoxedHandler {
        Arc::new(ChainHandler { links: self.links.into(), endpoint: self.endpoint })
    }
}
