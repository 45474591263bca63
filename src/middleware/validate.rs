//! Schema validation of request fields before a handler runs.
//!
//! Three stages:
//!
//! 1. [`validate`] resolves an optional [`Config`] into a [`Binder`]. This
//!    happens once, at startup.
//! 2. [`Binder::bind`] / [`Binder::bind_with`] capture a route's [`Schemas`]
//!    (and optionally its handler) into an [`Interceptor`].
//! 3. The [`Interceptor`] runs per request: it validates `body`, `headers`
//!    and `query` in that order, stops at the first failure, writes the
//!    normalized values back onto the request and moves on.
//!
//! ```rust,no_run
//! # use http::Method;
//! # use serde_json::json;
//! # use tsu_validate::{Chain, JsonSchema, Request, Router, Schemas, validate};
//! # async fn create_user(_: Request) -> &'static str { "created" }
//! # async fn list_users(_: Request) -> &'static str { "[]" }
//! # fn main() -> Result<(), tsu_validate::Error> {
//! let validation = validate(None);
//!
//! let user = JsonSchema::new(json!({
//!     "type": "object",
//!     "properties": { "name": { "type": "string" } },
//!     "required": ["name"]
//! }))?;
//! let paging = JsonSchema::new(json!({
//!     "type": "object",
//!     "properties": { "page": { "type": "integer" } }
//! }))?;
//!
//! let router = Router::new()
//!     // As the route handler itself.
//!     .on(Method::POST, "/users", validation.bind_with(Schemas::new().body(user), create_user))
//!     // As one link of a chain.
//!     .on(Method::GET, "/users", Chain::new().with(validation.bind(Schemas::new().query(paging))).then(list_users));
//! # let _ = router;
//! # Ok(())
//! # }
//! ```
//!
//! After the last declared field passes, the interceptor continues the chain
//! if it is running inside one, otherwise runs its own handler, otherwise
//! answers `404 Not Found`.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use http::header::{HeaderName, HeaderValue};
use http::{HeaderMap, StatusCode};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, trace};

use crate::error::Error;
use crate::handler::{BoxFuture, BoxedHandler, ErasedHandler, Handler, private};
use crate::middleware::{BoxedMiddleware, ErasedMiddleware, Middleware, Next};
use crate::request::Request;
use crate::response::{IntoResponse, Response};
use crate::schema::{Schema, SchemaError, ValidationError, ValidationOptions};

// ── Fields ────────────────────────────────────────────────────────────────────

/// A request field that can carry a schema.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Field {
    Body,
    Headers,
    Query,
}

impl Field {
    /// The order fields are validated in.
    pub const ORDER: [Field; 3] = [Field::Body, Field::Headers, Field::Query];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Body    => "body",
            Self::Headers => "headers",
            Self::Query   => "query",
        }
    }

    fn read(self, req: &Request) -> Value {
        match self {
            Self::Body    => req.body().clone(),
            Self::Headers => header_object(req.headers()),
            Self::Query   => req.query().clone(),
        }
    }

    fn write(self, req: &mut Request, value: Value) -> Result<(), Error> {
        match self {
            Self::Body    => req.set_body(value),
            Self::Headers => merge_headers(req.headers_mut(), value)?,
            Self::Query   => req.set_query(value),
        }
        Ok(())
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `{"content-type": "application/json", "accept": "a, b"}`. Repeated
/// headers are joined with `", "`; values that are not UTF-8 are skipped.
fn header_object(headers: &HeaderMap) -> Value {
    let mut map = Map::new();
    for name in headers.keys() {
        let values: Vec<&str> = headers
            .get_all(name)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .collect();
        if !values.is_empty() {
            map.insert(name.as_str().to_owned(), Value::String(values.join(", ")));
        }
    }
    Value::Object(map)
}

/// Applies a normalized header object onto `headers`.
///
/// Only names whose value differs from the [`header_object`] view are
/// rewritten: arrays become repeated headers, non-string scalars are rendered
/// as JSON text, `null` drops the header. Every other entry is kept as
/// received, including repeated headers and values that are not UTF-8.
fn merge_headers(headers: &mut HeaderMap, value: Value) -> Result<(), Error> {
    let Value::Object(map) = value else {
        return Err(Error::Header("headers must normalize to an object".to_owned()));
    };
    let seen = header_object(headers);

    let mut changed = Vec::new();
    for (name, value) in map {
        if seen.get(name.as_str()) == Some(&value) {
            continue;
        }
        let name = HeaderName::try_from(name.as_str())
            .map_err(|e| Error::Header(format!("{name}: {e}")))?;
        let values = match value {
            Value::Null => Vec::new(),
            Value::Array(values) => values,
            scalar => vec![scalar],
        };
        let values = values
            .into_iter()
            .map(|v| header_value(&name, v))
            .collect::<Result<Vec<_>, _>>()?;
        changed.push((name, values));
    }

    for (name, values) in changed {
        headers.remove(&name);
        for value in values {
            headers.append(name.clone(), value);
        }
    }
    Ok(())
}

fn header_value(name: &HeaderName, value: Value) -> Result<HeaderValue, Error> {
    let rendered = match value {
        Value::String(s) => s,
        other => other.to_string(),
    };
    HeaderValue::try_from(rendered).map_err(|e| Error::Header(format!("{name}: {e}")))
}

// ── Schemas ───────────────────────────────────────────────────────────────────

/// The schemas of one route, at most one per [`Field`].
///
/// Every schema is marked [`required`](Schema::required) as it is
/// registered: declaring a schema for a field makes the field mandatory.
#[derive(Default)]
pub struct Schemas {
    body: Option<Box<dyn Schema>>,
    headers: Option<Box<dyn Schema>>,
    query: Option<Box<dyn Schema>>,
}

impl Schemas {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn body(mut self, schema: impl Schema) -> Self {
        self.body = Some(Box::new(schema.required()));
        self
    }

    pub fn headers(mut self, schema: impl Schema) -> Self {
        self.headers = Some(Box::new(schema.required()));
        self
    }

    pub fn query(mut self, schema: impl Schema) -> Self {
        self.query = Some(Box::new(schema.required()));
        self
    }

    fn get(&self, field: Field) -> Option<&dyn Schema> {
        match field {
            Field::Body    => self.body.as_deref(),
            Field::Headers => self.headers.as_deref(),
            Field::Query   => self.query.as_deref(),
        }
    }
}

// ── Config ────────────────────────────────────────────────────────────────────

type FailureFn = Arc<dyn Fn(Request, ValidationError) -> BoxFuture + Send + Sync + 'static>;

/// Factory configuration. Every option falls back to a default.
///
/// ```rust,no_run
/// # use http::StatusCode;
/// # use tsu_validate::{Config, Response, ValidationError, ValidationOptions, validate};
/// let validation = validate(Some(
///     Config::new()
///         .on_validation_error(|_req, err: ValidationError| async move {
///             Response::builder().status(StatusCode::UNPROCESSABLE_ENTITY).json_value(&err)
///         })
///         .validation_options(ValidationOptions { convert: false }),
/// ));
/// ```
#[derive(Default)]
pub struct Config {
    on_validation_error: Option<FailureFn>,
    validation_options: Option<ValidationOptions>,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the default failure response (`400 Bad Request`, no body).
    /// Whatever the callback returns is sent as-is.
    pub fn on_validation_error<F, Fut, R>(mut self, callback: F) -> Self
    where
        F: Fn(Request, ValidationError) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: IntoResponse + Send + 'static,
    {
        self.on_validation_error = Some(Arc::new(move |req: Request, err: ValidationError| -> BoxFuture {
            let fut = callback(req, err);
            Box::pin(async move { fut.await.into_response() })
        }));
        self
    }

    pub fn validation_options(mut self, options: ValidationOptions) -> Self {
        self.validation_options = Some(options);
        self
    }

    fn resolve(self) -> Resolved {
        Resolved {
            on_failure: self.on_validation_error.unwrap_or_else(|| Arc::new(bad_request) as FailureFn),
            options: self.validation_options.unwrap_or_default(),
        }
    }
}

/// The configuration with every default filled in.
struct Resolved {
    on_failure: FailureFn,
    options: ValidationOptions,
}

fn bad_request(_req: Request, _err: ValidationError) -> BoxFuture {
    Box::pin(async { Response::status(StatusCode::BAD_REQUEST) })
}

// ── Factory and binder ────────────────────────────────────────────────────────

/// Creates a [`Binder`]. `None` uses every default: coercion on, and a bare
/// `400 Bad Request` on failure.
pub fn validate(config: Option<Config>) -> Binder {
    Binder { resolved: Arc::new(config.unwrap_or_default().resolve()) }
}

/// Binds route schemas to the resolved configuration. Cheap to clone.
#[derive(Clone)]
pub struct Binder {
    resolved: Arc<Resolved>,
}

impl Binder {
    /// An interceptor with no handler of its own, for use inside a chain.
    pub fn bind(&self, schemas: Schemas) -> Interceptor {
        self.interceptor(schemas, None)
    }

    /// An interceptor that runs `handler` once validation passes.
    pub fn bind_with(&self, schemas: Schemas, handler: impl Handler) -> Interceptor {
        self.interceptor(schemas, Some(handler.into_boxed_handler()))
    }

    fn interceptor(&self, schemas: Schemas, handler: Option<BoxedHandler>) -> Interceptor {
        Interceptor {
            inner: Arc::new(Inner {
                resolved: Arc::clone(&self.resolved),
                schemas,
                handler,
            }),
        }
    }
}

// ── Interceptor ───────────────────────────────────────────────────────────────

/// A route's validating interceptor.
///
/// Registers as a [`Handler`] or as a [`Middleware`]. Can also be called
/// directly with [`call`](Interceptor::call) and
/// [`call_with_next`](Interceptor::call_with_next), which surface engine
/// failures as [`Error`] instead of a 500.
#[derive(Clone)]
pub struct Interceptor {
    inner: Arc<Inner>,
}

struct Inner {
    resolved: Arc<Resolved>,
    schemas: Schemas,
    handler: Option<BoxedHandler>,
}

/// What runs once every declared field has passed.
enum NextStep {
    Continue(Next),
    Invoke(BoxedHandler),
    NotFound,
}

impl Interceptor {
    /// Runs as a standalone handler: no continuation.
    pub async fn call(&self, req: Request) -> Result<Response, Error> {
        self.run(req, None).await
    }

    /// Runs as a chain link: `next` takes precedence over the own handler.
    pub async fn call_with_next(&self, req: Request, next: Next) -> Result<Response, Error> {
        self.run(req, Some(next)).await
    }

    async fn run(&self, mut req: Request, next: Option<Next>) -> Result<Response, Error> {
        let inner = &*self.inner;
        let options = &inner.resolved.options;

        let mut checked = Vec::with_capacity(Field::ORDER.len());
        for field in Field::ORDER {
            let Some(schema) = inner.schemas.get(field) else { continue };

            let outcome = schema.validate(&field.read(&req), options);
            match outcome {
                Ok(value) => checked.push((field, value)),
                Err(SchemaError::Invalid(err)) => {
                    let err = err.in_field(field);
                    debug!(%field, error = %err.message, "request failed validation");
                    return Ok((inner.resolved.on_failure)(req, err).await);
                }
                Err(SchemaError::Engine(source)) => return Err(Error::Engine { field, source }),
            }
        }

        if options.convert {
            for (field, value) in checked {
                field.write(&mut req, value)?;
            }
        }

        let step = match (next, &inner.handler) {
            (Some(next), _) => NextStep::Continue(next),
            (None, Some(handler)) => NextStep::Invoke(Arc::clone(handler)),
            (None, None) => NextStep::NotFound,
        };

        Ok(match step {
            NextStep::Continue(next) => {
                trace!("validation passed, continuing chain");
                next.run(req).await
            }
            NextStep::Invoke(handler) => {
                trace!("validation passed, invoking handler");
                handler.call(req).await
            }
            NextStep::NotFound => {
                trace!("validation passed, nothing to run");
                Response::status(StatusCode::NOT_FOUND)
            }
        })
    }
}

impl private::Sealed for Interceptor {}

impl ErasedHandler for Interceptor {
    fn call(&self, req: Request) -> BoxFuture {
        let this = self.clone();
        Box::pin(async move { this.run(req, None).await.into_response() })
    }
}

impl Handler for Interceptor {
    fn into_boxed_handler(self) -> BoxedHandler {
        Arc::new(self)
    }
}

impl ErasedMiddleware for Interceptor {
    fn call(&self, req: Request, next: Next) -> BoxFuture {
        let this = self.clone();
        Box::pin(async move { this.run(req, Some(next)).await.into_response() })
    }
}

impl Middleware for Interceptor {
    fn into_boxed_middleware(self) -> BoxedMiddleware {
        Arc::new(self)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use bytes::Bytes;
    use http::Method;
    use http::header::CONTENT_TYPE;
    use serde_json::json;

    use super::*;
    use crate::middleware::Chain;
    use crate::schema::{self, ValidationOptions};

    fn request(uri: &str, body: Option<&'static str>) -> Request {
        let mut builder = http::Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header("x-page", "5");
        if body.is_some() {
            builder = builder.header(CONTENT_TYPE, "application/json");
        }
        let body = body.map(|b| Bytes::from_static(b.as_bytes())).unwrap_or_default();
        Request::from_http(builder.body(body).unwrap())
    }

    fn accept() -> impl Schema {
        schema::from_fn(|value, _| Ok(value.clone()))
    }

    fn reject(message: &'static str) -> impl Schema {
        schema::from_fn(move |_, _| Err(SchemaError::invalid(message)))
    }

    /// Turns `{"n":"1"}` into `{"n":1}` when converting.
    fn numbers() -> impl Schema {
        schema::from_fn(|value, opts| {
            let Some(map) = value.as_object() else {
                return Err(SchemaError::invalid("expected an object"));
            };
            if !opts.convert {
                return Ok(value.clone());
            }
            let converted = map
                .iter()
                .map(|(k, v)| {
                    let v = v.as_str().and_then(|s| s.parse::<i64>().ok()).map_or_else(|| v.clone(), Value::from);
                    (k.clone(), v)
                })
                .collect();
            Ok(Value::Object(converted))
        })
    }

    async fn echo(req: Request) -> Response {
        Response::builder().json_value(&json!({ "body": req.body(), "query": req.query() }))
    }

    fn body_json(res: &Response) -> Value {
        serde_json::from_slice(res.body()).unwrap()
    }

    #[tokio::test]
    async fn empty_schemas_reach_the_handler() {
        let interceptor = validate(None).bind_with(Schemas::new(), echo);
        let res = interceptor.call(request("/?a=b", Some("[1]"))).await.unwrap();
        assert_eq!(res.status_code(), StatusCode::OK);
        assert_eq!(body_json(&res), json!({ "body": [1], "query": { "a": "b" } }));
    }

    #[tokio::test]
    async fn nothing_to_run_is_404() {
        let interceptor = validate(None).bind(Schemas::new());
        let res = interceptor.call(request("/", None)).await.unwrap();
        assert_eq!(res.status_code(), StatusCode::NOT_FOUND);
        assert!(res.body().is_empty());
    }

    #[tokio::test]
    async fn default_failure_is_bare_400() {
        let interceptor = validate(None).bind_with(Schemas::new().query(reject("nope")), echo);
        let res = interceptor.call(request("/", None)).await.unwrap();
        assert_eq!(res.status_code(), StatusCode::BAD_REQUEST);
        assert!(res.body().is_empty());
    }

    #[tokio::test]
    async fn declared_body_is_mandatory() {
        let interceptor = validate(None).bind_with(Schemas::new().body(accept()), echo);

        let res = interceptor.call(request("/", None)).await.unwrap();
        assert_eq!(res.status_code(), StatusCode::BAD_REQUEST);

        let res = interceptor.call(request("/", Some("{}"))).await.unwrap();
        assert_eq!(res.status_code(), StatusCode::OK);
    }

    #[tokio::test]
    async fn first_failing_field_wins_and_later_fields_are_skipped() {
        let errors = Arc::new(Mutex::new(Vec::new()));
        let query_calls = Arc::new(AtomicUsize::new(0));

        let recorded = Arc::clone(&errors);
        let config = Config::new().on_validation_error(move |_req, err: ValidationError| {
            recorded.lock().unwrap().push(err);
            async { StatusCode::BAD_REQUEST }
        });

        let calls = Arc::clone(&query_calls);
        let query = schema::from_fn(move |value, _| {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(value.clone())
        });

        let schemas = Schemas::new()
            .query(query)
            .headers(reject("bad headers"))
            .body(reject("bad body"));
        let interceptor = validate(Some(config)).bind_with(schemas, echo);

        let res = interceptor.call(request("/", Some("{}"))).await.unwrap();
        assert_eq!(res.status_code(), StatusCode::BAD_REQUEST);

        let errors = errors.lock().unwrap();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, Some(Field::Body));
        assert_eq!(errors[0].message, "bad body");
        assert_eq!(query_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn headers_are_checked_before_query() {
        let config = Config::new().on_validation_error(|_req, err: ValidationError| async move {
            Response::builder().status(StatusCode::UNPROCESSABLE_ENTITY).json_value(&err)
        });
        let schemas = Schemas::new().query(reject("bad query")).headers(reject("bad headers"));
        let interceptor = validate(Some(config)).bind_with(schemas, echo);

        let res = interceptor.call(request("/", None)).await.unwrap();
        assert_eq!(res.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body_json(&res), json!({ "field": "headers", "message": "bad headers" }));
    }

    #[tokio::test]
    async fn converted_values_replace_request_fields() {
        let schemas = Schemas::new().query(numbers()).body(numbers());
        let interceptor = validate(None).bind_with(schemas, echo);

        let res = interceptor.call(request("/?n=42&s=x", Some(r#"{"age":"23"}"#))).await.unwrap();
        assert_eq!(body_json(&res), json!({ "body": { "age": 23 }, "query": { "n": 42, "s": "x" } }));
    }

    #[tokio::test]
    async fn convert_disabled_leaves_request_untouched() {
        let config = Config::new().validation_options(ValidationOptions { convert: false });
        let interceptor = validate(Some(config)).bind_with(Schemas::new().query(numbers()), echo);

        let res = interceptor.call(request("/?n=42", None)).await.unwrap();
        assert_eq!(body_json(&res), json!({ "body": null, "query": { "n": "42" } }));
    }

    #[tokio::test]
    async fn unchecked_fields_are_not_rewritten() {
        let upper = schema::from_fn(|_, _| Ok(json!({ "replaced": true })));
        let interceptor = validate(None).bind_with(Schemas::new().body(upper), echo);

        let res = interceptor.call(request("/?n=42", Some("{}"))).await.unwrap();
        assert_eq!(body_json(&res), json!({ "body": { "replaced": true }, "query": { "n": "42" } }));
    }

    #[tokio::test]
    async fn nothing_is_rewritten_when_a_later_field_fails() {
        let seen = Arc::new(Mutex::new(None));
        let recorded = Arc::clone(&seen);
        let config = Config::new().on_validation_error(move |req: Request, _err| {
            *recorded.lock().unwrap() = Some(req.body().clone());
            async { StatusCode::BAD_REQUEST }
        });
        let schemas = Schemas::new()
            .body(schema::from_fn(|_, _| Ok(json!("rewritten"))))
            .query(reject("bad query"));
        let interceptor = validate(Some(config)).bind_with(schemas, echo);

        interceptor.call(request("/", Some("{}"))).await.unwrap();
        assert_eq!(*seen.lock().unwrap(), Some(json!({})));
    }

    #[tokio::test]
    async fn header_values_are_written_back_as_strings() {
        let headers = schema::from_fn(|value, _| {
            let mut value = value.clone();
            value["x-page"] = json!(5);
            value["x-tags"] = json!(["a", "b"]);
            Ok(value)
        });
        let handler = |req: Request| async move {
            let tags: Vec<_> = req.headers().get_all("x-tags").iter().collect();
            assert_eq!(tags, ["a", "b"]);
            req.header("x-page").unwrap_or_default().to_owned()
        };
        let interceptor = validate(None).bind_with(Schemas::new().headers(headers), handler);

        let res = interceptor.call(request("/", None)).await.unwrap();
        assert_eq!(res.body(), b"5");
    }

    #[tokio::test]
    async fn unrepresentable_headers_are_an_error() {
        let headers = schema::from_fn(|_, _| Ok(json!(["not", "an", "object"])));
        let interceptor = validate(None).bind_with(Schemas::new().headers(headers), echo);

        let err = interceptor.call(request("/", None)).await.unwrap_err();
        assert!(matches!(err, Error::Header(_)));
    }

    #[tokio::test]
    async fn engine_errors_propagate() {
        let failing = schema::from_fn(|_, _| Err(SchemaError::engine("engine exploded")));
        let failures = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&failures);
        let config = Config::new().on_validation_error(move |_req, _err| {
            counter.fetch_add(1, Ordering::SeqCst);
            async { StatusCode::BAD_REQUEST }
        });
        let interceptor = validate(Some(config)).bind_with(Schemas::new().query(failing), echo);

        let err = interceptor.call(request("/", None)).await.unwrap_err();
        match err {
            Error::Engine { field, source } => {
                assert_eq!(field, Field::Query);
                assert_eq!(source.to_string(), "engine exploded");
            }
            other => panic!("unexpected {other}"),
        }
        assert_eq!(failures.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn engine_errors_become_500_through_the_handler_interface() {
        let failing = schema::from_fn(|_, _| Err(SchemaError::engine("engine exploded")));
        let handler = validate(None).bind_with(Schemas::new().query(failing), echo).into_boxed_handler();

        let res = handler.call(request("/", None)).await;
        assert_eq!(res.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn continuation_wins_over_own_handler() {
        let own = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&own);
        let own_handler = move |_req: Request| {
            counter.fetch_add(1, Ordering::SeqCst);
            async { "own" }
        };

        let interceptor = validate(None).bind_with(Schemas::new().query(accept()), own_handler);
        let chain = Chain::new().with(interceptor).then(|_req: Request| async { "next" });

        let res = chain.into_boxed_handler().call(request("/", None)).await;
        assert_eq!(res.body(), b"next");
        assert_eq!(own.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn failure_stops_the_chain() {
        let interceptor = validate(None).bind(Schemas::new().query(reject("nope")));
        let chain = Chain::new().with(interceptor).then(|_req: Request| async { "next" });

        let res = chain.into_boxed_handler().call(request("/", None)).await;
        assert_eq!(res.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn header_object_joins_repeated_values() {
        let mut headers = HeaderMap::new();
        headers.append("accept", HeaderValue::from_static("a"));
        headers.append("accept", HeaderValue::from_static("b"));
        assert_eq!(header_object(&headers), json!({ "accept": "a, b" }));
    }

    #[tokio::test]
    async fn header_write_back_keeps_entries_the_schema_left_alone() {
        let mut req = request("/", None);
        let headers = req.headers_mut();
        headers.insert("x-bin", HeaderValue::from_bytes(b"caf\xe9").unwrap());
        headers.append("cookie", HeaderValue::from_static("a=1"));
        headers.append("cookie", HeaderValue::from_static("b=2"));

        let handler = |req: Request| async move {
            let bin = req.headers().get("x-bin").map(|v| v.as_bytes().to_vec());
            assert_eq!(bin.as_deref(), Some(&b"caf\xe9"[..]));
            let cookies: Vec<_> = req
                .headers()
                .get_all("cookie")
                .iter()
                .map(|v| v.to_str().unwrap_or("?"))
                .collect();
            cookies.join("|")
        };
        let interceptor = validate(None).bind_with(Schemas::new().headers(accept()), handler);

        let res = interceptor.call(req).await.unwrap();
        assert_eq!(res.body(), b"a=1|b=2");
    }

    #[tokio::test]
    async fn header_write_back_only_rewrites_changed_names() {
        let mut req = request("/", None);
        req.headers_mut().append("cookie", HeaderValue::from_static("a=1"));
        req.headers_mut().append("cookie", HeaderValue::from_static("b=2"));

        let headers = schema::from_fn(|value, _| {
            let mut value = value.clone();
            value["x-page"] = json!(6);
            value["x-gone"] = Value::Null;
            Ok(value)
        });
        let handler = |req: Request| async move {
            let cookies = req.headers().get_all("cookie").iter().count();
            format!("{} {cookies} {}", req.header("x-page").unwrap_or("-"), req.headers().contains_key("x-gone"))
        };
        let interceptor = validate(None).bind_with(Schemas::new().headers(headers), handler);

        let res = interceptor.call(req).await.unwrap();
        assert_eq!(res.body(), b"6 2 false");
    }
}
