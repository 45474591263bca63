//! # tsu-validate
//!
//! Schema validation for the request fields a handler trusts: `body`,
//! `headers` and `query`. Declare a schema per field, and the handler only
//! runs once every declared field has passed.
//!
//! ## The contract
//!
//! - Fields are checked in a fixed order, body → headers → query, and the
//!   first failure stops the request.
//! - A declared field is mandatory. A route with a body schema rejects a
//!   request without a body.
//! - Validated values replace the raw ones: a query `?age=42` validated
//!   against `{"type":"integer"}` reaches the handler as `42`. Turn this off
//!   with [`ValidationOptions::convert`].
//! - A failure is answered by the failure callback, `400 Bad Request` with
//!   no body unless configured otherwise.
//! - An engine failure that is not a validation failure is an [`Error`],
//!   never a silent 400.
//!
//! What this crate does not do: run an HTTP server, or define a schema
//! language. Serve [`Router::dispatch`] from any server; bring schemas from
//! [`JsonSchema`] or any engine implementing [`Schema`].
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use http::{Method, StatusCode};
//! use serde_json::json;
//! use tsu_validate::{Chain, JsonSchema, Request, Response, Router, Schemas, validate};
//!
//! # fn main() -> Result<(), tsu_validate::Error> {
//! let validation = validate(None);
//!
//! let new_user = Schemas::new().body(JsonSchema::new(json!({
//!     "type": "object",
//!     "properties": {
//!         "age":  { "type": "number", "minimum": 18 },
//!         "name": { "type": "string" }
//!     },
//!     "required": ["name"]
//! }))?);
//!
//! let paging = Schemas::new().query(JsonSchema::new(json!({
//!     "type": "object",
//!     "properties": { "page": { "type": "integer", "minimum": 1 } }
//! }))?);
//!
//! let app = Router::new()
//!     // the interceptor wraps the handler
//!     .on(Method::POST, "/users", validation.bind_with(new_user, create_user))
//!     // or runs as one link of a chain
//!     .on(Method::GET, "/users", Chain::new().with(validation.bind(paging)).then(list_users));
//! # let _ = app;
//! # Ok(())
//! # }
//!
//! async fn create_user(req: Request) -> Response {
//!     Response::builder()
//!         .status(StatusCode::CREATED)
//!         .json_value(req.body())
//! }
//!
//! async fn list_users(req: Request) -> Response {
//!     // `page` arrives as a number once validated
//!     Response::builder().json_value(req.query())
//! }
//! ```

mod error;
mod handler;
mod json_schema;
mod request;
mod response;
mod router;

pub mod middleware;
pub mod schema;

pub use error::{BoxError, Error};
pub use handler::Handler;
pub use json_schema::JsonSchema;
pub use middleware::validate::{Binder, Config, Field, Interceptor, Schemas, validate};
pub use middleware::{Chain, Middleware, Next};
pub use request::Request;
pub use response::{IntoResponse, Response, ResponseBuilder};
pub use router::Router;
pub use schema::{Schema, SchemaError, ValidationError, ValidationOptions};
