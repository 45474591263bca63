//! The validation-engine seam.
//!
//! The interceptor never inspects a schema. It hands a request field (as a
//! [`serde_json::Value`]) to [`Schema::validate`] and gets back either the
//! normalized value or a [`SchemaError`]. Two engines ship with the crate:
//!
//! - [`JsonSchema`](crate::JsonSchema), backed by the `jsonschema` crate;
//! - any closure `Fn(&Value, &ValidationOptions) -> Result<Value, SchemaError>`,
//!   see [`from_fn`].

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::BoxError;
use crate::middleware::validate::Field;

// ── Options ───────────────────────────────────────────────────────────────────

/// Options passed to the engine on every validation.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ValidationOptions {
    /// Coerce values to the declared types (`"42"` → `42`) and write the
    /// normalized values back onto the request. Defaults to `true`.
    pub convert: bool,
}

impl Default for ValidationOptions {
    fn default() -> Self {
        Self { convert: true }
    }
}

// ── Errors ────────────────────────────────────────────────────────────────────

/// A value that did not satisfy its schema.
///
/// Serializes as `{"field":"body","message":"...","details":[...]}` so a
/// failure callback can echo it to the client as-is.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ValidationError {
    /// The request field that failed. Set by the interceptor.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<Field>,
    pub message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<String>,
}

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self { field: None, message: message.into(), details: Vec::new() }
    }

    pub fn with_details(mut self, details: Vec<String>) -> Self {
        self.details = details;
        self
    }

    pub(crate) fn in_field(mut self, field: Field) -> Self {
        self.field = Some(field);
        self
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.field {
            Some(field) => write!(f, "{field}: {}", self.message),
            None => f.write_str(&self.message),
        }
    }
}

impl std::error::Error for ValidationError {}

/// What an engine returns when it does not produce a normalized value.
#[derive(Debug)]
pub enum SchemaError {
    /// The value is invalid. Routed to the failure callback.
    Invalid(ValidationError),
    /// The engine itself failed. Propagated to the host unchanged.
    Engine(BoxError),
}

impl SchemaError {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid(ValidationError::new(message))
    }

    pub fn engine(err: impl Into<BoxError>) -> Self {
        Self::Engine(err.into())
    }
}

impl From<ValidationError> for SchemaError {
    fn from(e: ValidationError) -> Self {
        Self::Invalid(e)
    }
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Invalid(e) => write!(f, "invalid: {e}"),
            Self::Engine(e) => write!(f, "engine: {e}"),
        }
    }
}

impl std::error::Error for SchemaError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Invalid(e) => Some(e),
            Self::Engine(e) => Some(e.as_ref()),
        }
    }
}

// ── Schema ────────────────────────────────────────────────────────────────────

/// A validation engine's schema.
pub trait Schema: Send + Sync + 'static {
    /// Checks `value` and returns its normalized form.
    ///
    /// Engines that do not normalize return a clone of `value`. Engines must
    /// leave `value` as-is when `options.convert` is `false`.
    fn validate(&self, value: &Value, options: &ValidationOptions) -> Result<Value, SchemaError>;

    /// Marks the schema as required: an absent (`null`) value fails before
    /// the schema is consulted.
    fn required(self) -> Required<Self>
    where
        Self: Sized,
    {
        Required(self)
    }
}

/// A schema that rejects absent values. See [`Schema::required`].
pub struct Required<S>(S);

impl<S: Schema> Schema for Required<S> {
    fn validate(&self, value: &Value, options: &ValidationOptions) -> Result<Value, SchemaError> {
        if value.is_null() {
            return Err(SchemaError::invalid("value is required"));
        }
        self.0.validate(value, options)
    }
}

impl<F> Schema for F
where
    F: Fn(&Value, &ValidationOptions) -> Result<Value, SchemaError> + Send + Sync + 'static,
{
    fn validate(&self, value: &Value, options: &ValidationOptions) -> Result<Value, SchemaError> {
        self(value, options)
    }
}

/// Pins a closure to the [`Schema`] signature so its argument types infer.
///
/// ```rust
/// use tsu_validate::schema::{self, SchemaError};
///
/// let non_empty = schema::from_fn(|value, _opts| match value.as_str() {
///     Some(s) if !s.is_empty() => Ok(value.clone()),
///     _ => Err(SchemaError::invalid("expected a non-empty string")),
/// });
/// ```
pub fn from_fn<F>(f: F) -> F
where
    F: Fn(&Value, &ValidationOptions) -> Result<Value, SchemaError> + Send + Sync + 'static,
{
    f
}
