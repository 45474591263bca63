//! Unified error type.

use std::fmt;

use crate::middleware::validate::Field;

/// Boxed error produced by a validation engine.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The error type returned by tsu-validate's fallible operations.
///
/// A request that fails validation is not an `Error`: it is routed to the
/// failure callback and answered with a [`Response`](crate::Response). This
/// type surfaces what the interceptor cannot answer for itself.
#[derive(Debug)]
pub enum Error {
    /// The validation engine failed for a reason other than an invalid value.
    Engine { field: Field, source: BoxError },
    /// A schema document was rejected by the engine at construction time.
    InvalidSchema(String),
    /// A normalized header value could not be written back onto the request.
    Header(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Engine { field, source } => write!(f, "engine error while validating {field}: {source}"),
            Self::InvalidSchema(msg) => write!(f, "invalid schema: {msg}"),
            Self::Header(msg) => write!(f, "header write-back: {msg}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Engine { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}
