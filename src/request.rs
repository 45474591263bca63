//! Incoming HTTP request type.
//!
//! The host hands over an `http::Request<Bytes>` whose body is already fully
//! buffered. [`Request::from_http`] decodes the two fields validation works on
//! beyond headers: the query string and the body. Both are kept as
//! [`serde_json::Value`]s so a validator can replace them with normalized
//! values in place.

use std::collections::HashMap;

use bytes::Bytes;
use http::header::CONTENT_TYPE;
use http::{HeaderMap, Method, Uri};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::debug;

/// An incoming HTTP request.
pub struct Request {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    raw_body: Bytes,
    body: Value,
    query: Value,
    params: HashMap<String, String>,
}

impl Request {
    /// Decodes a buffered `http` request.
    ///
    /// - query string → object; a repeated key becomes an array of strings
    /// - empty body → `null`
    /// - `application/json` and `application/*+json` → parsed JSON (malformed
    ///   JSON is kept as text)
    /// - `application/x-www-form-urlencoded` → object, like the query
    /// - anything else → the body as a UTF-8 (lossy) string
    pub fn from_http(req: http::Request<Bytes>) -> Self {
        let (parts, raw_body) = req.into_parts();
        let query = parse_pairs(parts.uri.query().unwrap_or(""));
        let body = parse_body(&parts.headers, &raw_body);
        Self {
            method: parts.method,
            uri: parts.uri,
            headers: parts.headers,
            raw_body,
            body,
            query,
            params: HashMap::new(),
        }
    }

    pub(crate) fn with_params(mut self, params: HashMap<String, String>) -> Self {
        self.params = params;
        self
    }

    pub fn method(&self) -> &Method { &self.method }
    pub fn uri(&self) -> &Uri { &self.uri }
    pub fn path(&self) -> &str { self.uri.path() }
    pub fn headers(&self) -> &HeaderMap { &self.headers }
    pub fn headers_mut(&mut self) -> &mut HeaderMap { &mut self.headers }

    /// The body bytes exactly as received.
    pub fn raw_body(&self) -> &[u8] { &self.raw_body }

    /// The decoded body; `null` when the request had none.
    pub fn body(&self) -> &Value { &self.body }

    /// The decoded query string, always an object unless a validator replaced it.
    pub fn query(&self) -> &Value { &self.query }

    /// Case-insensitive header lookup. Non-UTF-8 values read as absent.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn query_param(&self, key: &str) -> Option<&Value> {
        self.query.get(key)
    }

    /// Returns a named path parameter.
    ///
    /// For a route `/users/{id}`, `req.param("id")` on `/users/42` returns `Some("42")`.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    /// Deserializes the decoded body into `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        T::deserialize(&self.body)
    }

    pub fn set_body(&mut self, body: Value) { self.body = body; }
    pub fn set_query(&mut self, query: Value) { self.query = query; }
    pub fn set_headers(&mut self, headers: HeaderMap) { self.headers = headers; }
}

fn parse_body(headers: &HeaderMap, raw: &Bytes) -> Value {
    if raw.is_empty() {
        return Value::Null;
    }

    let content_type = headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.split(';').next().unwrap_or("").trim().to_ascii_lowercase())
        .unwrap_or_default();

    match content_type.as_str() {
        ct if is_json(ct) => serde_json::from_slice(raw).unwrap_or_else(|e| {
            debug!(error = %e, "malformed JSON body, keeping it as text");
            Value::String(String::from_utf8_lossy(raw).into_owned())
        }),
        "application/x-www-form-urlencoded" => {
            parse_pairs(&String::from_utf8_lossy(raw))
        }
        _ => Value::String(String::from_utf8_lossy(raw).into_owned()),
    }
}

fn is_json(content_type: &str) -> bool {
    content_type == "application/json"
        || content_type.strip_prefix("application/").is_some_and(|sub| sub.ends_with("+json"))
}

/// Decodes `a=1&b=2&b=3` into `{"a":"1","b":["2","3"]}`.
fn parse_pairs(input: &str) -> Value {
    let pairs: Vec<(String, String)> = serde_urlencoded::from_str(input).unwrap_or_default();

    let mut map = Map::new();
    for (key, value) in pairs {
        match map.get_mut(&key) {
            None => {
                map.insert(key, Value::String(value));
            }
            Some(Value::Array(values)) => values.push(Value::String(value)),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, Value::String(value)]);
            }
        }
    }
    Value::Object(map)
}
