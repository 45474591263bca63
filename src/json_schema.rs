//! JSON Schema engine, backed by the `jsonschema` crate.
//!
//! Query strings and headers only ever carry strings, so a schema declaring
//! `{"type": "integer"}` would reject every query parameter. With
//! [`ValidationOptions::convert`] on, string leaves are coerced to the type
//! the schema declares before validation:
//!
//! | declared  | accepted strings               | result          |
//! |-----------|--------------------------------|-----------------|
//! | `integer` | `"42"`                         | `42`            |
//! | `number`  | `"42"`, `"4.2"`, `"1e3"`       | number          |
//! | `boolean` | `"true"`, `"false"`            | bool            |
//! | `null`    | `""`, `"null"`                 | `null`          |
//! | `array`   | any single value               | one-item array  |
//!
//! Coercion recurses through `properties` and `items`. `$ref` targets are
//! validated but not coerced.

use jsonschema::Validator;
use serde_json::{Number, Value};

use crate::error::Error;
use crate::schema::{Schema, SchemaError, ValidationError, ValidationOptions};

/// A compiled JSON Schema.
///
/// ```rust
/// use serde_json::json;
/// use tsu_validate::JsonSchema;
///
/// let user = JsonSchema::new(json!({
///     "type": "object",
///     "properties": {
///         "age":  { "type": "number", "minimum": 18 },
///         "name": { "type": "string" }
///     },
///     "required": ["name"]
/// }))
/// .unwrap();
/// ```
pub struct JsonSchema {
    schema: Value,
    validator: Validator,
}

impl JsonSchema {
    /// Compiles `schema`. The draft is taken from `$schema`, 2020-12 otherwise.
    pub fn new(schema: Value) -> Result<Self, Error> {
        let validator = jsonschema::validator_for(&schema)
            .map_err(|e| Error::InvalidSchema(e.to_string()))?;
        Ok(Self { schema, validator })
    }
}

impl Schema for JsonSchema {
    fn validate(&self, value: &Value, options: &ValidationOptions) -> Result<Value, SchemaError> {
        let value = if options.convert {
            coerce(&self.schema, value)
        } else {
            value.clone()
        };

        let messages: Vec<String> = self.validator
            .iter_errors(&value)
            .map(|e| e.to_string())
            .collect();

        match messages.first() {
            None => Ok(value),
            Some(first) => Err(ValidationError::new(first.clone()).with_details(messages).into()),
        }
    }
}

fn coerce(schema: &Value, value: &Value) -> Value {
    let types = declared_types(schema);

    match value {
        Value::String(s) if !types.is_empty() && !types.contains(&"string") => {
            coerce_str(schema, &types, s).unwrap_or_else(|| value.clone())
        }
        Value::Object(map) => match schema.get("properties").and_then(Value::as_object) {
            Some(properties) => Value::Object(
                map.iter()
                    .map(|(key, v)| {
                        let v = match properties.get(key) {
                            Some(sub) => coerce(sub, v),
                            None => v.clone(),
                        };
                        (key.clone(), v)
                    })
                    .collect(),
            ),
            None => value.clone(),
        },
        Value::Array(items) => match schema.get("items") {
            Some(sub) if sub.is_object() => Value::Array(items.iter().map(|v| coerce(sub, v)).collect()),
            _ => value.clone(),
        },
        _ => value.clone(),
    }
}

fn declared_types(schema: &Value) -> Vec<&str> {
    match schema.get("type") {
        Some(Value::String(ty)) => vec![ty.as_str()],
        Some(Value::Array(tys)) => tys.iter().filter_map(Value::as_str).collect(),
        _ => Vec::new(),
    }
}

/// First declared type `s` converts to, in declaration order.
fn coerce_str(schema: &Value, types: &[&str], s: &str) -> Option<Value> {
    for ty in types {
        match *ty {
            "integer" => {
                if let Some(n) = parse_integer(s) {
                    return Some(n);
                }
            }
            "number" => {
                if let Some(n) = parse_integer(s) {
                    return Some(n);
                }
                // An integer too wide for u64 would lose digits as f64.
                if is_integer_literal(s) {
                    continue;
                }
                if let Some(n) = s.parse::<f64>().ok().and_then(Number::from_f64) {
                    return Some(Value::Number(n));
                }
            }
            "boolean" => match s {
                "true" => return Some(Value::Bool(true)),
                "false" => return Some(Value::Bool(false)),
                _ => {}
            },
            "null" => {
                if s.is_empty() || s == "null" {
                    return Some(Value::Null);
                }
            }
            "array" => {
                let item = Value::String(s.to_owned());
                let item = match schema.get("items") {
                    Some(sub) if sub.is_object() => coerce(sub, &item),
                    _ => item,
                };
                return Some(Value::Array(vec![item]));
            }
            _ => {}
        }
    }
    None
}

fn parse_integer(s: &str) -> Option<Value> {
    s.parse::<i64>()
        .map(Value::from)
        .or_else(|_| s.parse::<u64>().map(Value::from))
        .ok()
}

fn is_integer_literal(s: &str) -> bool {
    let digits = s.strip_prefix(['-', '+']).unwrap_or(s);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}
