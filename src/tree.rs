//! Native document trees
//!
//!     Front-end parsers hand the engine a generic tree of maps, sequences and scalars, and the
//!     engine hands the same kind of tree to a renderer. `serde_json::Value` with insertion
//!     order preserved plays that role. The helpers here give adapters typed access with
//!     located `MalformedInput` errors.

use crate::error::ConvertError;
use serde_json::Value;

pub type Tree = Value;
pub type Map = serde_json::Map<String, Value>;

/// Append a key to a JSON-pointer style location.
pub fn join(at: &str, key: &str) -> String {
    let escaped = key.replace('~', "~0").replace('/', "~1");
    format!("{at}/{escaped}")
}

/// The value as a map, or a `MalformedInput` naming what was expected.
pub fn expect_map<'a>(value: &'a Value, at: &str) -> Result<&'a Map, ConvertError> {
    value.as_object().ok_or_else(|| {
        ConvertError::malformed(at, format!("expected a mapping, found {}", kind_of(value)))
    })
}

/// Like [`expect_map`] but treats `null` (an empty YAML node) as an empty map.
pub fn map_or_empty<'a>(value: &'a Value, at: &str) -> Result<Option<&'a Map>, ConvertError> {
    match value {
        Value::Null => Ok(None),
        Value::Object(map) => Ok(Some(map)),
        other => Err(ConvertError::malformed(
            at,
            format!("expected a mapping, found {}", kind_of(other)),
        )),
    }
}

pub fn expect_str<'a>(map: &'a Map, key: &str, at: &str) -> Result<&'a str, ConvertError> {
    match map.get(key) {
        Some(Value::String(s)) => Ok(s),
        Some(other) => Err(ConvertError::malformed(
            join(at, key),
            format!("expected a string, found {}", kind_of(other)),
        )),
        None => Err(ConvertError::malformed(at, format!("missing required key '{key}'"))),
    }
}

/// A scalar rendered as a string. Numbers and booleans are stringified, which is what YAML
/// authors expect for keys like `version: 1.0`.
pub fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

pub fn get_string(map: &Map, key: &str) -> Option<String> {
    map.get(key).and_then(scalar_string)
}

pub fn get_bool(map: &Map, key: &str) -> Option<bool> {
    match map.get(key)? {
        Value::Bool(b) => Some(*b),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

pub fn get_u64(map: &Map, key: &str) -> Option<u64> {
    match map.get(key)? {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

pub fn get_number(map: &Map, key: &str) -> Option<serde_json::Number> {
    match map.get(key)? {
        Value::Number(n) => Some(n.clone()),
        Value::String(s) => serde_json::from_str(s).ok(),
        _ => None,
    }
}

/// A string or a sequence of strings, normalized to a list.
pub fn string_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items.iter().filter_map(scalar_string).collect(),
        Some(other) => scalar_string(other).into_iter().collect(),
        None => Vec::new(),
    }
}

/// Insert only when there is something to insert.
pub fn put<V: Into<Value>>(map: &mut Map, key: &str, value: Option<V>) {
    if let Some(value) = value {
        map.insert(key.to_string(), value.into());
    }
}

/// Insert a non-empty list of strings.
pub fn put_list(map: &mut Map, key: &str, values: &[String]) {
    if !values.is_empty() {
        map.insert(
            key.to_string(),
            Value::Array(values.iter().cloned().map(Value::String).collect()),
        );
    }
}

/// Insert a map unless it is empty.
pub fn put_map(map: &mut Map, key: &str, value: Map) {
    if !value.is_empty() {
        map.insert(key.to_string(), Value::Object(value));
    }
}

pub fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a sequence",
        Value::Object(_) => "a mapping",
    }
}

/// Resolve an in-document JSON pointer such as `#/definitions/Pet`.
pub fn resolve_pointer<'a>(root: &'a Value, reference: &str) -> Option<&'a Value> {
    let pointer = reference.strip_prefix('#')?;
    root.pointer(pointer)
}
