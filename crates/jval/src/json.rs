//! Canonical conversions between [`Value`] and `serde_json::Value`.
//!
//! Two modes:
//! - **Strict** (`value_to_json`): errors on NaN/Infinity and invalid values.
//! - **Lossy** (`value_to_json_lossy`): NaN/Infinity and invalid become null.

use crate::error::ValueError;
use crate::{Kind, Value};

/// Convert a value to JSON, erroring on NaN/Infinity and invalid values.
pub fn value_to_json(val: &Value) -> Result<serde_json::Value, ValueError> {
    match val.kind() {
        Kind::Invalid => Err(ValueError::JsonEncode("an invalid value")),
        Kind::Null => Ok(serde_json::Value::Null),
        Kind::False => Ok(serde_json::Value::Bool(false)),
        Kind::True => Ok(serde_json::Value::Bool(true)),
        Kind::Number => serde_json::Number::from_f64(val.number_value())
            .map(serde_json::Value::Number)
            .ok_or(ValueError::JsonEncode("NaN/Infinity")),
        Kind::String => Ok(serde_json::Value::String(val.string_value().to_owned())),
        Kind::Array => val
            .array_iter()
            .map(|v| value_to_json(&v))
            .collect::<Result<Vec<_>, _>>()
            .map(serde_json::Value::Array),
        Kind::Object => {
            let mut obj = serde_json::Map::new();
            for (k, v) in val.object_entries() {
                obj.insert(k.string_value().to_owned(), value_to_json(v)?);
            }
            Ok(serde_json::Value::Object(obj))
        }
    }
}

/// Convert a value to JSON without erroring. NaN/Infinity and invalid values
/// become null.
pub fn value_to_json_lossy(val: &Value) -> serde_json::Value {
    match val.kind() {
        Kind::Invalid | Kind::Null => serde_json::Value::Null,
        Kind::False => serde_json::Value::Bool(false),
        Kind::True => serde_json::Value::Bool(true),
        Kind::Number => serde_json::Number::from_f64(val.number_value())
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        Kind::String => serde_json::Value::String(val.string_value().to_owned()),
        Kind::Array => {
            serde_json::Value::Array(val.array_iter().map(|v| value_to_json_lossy(&v)).collect())
        }
        Kind::Object => {
            let mut obj = serde_json::Map::new();
            for (k, v) in val.object_entries() {
                obj.insert(k.string_value().to_owned(), value_to_json_lossy(v));
            }
            serde_json::Value::Object(obj)
        }
    }
}

/// Convert a JSON value to a [`Value`].
pub fn json_to_value(json: &serde_json::Value) -> Value {
    match json {
        serde_json::Value::Null => Value::null(),
        serde_json::Value::Bool(b) => Value::bool(*b),
        serde_json::Value::Number(n) => Value::number(n.as_f64().unwrap_or(f64::NAN)),
        serde_json::Value::String(s) => Value::string(s),
        serde_json::Value::Array(arr) => arr
            .iter()
            .fold(Value::array_sized(arr.len() as i32), |a, v| {
                a.array_append(json_to_value(v))
            }),
        serde_json::Value::Object(map) => map.iter().fold(Value::object(), |o, (k, v)| {
            o.object_set(Value::string(k), json_to_value(v))
        }),
    }
}
