//! Helpers for turning nested vendor JSON into flat records.

use serde_json::Value;
use skill_core::VendorError;

/// Value at a JSON pointer, or `null`.
pub(crate) fn at(value: &Value, pointer: &str) -> Value {
    value.pointer(pointer).cloned().unwrap_or(Value::Null)
}

/// Array at a JSON pointer.
pub(crate) fn list<'a>(value: &'a Value, pointer: &str) -> Result<&'a [Value], VendorError> {
    value
        .pointer(pointer)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .ok_or_else(|| VendorError::Decode(format!("expected an array at {pointer}")))
}

/// Non-null value at a JSON pointer; a missing entity is reported as 404.
pub(crate) fn found<'a>(value: &'a Value, pointer: &str, what: &str) -> Result<&'a Value, VendorError> {
    match value.pointer(pointer) {
        Some(v) if !v.is_null() => Ok(v),
        _ => Err(VendorError::status(404, format!("{what} not found"))),
    }
}

/// Maps every element of the array at `pointer` through `record`.
pub(crate) fn records(value: &Value, pointer: &str, record: fn(&Value) -> Value) -> Result<Value, VendorError> {
    Ok(Value::Array(list(value, pointer)?.iter().map(record).collect()))
}

/// `field` of each element, e.g. label names out of label nodes.
pub(crate) fn pluck(items: &Value, field: &str) -> Value {
    match items.as_array() {
        Some(items) => items.iter().map(|i| i[field].clone()).filter(|v| !v.is_null()).collect(),
        None => Value::Array(Vec::new()),
    }
}
