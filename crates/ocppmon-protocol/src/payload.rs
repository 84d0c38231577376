//! Fallible accessors over untyped payloads.
//!
//! OCPP payloads are free-form JSON objects, and devices in the field are
//! sloppy about types: meter readings arrive as numbers or as numeric
//! strings, transaction ids as strings or integers. These helpers make
//! every field access explicit and fallible; callers treat `None` as a
//! missing field and fall back or no-op.

use serde_json::Value;

/// Returns a string field of an object payload.
pub fn str_field<'a>(payload: &'a Value, key: &str) -> Option<&'a str> {
    payload.get(key)?.as_str()
}

/// Returns an integer field of an object payload.
///
/// Accepts JSON integers, JSON floats (truncated), and numeric strings —
/// the shapes meter counters actually arrive in.
pub fn int_field(payload: &Value, key: &str) -> Option<i64> {
    as_int(payload.get(key)?)
}

/// Returns an array field of an object payload.
pub fn array_field<'a>(payload: &'a Value, key: &str) -> Option<&'a [Value]> {
    payload.get(key)?.as_array().map(Vec::as_slice)
}

/// Returns an identifier field as a string.
///
/// Transaction ids are delivered as either JSON strings or integers
/// depending on firmware; both normalize to their string form.
pub fn id_field(payload: &Value, key: &str) -> Option<String> {
    match payload.get(key)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Coerces a JSON value to an integer: integer, float, or numeric string.
pub fn as_int(value: &Value) -> Option<i64> {
    if let Some(n) = value.as_i64() {
        return Some(n);
    }
    if let Some(f) = value.as_f64() {
        return Some(f as i64);
    }
    let s = value.as_str()?.trim();
    if let Ok(n) = s.parse::<i64>() {
        return Some(n);
    }
    s.parse::<f64>().ok().map(|f| f as i64)
}
