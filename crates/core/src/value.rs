// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tagged variable values and string coercion.
//!
//! Context variables are stored as [`serde_json::Value`] so that tool
//! outputs, decoded JSON structures, and plain strings share one
//! representation. String coercion happens only at the interpolation
//! boundary, via [`stringify`].

pub use serde_json::Value;

/// Convert a value to its canonical string form.
///
/// Strings pass through unquoted. Booleans render as `true`/`false`,
/// numbers in their JSON form (integers without a decimal point).
/// Objects and arrays serialize to compact JSON. Null renders empty.
pub fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Null => String::new(),
        Value::Object(_) | Value::Array(_) => {
            serde_json::to_string(value).unwrap_or_default()
        }
    }
}

/// Decode a string as JSON if it parses, otherwise keep it as a string.
///
/// Used when descending a path into a variable that may hold a JSON
/// document captured as text.
pub fn decode_if_json(s: &str) -> Value {
    serde_json::from_str(s).unwrap_or_else(|_| Value::String(s.to_string()))
}

#[cfg(test)]
#[path = "value_tests.rs"]
mod tests;
