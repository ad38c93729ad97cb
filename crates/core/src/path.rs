// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Parsed variable paths for placeholder resolution.
//!
//! A placeholder like `{result.items.0.name}` is parsed once into a
//! [`VarPath`] and then walked against the decoded value tree, instead of
//! re-scanning the raw text per substitution.

use crate::value::{decode_if_json, Value};

/// A parsed variable path: a root variable name plus zero or more
/// object-key / array-index segments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VarPath {
    root: String,
    segments: Vec<String>,
}

impl VarPath {
    /// Parse a dotted path.
    ///
    /// The root must match `[A-Za-z_][A-Za-z0-9_]*`; each following
    /// segment must be a non-empty run of `[A-Za-z0-9_]`. Returns `None`
    /// for anything else.
    pub fn parse(path: &str) -> Option<Self> {
        let mut parts = path.split('.');
        let root = parts.next()?;
        if !is_valid_root(root) {
            return None;
        }
        let mut segments = Vec::new();
        for part in parts {
            if part.is_empty() || !part.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_') {
                return None;
            }
            segments.push(part.to_string());
        }
        Some(Self {
            root: root.to_string(),
            segments,
        })
    }

    /// The root variable name.
    pub fn root(&self) -> &str {
        &self.root
    }

    /// Path segments after the root.
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Whether this path descends below the root variable.
    pub fn has_segments(&self) -> bool {
        !self.segments.is_empty()
    }

    /// The full dotted path.
    pub fn dotted(&self) -> String {
        if self.segments.is_empty() {
            self.root.clone()
        } else {
            format!("{}.{}", self.root, self.segments.join("."))
        }
    }

    /// File-safe name for externalized values (`a.b.0` becomes `a_b_0`).
    pub fn slug(&self) -> String {
        self.dotted().replace('.', "_")
    }

    /// Walk the segments against a root value, decoding JSON strings on
    /// the way down. Returns `None` when any segment fails to resolve.
    pub fn walk(&self, root_value: &Value) -> Option<Value> {
        let mut current = if self.has_segments() {
            match root_value {
                Value::String(s) => decode_if_json(s),
                other => other.clone(),
            }
        } else {
            root_value.clone()
        };

        for segment in &self.segments {
            current = match &current {
                Value::Object(map) => map.get(segment.as_str())?.clone(),
                Value::Array(items) => {
                    let idx: usize = segment.parse().ok()?;
                    items.get(idx)?.clone()
                }
                _ => return None,
            };
        }

        if current.is_null() {
            return None;
        }
        Some(current)
    }
}

fn is_valid_root(s: &str) -> bool {
    let mut bytes = s.bytes();
    match bytes.next() {
        Some(b) if b.is_ascii_alphabetic() || b == b'_' => {}
        _ => return false,
    }
    bytes.all(|b| b.is_ascii_alphanumeric() || b == b'_')
}

#[cfg(test)]
#[path = "path_tests.rs"]
mod tests;
