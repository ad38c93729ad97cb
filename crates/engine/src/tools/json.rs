// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! JSON/YAML tool: JMESPath queries and path-based mutations over files
//! or context variables.
//!
//! Queries go through JMESPath with a few extra functions (`to_entries`,
//! `from_entries`, `unique`, `flatten`, `add`). Mutations use a simple
//! dot/bracket path language and write files atomically.

use std::path::PathBuf;
use std::rc::Rc;

use async_trait::async_trait;
use jmespath::functions::{ArgumentType, CustomFunction, Signature};
use jmespath::{Rcvar, Runtime, Variable};
use serde_json::{json, Value};
use sr_workflow::{JsonAction, JsonSource, JsonStep, Step, StepKind, UpdateOp};

use crate::error::EngineError;
use crate::tool::{RunCtx, Tool, ToolResult};

pub struct JsonTool;

#[async_trait]
impl Tool for JsonTool {
    fn name(&self) -> &'static str {
        "json"
    }

    async fn execute(&self, step: &Step, run: &mut RunCtx<'_>) -> Result<ToolResult, EngineError> {
        let StepKind::Json(json_step) = &step.kind else {
            return Ok(ToolResult::fail("json tool received a non-json step"));
        };

        let (mut data, file_path) = match load_data(run, json_step) {
            Ok(loaded) => loaded,
            Err(message) => return Ok(ToolResult::fail(message)),
        };

        let result = match &json_step.action {
            JsonAction::Query { query } => {
                let query = run.context.interpolate(query);
                return Ok(run_query(&query, &data));
            }
            JsonAction::Set { path, value } => {
                let path = run.context.interpolate(path);
                let value = interpolate_value(run, value);
                match set_at_path(&mut data, &path, value) {
                    Ok(()) => ToolResult::ok_with_output(format!("Set {path}")),
                    Err(e) => return Ok(ToolResult::fail(format!("JSON operation failed: {e}"))),
                }
            }
            JsonAction::Update {
                path,
                operation,
                value,
            } => {
                let path = run.context.interpolate(path);
                let value = interpolate_value(run, value);
                match apply_update(&mut data, &path, *operation, value) {
                    Ok(()) => {
                        ToolResult::ok_with_output(format!("Updated {path} ({})", op_name(*operation)))
                    }
                    Err(e) => return Ok(ToolResult::fail(e)),
                }
            }
            JsonAction::Delete { path } => {
                let path = run.context.interpolate(path);
                match delete_at_path(&mut data, &path) {
                    Ok(()) => ToolResult::ok_with_output(format!("Deleted {path}")),
                    Err(e) => return Ok(ToolResult::fail(format!("Delete at '{path}' failed: {e}"))),
                }
            }
        };

        // Mutations write back to where the data came from
        if let Err(e) = save_data(run, json_step, &data, file_path) {
            return Ok(ToolResult::fail(format!("Failed to save data: {e}")));
        }
        Ok(result)
    }
}

// =============================================================================
// Loading and saving
// =============================================================================

#[derive(Clone, Copy, PartialEq)]
enum FileFormat {
    Json,
    Yaml,
}

fn detect_format(path: &std::path::Path) -> FileFormat {
    match path.extension().and_then(|e| e.to_str()) {
        Some("yml") | Some("yaml") => FileFormat::Yaml,
        _ => FileFormat::Json,
    }
}

fn load_data(
    run: &RunCtx<'_>,
    step: &JsonStep,
) -> Result<(Value, Option<PathBuf>), String> {
    match &step.source {
        JsonSource::File(file) => {
            let resolved = run.context.interpolate(file);
            let mut path = PathBuf::from(&resolved);
            if path.is_relative() {
                path = run.context.project_path().join(path);
            }

            if !path.exists() {
                if step.create_if_missing {
                    return Ok((json!({}), Some(path)));
                }
                return Err(format!("File not found: {}", path.display()));
            }

            let text =
                std::fs::read_to_string(&path).map_err(|e| format!("File read error: {e}"))?;
            let data = match detect_format(&path) {
                FileFormat::Yaml => {
                    let data: Value = serde_yaml::from_str(&text)
                        .map_err(|e| format!("YAML parse error: {e}"))?;
                    // Empty YAML files parse as null
                    if data.is_null() {
                        json!({})
                    } else {
                        data
                    }
                }
                FileFormat::Json => {
                    serde_json::from_str(&text).map_err(|e| format!("JSON parse error: {e}"))?
                }
            };
            Ok((data, Some(path)))
        }
        JsonSource::Variable(var) => {
            let Some(value) = run.context.get(var) else {
                if step.create_if_missing {
                    return Ok((json!({}), None));
                }
                return Err(format!("Variable '{var}' not found in context"));
            };
            let data = match value {
                Value::String(s) => {
                    serde_json::from_str(s).map_err(|e| format!("JSON parse error: {e}"))?
                }
                other => other.clone(),
            };
            Ok((data, None))
        }
    }
}

fn save_data(
    run: &mut RunCtx<'_>,
    step: &JsonStep,
    data: &Value,
    file_path: Option<PathBuf>,
) -> Result<(), String> {
    match (&step.source, file_path) {
        (JsonSource::File(_), Some(path)) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).map_err(|e| e.to_string())?;
                let text = match detect_format(&path) {
                    FileFormat::Yaml => {
                        serde_yaml::to_string(data).map_err(|e| e.to_string())?
                    }
                    FileFormat::Json => {
                        serde_json::to_string_pretty(data).map_err(|e| e.to_string())?
                    }
                };
                // Atomic write: sibling temp file, then rename
                let temp = tempfile::NamedTempFile::new_in(parent).map_err(|e| e.to_string())?;
                std::fs::write(temp.path(), text).map_err(|e| e.to_string())?;
                temp.persist(&path).map_err(|e| e.to_string())?;
            }
            Ok(())
        }
        (JsonSource::Variable(var), _) => {
            let serialized = serde_json::to_string(data).map_err(|e| e.to_string())?;
            run.context.set(var.clone(), serialized);
            Ok(())
        }
        _ => Ok(()),
    }
}

// =============================================================================
// JMESPath queries
// =============================================================================

thread_local! {
    static RUNTIME: Runtime = build_runtime();
}

fn build_runtime() -> Runtime {
    let mut runtime = Runtime::new();
    runtime.register_builtin_functions();

    runtime.register_function(
        "to_entries",
        Box::new(CustomFunction::new(
            Signature::new(vec![ArgumentType::Object], None),
            Box::new(|args: &[Rcvar], _: &mut jmespath::Context| {
                let mut entries: Vec<Rcvar> = Vec::new();
                if let Some(object) = args.first().and_then(|a| a.as_object()) {
                    for (key, value) in object {
                        let mut entry = std::collections::BTreeMap::new();
                        entry.insert(
                            "key".to_string(),
                            Rc::new(Variable::String(key.clone())) as Rcvar,
                        );
                        entry.insert("value".to_string(), value.clone());
                        entries.push(Rc::new(Variable::Object(entry)));
                    }
                }
                Ok(Rc::new(Variable::Array(entries)))
            }),
        )),
    );

    runtime.register_function(
        "from_entries",
        Box::new(CustomFunction::new(
            Signature::new(vec![ArgumentType::Array], None),
            Box::new(|args: &[Rcvar], _: &mut jmespath::Context| {
                let mut object = std::collections::BTreeMap::new();
                if let Some(entries) = args.first().and_then(|a| a.as_array()) {
                    for entry in entries {
                        let Some(map) = entry.as_object() else { continue };
                        let Some(key) = map.get("key").and_then(|k| k.as_string().cloned())
                        else {
                            continue;
                        };
                        let value = map
                            .get("value")
                            .cloned()
                            .unwrap_or_else(|| Rc::new(Variable::Null));
                        object.insert(key, value);
                    }
                }
                Ok(Rc::new(Variable::Object(object)))
            }),
        )),
    );

    runtime.register_function(
        "unique",
        Box::new(CustomFunction::new(
            Signature::new(vec![ArgumentType::Array], None),
            Box::new(|args: &[Rcvar], _: &mut jmespath::Context| {
                let mut seen: Vec<Rcvar> = Vec::new();
                if let Some(items) = args.first().and_then(|a| a.as_array()) {
                    for item in items {
                        if !seen.iter().any(|s| s == item) {
                            seen.push(item.clone());
                        }
                    }
                }
                Ok(Rc::new(Variable::Array(seen)))
            }),
        )),
    );

    runtime.register_function(
        "flatten",
        Box::new(CustomFunction::new(
            Signature::new(vec![ArgumentType::Array], None),
            Box::new(|args: &[Rcvar], _: &mut jmespath::Context| {
                let mut result: Vec<Rcvar> = Vec::new();
                if let Some(items) = args.first().and_then(|a| a.as_array()) {
                    for item in items {
                        match item.as_array() {
                            Some(nested) => result.extend(nested.iter().cloned()),
                            None => result.push(item.clone()),
                        }
                    }
                }
                Ok(Rc::new(Variable::Array(result)))
            }),
        )),
    );

    runtime.register_function(
        "add",
        Box::new(CustomFunction::new(
            Signature::new(vec![ArgumentType::Array], None),
            Box::new(|args: &[Rcvar], _: &mut jmespath::Context| {
                let Some(items) = args.first().and_then(|a| a.as_array()) else {
                    return Ok(Rc::new(Variable::Null));
                };
                Ok(Rc::new(add_values(items)))
            }),
        )),
    );

    runtime
}

/// Sum numbers, concatenate strings, or merge arrays.
fn add_values(items: &[Rcvar]) -> Variable {
    if items.is_empty() {
        return Variable::Null;
    }
    if items.iter().all(|i| i.is_number()) {
        let sum: f64 = items.iter().filter_map(|i| i.as_number()).sum();
        let number = if sum.fract() == 0.0 && sum.is_finite() {
            serde_json::Number::from(sum as i64)
        } else {
            match serde_json::Number::from_f64(sum) {
                Some(number) => number,
                None => return Variable::Null,
            }
        };
        return Variable::Number(number);
    }
    if items.iter().all(|i| i.is_string()) {
        let joined: String = items
            .iter()
            .filter_map(|i| i.as_string().cloned())
            .collect();
        return Variable::String(joined);
    }
    if items.iter().all(|i| i.is_array()) {
        let mut merged: Vec<Rcvar> = Vec::new();
        for item in items {
            if let Some(nested) = item.as_array() {
                merged.extend(nested.iter().cloned());
            }
        }
        return Variable::Array(merged);
    }
    Variable::Null
}

fn run_query(query: &str, data: &Value) -> ToolResult {
    let serialized = match serde_json::to_string(data) {
        Ok(serialized) => serialized,
        Err(e) => return ToolResult::fail(e.to_string()),
    };
    let variable = match Variable::from_json(&serialized) {
        Ok(variable) => variable,
        Err(e) => return ToolResult::fail(e),
    };

    let result = RUNTIME.with(|runtime| {
        let expression = runtime
            .compile(query)
            .map_err(|e| format!("JMESPath query '{query}' failed: {e}"))?;
        expression
            .search(Rc::new(variable))
            .map_err(|e| format!("JMESPath query '{query}' failed: {e}"))
    });
    let result = match result {
        Ok(result) => result,
        Err(e) => return ToolResult::fail(e),
    };

    let value = serde_json::to_value(&*result).unwrap_or(Value::Null);
    let output = match &value {
        Value::Null => String::new(),
        Value::Object(_) | Value::Array(_) => {
            serde_json::to_string(&value).unwrap_or_default()
        }
        other => sr_core::stringify(other),
    };
    ToolResult::ok_with_output(output)
}

// =============================================================================
// Simple path mutations
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
enum PathPart {
    Key(String),
    Index(usize),
}

/// Parse `a.b[0].c` into keys and indices.
fn parse_path(path: &str) -> Result<Vec<PathPart>, String> {
    let path = path.strip_prefix('.').unwrap_or(path);
    if path.is_empty() {
        return Err("cannot address the document root".to_string());
    }

    let chars: Vec<char> = path.chars().collect();
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut i = 0;

    while i < chars.len() {
        match chars[i] {
            '.' => {
                if !current.is_empty() {
                    parts.push(PathPart::Key(std::mem::take(&mut current)));
                }
                i += 1;
            }
            '[' => {
                if !current.is_empty() {
                    parts.push(PathPart::Key(std::mem::take(&mut current)));
                }
                let close = chars[i..]
                    .iter()
                    .position(|&c| c == ']')
                    .ok_or_else(|| format!("Unclosed bracket in path: {path}"))?
                    + i;
                let index_str: String = chars[i + 1..close].iter().collect();
                match index_str.parse::<usize>() {
                    Ok(index) => parts.push(PathPart::Index(index)),
                    // Quoted string keys are allowed in brackets
                    Err(_) => parts.push(PathPart::Key(
                        index_str.trim_matches(|c| c == '\'' || c == '"').to_string(),
                    )),
                }
                i = close + 1;
            }
            ch => {
                current.push(ch);
                i += 1;
            }
        }
    }
    if !current.is_empty() {
        parts.push(PathPart::Key(current));
    }
    Ok(parts)
}

fn container_for(next: Option<&PathPart>) -> Value {
    match next {
        Some(PathPart::Index(_)) => json!([]),
        _ => json!({}),
    }
}

/// Read the value at a path.
fn query_path(data: &Value, path: &str) -> Result<Value, String> {
    if path == "." || path.is_empty() {
        return Ok(data.clone());
    }
    let mut current = data;
    for part in parse_path(path)? {
        current = match (&part, current) {
            (PathPart::Key(key), Value::Object(map)) => {
                map.get(key).ok_or_else(|| format!("Key '{key}' not found"))?
            }
            (PathPart::Index(idx), Value::Array(items)) => items
                .get(*idx)
                .ok_or_else(|| format!("Index {idx} out of bounds"))?,
            (PathPart::Key(key), _) => return Err(format!("Cannot access '{key}' on non-object")),
            (PathPart::Index(idx), _) => return Err(format!("Cannot index non-array with [{idx}]")),
        };
    }
    Ok(current.clone())
}

/// Set the value at a path, creating intermediate containers as needed.
fn set_at_path(data: &mut Value, path: &str, value: Value) -> Result<(), String> {
    let parts = parse_path(path)?;
    let mut current = data;

    for (i, part) in parts.iter().enumerate() {
        let is_last = i + 1 == parts.len();
        let next = parts.get(i + 1);
        match part {
            PathPart::Key(key) => {
                let map = current
                    .as_object_mut()
                    .ok_or_else(|| format!("Cannot set key '{key}' on non-object"))?;
                if is_last {
                    map.insert(key.clone(), value);
                    return Ok(());
                }
                let entry = map.entry(key.clone()).or_insert_with(|| container_for(next));
                if entry.is_null() {
                    *entry = container_for(next);
                }
                current = entry;
            }
            PathPart::Index(idx) => {
                let items = current
                    .as_array_mut()
                    .ok_or_else(|| format!("Cannot index non-array with [{idx}]"))?;
                let filler = if is_last { Value::Null } else { container_for(next) };
                while items.len() <= *idx {
                    items.push(filler.clone());
                }
                if is_last {
                    items[*idx] = value;
                    return Ok(());
                }
                if items[*idx].is_null() {
                    items[*idx] = container_for(next);
                }
                current = &mut items[*idx];
            }
        }
    }
    Ok(())
}

/// Remove the key or index at a path.
fn delete_at_path(data: &mut Value, path: &str) -> Result<(), String> {
    let parts = parse_path(path)?;
    let (last, parents) = parts
        .split_last()
        .ok_or_else(|| "empty path".to_string())?;

    let mut current = data;
    for part in parents {
        current = match (part, current) {
            (PathPart::Key(key), Value::Object(map)) => map
                .get_mut(key)
                .ok_or_else(|| format!("Key '{key}' not found"))?,
            (PathPart::Index(idx), Value::Array(items)) => items
                .get_mut(*idx)
                .ok_or_else(|| format!("Index {idx} out of bounds"))?,
            (PathPart::Key(key), _) => return Err(format!("Cannot access '{key}' on non-object")),
            (PathPart::Index(idx), _) => return Err(format!("Cannot index non-array with [{idx}]")),
        };
    }

    match (last, current) {
        (PathPart::Key(key), Value::Object(map)) => {
            map.remove(key)
                .ok_or_else(|| format!("Key '{key}' not found"))?;
        }
        (PathPart::Index(idx), Value::Array(items)) => {
            if *idx >= items.len() {
                return Err(format!("Index {idx} out of bounds"));
            }
            items.remove(*idx);
        }
        _ => return Err("path does not address a container".to_string()),
    }
    Ok(())
}

fn op_name(op: UpdateOp) -> &'static str {
    match op {
        UpdateOp::Append => "append",
        UpdateOp::Prepend => "prepend",
        UpdateOp::Increment => "increment",
        UpdateOp::Merge => "merge",
    }
}

/// Read-modify-write at a path; missing paths start from a default
/// container appropriate to the operation.
fn apply_update(
    data: &mut Value,
    path: &str,
    op: UpdateOp,
    value: Value,
) -> Result<(), String> {
    let current = query_path(data, path).unwrap_or_else(|_| match op {
        UpdateOp::Append | UpdateOp::Prepend => json!([]),
        UpdateOp::Increment => json!(0),
        UpdateOp::Merge => json!({}),
    });

    let new_value = match op {
        UpdateOp::Append => {
            let Value::Array(mut items) = current else {
                return Err(format!("Cannot append to non-array at '{path}'"));
            };
            items.push(value);
            Value::Array(items)
        }
        UpdateOp::Prepend => {
            let Value::Array(mut items) = current else {
                return Err(format!("Cannot prepend to non-array at '{path}'"));
            };
            items.insert(0, value);
            Value::Array(items)
        }
        UpdateOp::Increment => {
            let current_num = value_as_number(&current)
                .ok_or_else(|| format!("Cannot increment non-numeric value at '{path}'"))?;
            let increment = value_as_number(&value)
                .ok_or_else(|| format!("Cannot increment non-numeric value at '{path}'"))?;
            let sum = current_num + increment;
            if current.is_i64() && value.is_i64() {
                json!(sum as i64)
            } else {
                serde_json::Number::from_f64(sum)
                    .map(Value::Number)
                    .unwrap_or(Value::Null)
            }
        }
        UpdateOp::Merge => {
            let (Value::Object(mut base), Value::Object(overlay)) = (current, value) else {
                return Err(format!("Merge requires objects at '{path}'"));
            };
            base.extend(overlay);
            Value::Object(base)
        }
    };

    set_at_path(data, path, new_value)
        .map_err(|e| format!("JSON operation failed: {e}"))
}

fn value_as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::Null => Some(0.0),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Interpolate string values inside a configured value, re-parsing
/// JSON-looking results.
fn interpolate_value(run: &RunCtx<'_>, value: &Value) -> Value {
    match value {
        Value::String(s) => parse_scalar(&run.context.interpolate(s)),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), interpolate_value(run, v)))
                .collect(),
        ),
        Value::Array(items) => {
            Value::Array(items.iter().map(|v| interpolate_value(run, v)).collect())
        }
        other => other.clone(),
    }
}

/// Interpret an interpolated string: JSON documents, numbers, and the
/// literal true/false/null decode; everything else stays a string.
fn parse_scalar(text: &str) -> Value {
    if text.is_empty() {
        return Value::String(String::new());
    }
    let looks_like_json = text.starts_with('{')
        || text.starts_with('[')
        || text.starts_with('"')
        || matches!(text, "true" | "false" | "null");
    if looks_like_json {
        if let Ok(value) = serde_json::from_str(text) {
            return value;
        }
    }
    if let Ok(int) = text.parse::<i64>() {
        return json!(int);
    }
    if text.contains('.') {
        if let Ok(float) = text.parse::<f64>() {
            if let Some(number) = serde_json::Number::from_f64(float) {
                return Value::Number(number);
            }
        }
    }
    Value::String(text.to_string())
}

#[cfg(test)]
#[path = "json_tests.rs"]
mod tests;
