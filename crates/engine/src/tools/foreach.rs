// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Foreach tool: iterate an array variable over nested steps.

use async_trait::async_trait;
use serde_json::Value;
use sr_core::stringify;
use sr_workflow::{ItemErrorPolicy, Step, StepKind};

use crate::error::EngineError;
use crate::runner::run_nested;
use crate::tool::{LoopSignal, RunCtx, Tool, ToolResult};

pub struct ForeachTool;

#[async_trait]
impl Tool for ForeachTool {
    fn name(&self) -> &'static str {
        "foreach"
    }

    async fn execute(&self, step: &Step, run: &mut RunCtx<'_>) -> Result<ToolResult, EngineError> {
        let StepKind::Foreach(foreach) = &step.kind else {
            return Ok(ToolResult::fail("foreach tool received a non-foreach step"));
        };

        let Some(source_value) = resolve_source(run, &foreach.source) else {
            return Ok(ToolResult::fail(format!(
                "Source variable '{}' not found in context",
                foreach.source
            )));
        };
        let Some(items) = parse_to_array(&source_value) else {
            return Ok(ToolResult::fail(format!(
                "Source variable '{}' is not a valid JSON array",
                foreach.source
            )));
        };

        if items.is_empty() {
            return Ok(ToolResult::ok_with_output(
                "Empty array, no iterations performed",
            ));
        }

        run.display
            .loop_started(&run.context.interpolate(&step.name), items.len(), run.depth);

        // Prior values restored once the loop is done
        let original_item = run.context.get(&foreach.item_var).cloned();
        let original_index = foreach
            .index_var
            .as_ref()
            .and_then(|v| run.context.get(v).cloned());

        let mut completed = 0;
        let mut errors: Vec<String> = Vec::new();
        let mut result = None;

        for (idx, item) in items.iter().enumerate() {
            set_item_var(run, &foreach.item_var, item);
            if let Some(index_var) = &foreach.index_var {
                run.context.set(index_var.clone(), idx.to_string());
            }

            run.display
                .iteration_started(idx, items.len(), &item_preview(item), run.depth);

            let outcome = match run_nested(&foreach.steps, run).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    restore(run, foreach, original_item.clone(), original_index.clone());
                    return Err(e);
                }
            };

            match outcome.loop_signal {
                LoopSignal::Break => {
                    run.display.note(&format!("break at item {idx}"), run.depth);
                    break;
                }
                LoopSignal::Continue => {
                    run.display.note(&format!("continue at item {idx}"), run.depth);
                    continue;
                }
                LoopSignal::None => {}
            }

            if outcome.success {
                completed += 1;
                continue;
            }

            let error = outcome.error.unwrap_or_else(|| "Nested step failed".to_string());
            errors.push(format!("Item {idx}: {error}"));
            match foreach.on_item_error {
                ItemErrorPolicy::Stop => {
                    result = Some(ToolResult::fail(format!(
                        "ForEach failed at item {idx}: {error}"
                    )));
                    break;
                }
                ItemErrorPolicy::StopLoop => {
                    run.display
                        .note(&format!("item {idx} failed, stopping loop: {error}"), run.depth);
                    break;
                }
                ItemErrorPolicy::Continue => {
                    run.display
                        .note(&format!("item {idx} failed, continuing: {error}"), run.depth);
                }
            }
        }

        restore(run, foreach, original_item, original_index);

        if let Some(result) = result {
            return Ok(result);
        }

        let mut output = format!("Completed {completed}/{} iterations", items.len());
        if !errors.is_empty() {
            output.push_str(&format!(" ({} errors)", errors.len()));
        }
        Ok(ToolResult::ok_with_output(output))
    }
}

/// Look up the source array, following dotted paths through the
/// interpolation machinery.
fn resolve_source(run: &RunCtx<'_>, source: &str) -> Option<Value> {
    if source.contains('.') {
        let placeholder = format!("{{{source}}}");
        let resolved = run.context.interpolate(&placeholder);
        if resolved == placeholder {
            return None;
        }
        return Some(Value::String(resolved));
    }
    run.context.get(source).cloned()
}

fn parse_to_array(value: &Value) -> Option<Vec<Value>> {
    match value {
        Value::Array(items) => Some(items.clone()),
        Value::String(s) => match serde_json::from_str::<Value>(s) {
            Ok(Value::Array(items)) => Some(items),
            _ => None,
        },
        _ => None,
    }
}

/// Containers are stored as their JSON serialization, scalars as text.
fn set_item_var(run: &mut RunCtx<'_>, item_var: &str, item: &Value) {
    let stored = match item {
        Value::Object(_) | Value::Array(_) => {
            serde_json::to_string(item).unwrap_or_default()
        }
        other => stringify(other),
    };
    run.context.set(item_var.to_string(), stored);
}

fn item_preview(item: &Value) -> String {
    let text = stringify(item);
    if text.chars().count() > 50 {
        let truncated: String = text.chars().take(50).collect();
        format!("{truncated}...")
    } else {
        text
    }
}

fn restore(
    run: &mut RunCtx<'_>,
    foreach: &sr_workflow::ForeachStep,
    original_item: Option<Value>,
    original_index: Option<Value>,
) {
    match original_item {
        Some(value) => run.context.set(foreach.item_var.clone(), value),
        None => {
            run.context.remove(&foreach.item_var);
        }
    }
    if let Some(index_var) = &foreach.index_var {
        match original_index {
            Some(value) => run.context.set(index_var.clone(), value),
            None => {
                run.context.remove(index_var);
            }
        }
    }
}

#[cfg(test)]
#[path = "foreach_tests.rs"]
mod tests;
