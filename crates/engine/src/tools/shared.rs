// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared-step tool: execute a reusable step bundle with typed inputs
//! and mapped outputs.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde_json::{json, Value};
use sr_core::ExecutionContext;
use sr_workflow::shared::{validate_inputs, Definition};
use sr_workflow::{SharedCall, Step, StepKind};

use crate::error::EngineError;
use crate::runner::run_nested;
use crate::tool::{RunCtx, Tool, ToolResult};

pub struct SharedStepTool;

#[async_trait]
impl Tool for SharedStepTool {
    fn name(&self) -> &'static str {
        "shared-step"
    }

    async fn execute(&self, step: &Step, run: &mut RunCtx<'_>) -> Result<ToolResult, EngineError> {
        let StepKind::Shared(call) = &step.kind else {
            return Ok(ToolResult::fail("shared-step tool received a non-shared step"));
        };
        execute_shared(call, run).await
    }
}

/// Resolve, validate, and execute a `uses:` reference.
pub async fn execute_shared(
    call: &SharedCall,
    run: &mut RunCtx<'_>,
) -> Result<ToolResult, EngineError> {
    let definition = run.shared.resolver.resolve(&call.uses)?.clone();

    // Inputs interpolate through the caller's context before validation
    let provided: BTreeMap<String, Value> = call
        .with
        .iter()
        .map(|(name, value)| {
            let value = match value {
                Value::String(s) => Value::String(run.context.interpolate(s)),
                other => other.clone(),
            };
            (name.clone(), value)
        })
        .collect();
    let inputs = validate_inputs(&definition, &provided)?;

    run.shared.stack.push(&definition.identifier)?;
    let result = run_isolated(&definition, inputs, call, run).await;
    run.shared.stack.pop();
    result
}

/// Run the definition's steps in an isolated context and map outputs
/// back to the caller.
async fn run_isolated(
    definition: &Definition,
    inputs: BTreeMap<String, Value>,
    call: &SharedCall,
    run: &mut RunCtx<'_>,
) -> Result<ToolResult, EngineError> {
    // The child context sees exactly the inputs, bare and as `inputs.*`
    let mut child = ExecutionContext::new(run.context.project_path());
    if let Some(temp_dir) = run.context.temp_dir() {
        child.set_temp_dir(temp_dir);
        child.set("_temp_dir", temp_dir.display().to_string());
    }
    child.set(
        "inputs",
        Value::Object(inputs.clone().into_iter().collect()),
    );
    for (name, value) in &inputs {
        child.set(name.clone(), value.clone());
    }

    // Swap the child in for the nested run, swap back after
    std::mem::swap(run.context, &mut child);
    let outcome = run_nested(&definition.steps, run).await;
    std::mem::swap(run.context, &mut child);
    let outcome = outcome?;

    let mut outputs = serde_json::Map::new();
    if outcome.success {
        map_outputs(definition, call, &child, run.context, &mut outputs);
    }

    let mut summary = json!({
        "step_id": definition.identifier,
        "success": outcome.success,
        "steps_completed": outcome.completed,
        "steps_total": definition.steps.len(),
    });
    if !outcome.success {
        summary["failed_step"] = json!(outcome.failed_step);
    }
    if !outputs.is_empty() {
        summary["outputs"] = Value::Object(outputs);
    }

    Ok(ToolResult {
        success: outcome.success,
        output: serde_json::to_string(&summary).ok(),
        error: outcome.error.map(|e| {
            format!(
                "Shared step '{}' failed: {e}",
                definition.identifier
            )
        }),
        ..ToolResult::default()
    })
}

/// Copy declared outputs (and caller-mapped extras) from the child
/// context into the parent.
fn map_outputs(
    definition: &Definition,
    call: &SharedCall,
    child: &ExecutionContext,
    parent: &mut ExecutionContext,
    collected: &mut serde_json::Map<String, Value>,
) {
    for output in &definition.outputs {
        let Some(value) = child.get(&output.from_var).cloned() else {
            continue;
        };
        collected.insert(output.name.clone(), value.clone());
        let parent_var = call
            .outputs
            .get(&output.name)
            .cloned()
            .unwrap_or_else(|| output.name.clone());
        parent.set(parent_var, value);
    }

    // Caller mappings may also address internal variables directly
    for (parent_var, internal_var) in &call.outputs {
        if definition.outputs.iter().any(|o| &o.name == internal_var) {
            continue;
        }
        if let Some(value) = child.get(internal_var).cloned() {
            parent.set(parent_var.clone(), value);
        }
    }
}

#[cfg(test)]
#[path = "shared_tests.rs"]
mod tests;
