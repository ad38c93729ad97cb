// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Context tool: batch variable operations.

use async_trait::async_trait;
use sr_workflow::{ContextOp, Step, StepKind};

use crate::error::EngineError;
use crate::tool::{RunCtx, Tool, ToolResult};

pub struct ContextTool;

#[async_trait]
impl Tool for ContextTool {
    fn name(&self) -> &'static str {
        "context"
    }

    async fn execute(&self, step: &Step, run: &mut RunCtx<'_>) -> Result<ToolResult, EngineError> {
        let StepKind::ContextOp(op) = &step.kind else {
            return Ok(ToolResult::fail("context tool received a non-context step"));
        };

        Ok(match op {
            ContextOp::Set { values } => {
                let mut set_vars = Vec::new();
                for (name, raw) in values {
                    let value = run.context.interpolate(raw);
                    run.context.set(name.clone(), value);
                    set_vars.push(name.as_str());
                }
                ToolResult::ok_with_output(format!(
                    "Set {} variable(s): {}",
                    set_vars.len(),
                    set_vars.join(", ")
                ))
            }

            ContextOp::Copy { mappings } => {
                let mut copied = Vec::new();
                let mut not_found = Vec::new();
                for (source, target) in mappings {
                    match run.context.get(source).cloned() {
                        Some(value) => {
                            run.context.set(target.clone(), value);
                            copied.push(format!("{source} -> {target}"));
                        }
                        None => not_found.push(source.as_str()),
                    }
                }
                if not_found.is_empty() {
                    ToolResult::ok_with_output(format!(
                        "Copied {} variable(s): {}",
                        copied.len(),
                        copied.join("; ")
                    ))
                } else {
                    ToolResult::ok_with_output(format!(
                        "Copied {} variable(s). Not found: {}",
                        copied.len(),
                        not_found.join(", ")
                    ))
                }
            }

            ContextOp::Clear { vars } => {
                let mut cleared = Vec::new();
                for name in vars {
                    if run.context.remove(name).is_some() {
                        cleared.push(name.as_str());
                    }
                }
                ToolResult::ok_with_output(format!(
                    "Cleared {} variable(s): {}",
                    cleared.len(),
                    cleared.join(", ")
                ))
            }

            ContextOp::Export { file, vars } => export_context(run, file, vars.as_deref()),
        })
    }
}

fn export_context(run: &mut RunCtx<'_>, file: &str, vars: Option<&[String]>) -> ToolResult {
    let path = run.context.interpolate(file);

    let export: serde_json::Map<String, serde_json::Value> = match vars {
        Some(filter) => filter
            .iter()
            .filter_map(|name| {
                run.context
                    .get(name)
                    .map(|value| (name.clone(), value.clone()))
            })
            .collect(),
        None => run
            .context
            .variables()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect(),
    };

    let count = export.len();
    let body = match serde_json::to_string_pretty(&serde_json::Value::Object(export)) {
        Ok(body) => body,
        Err(e) => return ToolResult::fail(format!("Failed to export context: {e}")),
    };
    if let Err(e) = std::fs::write(&path, body) {
        return ToolResult::fail(format!("Failed to export context: {e}"));
    }

    ToolResult::ok_with_output(format!("Exported {count} variable(s) to {path}"))
}

#[cfg(test)]
#[path = "context_tool_tests.rs"]
mod tests;
