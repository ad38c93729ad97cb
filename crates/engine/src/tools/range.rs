// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Range tool: counting loop over an inclusive numeric range.

use async_trait::async_trait;
use sr_workflow::{Step, StepKind};

use crate::error::EngineError;
use crate::runner::run_nested;
use crate::tool::{LoopSignal, RunCtx, Tool, ToolResult};

pub struct RangeTool;

#[async_trait]
impl Tool for RangeTool {
    fn name(&self) -> &'static str {
        "range"
    }

    async fn execute(&self, step: &Step, run: &mut RunCtx<'_>) -> Result<ToolResult, EngineError> {
        let StepKind::Range(range) = &step.kind else {
            return Ok(ToolResult::fail("range tool received a non-range step"));
        };

        let values = range_values(range.from, range.to, range.step);
        if values.is_empty() {
            return Ok(ToolResult::ok_with_output(
                "Empty range, no iterations performed",
            ));
        }

        run.display
            .loop_started(&run.context.interpolate(&step.name), values.len(), run.depth);

        let original_var = run.context.get(&range.var).cloned();
        let original_iteration = run.context.get("_iteration").cloned();

        let mut completed = 0;
        let mut result = None;

        for (idx, value) in values.iter().enumerate() {
            run.context.set(range.var.clone(), value.to_string());
            run.context.set("_iteration", idx.to_string());
            run.display
                .iteration_started(idx, values.len(), &value.to_string(), run.depth);

            let outcome = match run_nested(&range.steps, run).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    restore(run, range, &original_var, &original_iteration);
                    return Err(e);
                }
            };

            match outcome.loop_signal {
                LoopSignal::Break => {
                    run.display.note(&format!("break at index {idx}"), run.depth);
                    break;
                }
                LoopSignal::Continue => continue,
                LoopSignal::None => {}
            }

            if !outcome.success {
                let error = outcome
                    .error
                    .unwrap_or_else(|| "Nested step failed".to_string());
                result = Some(ToolResult::fail(format!(
                    "Range failed at value {value}: {error}"
                )));
                break;
            }

            completed += 1;
        }

        restore(run, range, &original_var, &original_iteration);

        if let Some(result) = result {
            return Ok(result);
        }
        Ok(ToolResult::ok_with_output(format!(
            "Completed {completed}/{} iterations",
            values.len()
        )))
    }
}

/// Inclusive range with a positive or negative stride.
fn range_values(from: i64, to: i64, step: i64) -> Vec<i64> {
    let mut values = Vec::new();
    let mut current = from;
    if step > 0 {
        while current <= to {
            values.push(current);
            current += step;
        }
    } else {
        while current >= to {
            values.push(current);
            current += step;
        }
    }
    values
}

fn restore(
    run: &mut RunCtx<'_>,
    range: &sr_workflow::RangeStep,
    original_var: &Option<serde_json::Value>,
    original_iteration: &Option<serde_json::Value>,
) {
    match original_var {
        Some(value) => run.context.set(range.var.clone(), value.clone()),
        None => {
            run.context.remove(&range.var);
        }
    }
    match original_iteration {
        Some(value) => run.context.set("_iteration", value.clone()),
        None => {
            run.context.remove("_iteration");
        }
    }
}

#[cfg(test)]
#[path = "range_tests.rs"]
mod tests;
