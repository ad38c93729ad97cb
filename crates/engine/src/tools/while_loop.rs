// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! While tool: repeat nested steps while a condition holds.

use async_trait::async_trait;
use sr_expr::evaluate_condition;
use sr_workflow::{MaxReachedPolicy, Step, StepKind};

use crate::error::EngineError;
use crate::runner::run_nested;
use crate::tool::{LoopSignal, RunCtx, Tool, ToolResult};

pub struct WhileTool;

#[async_trait]
impl Tool for WhileTool {
    fn name(&self) -> &'static str {
        "while"
    }

    async fn execute(&self, step: &Step, run: &mut RunCtx<'_>) -> Result<ToolResult, EngineError> {
        let StepKind::While(while_step) = &step.kind else {
            return Ok(ToolResult::fail("while tool received a non-while step"));
        };

        run.display.loop_started(
            &run.context.interpolate(&step.name),
            while_step.max_iterations as usize,
            run.depth,
        );

        let original_iteration = run.context.get("_iteration").cloned();
        let max = while_step.max_iterations as usize;
        let mut completed = 0;
        let mut iteration = 0;
        let mut result = None;

        while iteration < max {
            // Condition gates each iteration
            let satisfied = match evaluate_condition(run.context, &while_step.condition) {
                Ok(outcome) => {
                    if !outcome.satisfied {
                        run.display.note(
                            &format!(
                                "condition false after {iteration} iterations: {}",
                                outcome.reason
                            ),
                            run.depth,
                        );
                    }
                    outcome.satisfied
                }
                Err(e) => {
                    restore_iteration(run, &original_iteration);
                    return Ok(ToolResult::fail(format!(
                        "While condition evaluation error: {e}"
                    )));
                }
            };
            if !satisfied {
                break;
            }

            run.context.set("_iteration", iteration.to_string());
            run.display
                .iteration_started(iteration, max, &format!("iteration {iteration}"), run.depth);

            let outcome = match run_nested(&while_step.steps, run).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    restore_iteration(run, &original_iteration);
                    return Err(e);
                }
            };

            match outcome.loop_signal {
                LoopSignal::Break => {
                    run.display
                        .note(&format!("break at iteration {iteration}"), run.depth);
                    break;
                }
                LoopSignal::Continue => {
                    iteration += 1;
                    continue;
                }
                LoopSignal::None => {}
            }

            if !outcome.success {
                let error = outcome.error.unwrap_or_else(|| "Nested step failed".to_string());
                restore_iteration(run, &original_iteration);
                return Ok(ToolResult::fail(format!(
                    "While loop failed at iteration {iteration}: {error}"
                )));
            }

            completed += 1;
            iteration += 1;
        }

        // Distinguish exiting on the condition from running out of iterations
        if iteration >= max {
            let still_true = evaluate_condition(run.context, &while_step.condition)
                .map(|outcome| outcome.satisfied)
                .unwrap_or(false);
            if still_true {
                run.display
                    .note(&format!("reached max_iterations ({max})"), run.depth);
                if while_step.on_max_reached == MaxReachedPolicy::Error {
                    result = Some(ToolResult::fail(format!(
                        "While loop reached max_iterations ({max}) with condition still true"
                    )));
                }
            }
        }

        restore_iteration(run, &original_iteration);

        Ok(result.unwrap_or_else(|| {
            ToolResult::ok_with_output(format!("Completed {completed} iterations"))
        }))
    }
}

fn restore_iteration(run: &mut RunCtx<'_>, original: &Option<serde_json::Value>) {
    match original {
        Some(value) => run.context.set("_iteration", value.clone()),
        None => {
            run.context.remove("_iteration");
        }
    }
}

#[cfg(test)]
#[path = "while_loop_tests.rs"]
mod tests;
