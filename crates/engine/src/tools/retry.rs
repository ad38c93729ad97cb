// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Retry tool: run nested steps until success or attempts run out.

use std::time::Duration;

use async_trait::async_trait;
use sr_expr::evaluate_condition;
use sr_workflow::{FailurePolicy, Step, StepKind};

use crate::error::EngineError;
use crate::runner::run_nested;
use crate::tool::{LoopSignal, RunCtx, Tool, ToolResult};

pub struct RetryTool;

#[async_trait]
impl Tool for RetryTool {
    fn name(&self) -> &'static str {
        "retry"
    }

    async fn execute(&self, step: &Step, run: &mut RunCtx<'_>) -> Result<ToolResult, EngineError> {
        let StepKind::Retry(retry) = &step.kind else {
            return Ok(ToolResult::fail("retry tool received a non-retry step"));
        };

        let max = retry.max_attempts;
        run.display.loop_started(
            &format!(
                "{} (max: {max} attempts)",
                run.context.interpolate(&step.name)
            ),
            max as usize,
            run.depth,
        );

        let mut succeeded = false;
        let mut attempt: u32 = 1;
        let mut last_error: Option<String> = None;

        while attempt <= max {
            // Attempt counter is 1-indexed and intentionally left in the
            // context after the loop
            run.context.set("_attempt", attempt.to_string());
            run.display.iteration_started(
                (attempt - 1) as usize,
                max as usize,
                &format!("attempt {attempt}"),
                run.depth,
            );

            let outcome = run_nested(&retry.steps, run).await?;

            match outcome.loop_signal {
                LoopSignal::Break => {
                    run.display
                        .note(&format!("break at attempt {attempt}"), run.depth);
                    if outcome.success {
                        succeeded = true;
                    }
                    break;
                }
                LoopSignal::Continue => {
                    if attempt < max && retry.delay > 0.0 {
                        delay_before_next(run, retry.delay).await;
                    }
                    attempt += 1;
                    continue;
                }
                LoopSignal::None => {}
            }

            if !outcome.success {
                let error = outcome
                    .error
                    .unwrap_or_else(|| "Nested step failed".to_string());
                run.display
                    .note(&format!("attempt {attempt} failed: {error}"), run.depth);
                last_error = Some(error);
            } else if let Some(until) = &retry.until {
                match evaluate_condition(run.context, until) {
                    Ok(condition) if condition.satisfied => {
                        run.display.note(
                            &format!("success condition met on attempt {attempt}: {}", condition.reason),
                            run.depth,
                        );
                        succeeded = true;
                        break;
                    }
                    Ok(condition) => {
                        run.display.note(
                            &format!(
                                "success condition not met on attempt {attempt}: {}",
                                condition.reason
                            ),
                            run.depth,
                        );
                    }
                    Err(e) => {
                        return Ok(ToolResult::fail(format!(
                            "Retry 'until' condition evaluation error: {e}"
                        )));
                    }
                }
            } else {
                // No until condition: a clean pass is success
                succeeded = true;
                break;
            }

            if attempt < max && retry.delay > 0.0 {
                delay_before_next(run, retry.delay).await;
            }
            attempt += 1;
        }

        run.context
            .set("_retry_succeeded", if succeeded { "true" } else { "false" });
        run.context
            .set("_retry_attempts", attempt.min(max).to_string());

        if !succeeded {
            run.display
                .note(&format!("all {max} attempts failed"), run.depth);
            if retry.on_failure == FailurePolicy::Error {
                return Ok(ToolResult::fail(format!(
                    "Retry failed after {max} attempts. Last error: {}",
                    last_error.unwrap_or_else(|| "condition never satisfied".to_string())
                )));
            }
        }

        let output = if succeeded {
            format!("Succeeded on attempt {attempt}")
        } else {
            format!("Failed after {max} attempts")
        };
        Ok(ToolResult::ok_with_output(output))
    }
}

async fn delay_before_next(run: &RunCtx<'_>, delay: f64) {
    run.display
        .note(&format!("waiting {delay}s before next attempt"), run.depth);
    tokio::time::sleep(Duration::from_secs_f64(delay)).await;
}

#[cfg(test)]
#[path = "retry_tests.rs"]
mod tests;
