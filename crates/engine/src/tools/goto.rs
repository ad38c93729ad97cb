// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Goto tool: jump to a named step, or signal the enclosing loop.

use async_trait::async_trait;
use sr_workflow::{Step, StepKind};

use crate::error::EngineError;
use crate::tool::{LoopSignal, RunCtx, Tool, ToolResult};

pub struct GotoTool;

#[async_trait]
impl Tool for GotoTool {
    fn name(&self) -> &'static str {
        "goto"
    }

    async fn execute(&self, step: &Step, run: &mut RunCtx<'_>) -> Result<ToolResult, EngineError> {
        let StepKind::Goto(goto) = &step.kind else {
            return Ok(ToolResult::fail("goto tool received a non-goto step"));
        };

        let target = run.context.interpolate(&goto.target);
        // `break` and `continue` address the nearest enclosing loop
        // instead of a step
        Ok(match target.as_str() {
            "break" => ToolResult::signal(LoopSignal::Break),
            "continue" => ToolResult::signal(LoopSignal::Continue),
            _ => ToolResult::goto(target),
        })
    }
}

#[cfg(test)]
#[path = "goto_tests.rs"]
mod tests;
