// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Set tool: variable assignment from a literal or an expression.

use async_trait::async_trait;
use sr_workflow::{SetSource, Step, StepKind};

use crate::error::EngineError;
use crate::tool::{RunCtx, Tool, ToolResult};

pub struct SetTool;

#[async_trait]
impl Tool for SetTool {
    fn name(&self) -> &'static str {
        "set"
    }

    async fn execute(&self, step: &Step, run: &mut RunCtx<'_>) -> Result<ToolResult, EngineError> {
        let StepKind::Set(set) = &step.kind else {
            return Ok(ToolResult::fail("set tool received a non-set step"));
        };

        let value = match &set.source {
            SetSource::Value(value) => run.context.interpolate(value),
            SetSource::Expr(expr) => match sr_expr::evaluate(run.context, expr) {
                Ok(value) => value,
                Err(e) => return Ok(ToolResult::fail(format!("Expression error: {e}"))),
            },
        };

        run.context.set(set.var.clone(), value.clone());
        Ok(ToolResult::ok_with_output(format!("Set {}={value}", set.var)))
    }
}

#[cfg(test)]
#[path = "set_tests.rs"]
mod tests;
