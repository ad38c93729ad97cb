// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! External-interactive tool: runs Claude Code in a tmux pane and waits
//! for the completion signal.

use std::time::Duration;

use async_trait::async_trait;
use sr_workflow::{Step, StepKind};

use crate::error::EngineError;
use crate::tool::{RunCtx, Tool, ToolResult};

/// Patterns that indicate Claude is waiting for plan approval, matched
/// against lowercased pane content.
const PLAN_APPROVAL_PATTERNS: [&str; 3] = ["would you like to proceed", "❯", "1. yes"];

/// Pane content window inspected for approval prompts.
const APPROVAL_WINDOW_CHARS: usize = 500;

/// Wait slice per completion poll, short enough for display updates.
const COMPLETE_POLL: Duration = Duration::from_millis(500);

/// Interval between approval-prompt checks.
const APPROVAL_CHECK_INTERVAL: Duration = Duration::from_secs(2);

pub struct ClaudeTool;

#[async_trait]
impl Tool for ClaudeTool {
    fn name(&self) -> &'static str {
        "claude"
    }

    async fn execute(&self, step: &Step, run: &mut RunCtx<'_>) -> Result<ToolResult, EngineError> {
        let StepKind::Claude(claude) = &step.kind else {
            return Ok(ToolResult::fail("claude tool received a non-claude step"));
        };

        // Large variables are externalized to @file references
        let mut prompt = match run.context.interpolate_externalized(&claude.prompt) {
            Ok(prompt) => prompt,
            Err(e) => return Ok(ToolResult::fail(e.to_string())),
        };

        if let Some(extension) = run.panes.claude_settings().append_system_prompt.clone() {
            let extension = run.context.interpolate(&extension);
            prompt = format!("{extension}\n\n{prompt}");
        }

        let pane_id = match run.panes.launch_claude_pane(&prompt).await {
            Ok(pane_id) => pane_id,
            Err(e) => return Ok(ToolResult::fail(e.to_string())),
        };

        let output = wait_for_completion(run, &pane_id).await;
        run.panes.close_pane().await;

        Ok(ToolResult::ok_with_output(output))
    }
}

/// Wait for the completion signal, polling in short slices.
///
/// The loop terminates only on the signal; when plan auto-approval is
/// enabled, approval prompts detected between polls get an Enter.
async fn wait_for_completion(run: &mut RunCtx<'_>, pane_id: &str) -> String {
    let auto_approve = run.panes.claude_settings().auto_approve_plan;
    let mut last_approval_check = tokio::time::Instant::now();

    loop {
        if run
            .panes
            .server()
            .wait_for_complete(pane_id, COMPLETE_POLL)
            .await
        {
            break;
        }

        if auto_approve && last_approval_check.elapsed() > APPROVAL_CHECK_INTERVAL {
            if check_and_approve_plan(run).await {
                // Give the process time to act on the approval
                tokio::time::sleep(Duration::from_secs(1)).await;
            }
            last_approval_check = tokio::time::Instant::now();
        }
    }

    run.panes.capture_pane_content().await
}

async fn check_and_approve_plan(run: &mut RunCtx<'_>) -> bool {
    let content = run.panes.capture_pane_content().await.to_lowercase();
    if content.is_empty() || !is_plan_approval_prompt(&content) {
        return false;
    }
    run.display.note("auto-approving plan", run.depth);
    // The default option is already selected; Enter confirms it
    run.panes.send_keys("Enter").await;
    true
}

/// At least two approval patterns must appear in the recent content
/// window before an approval is sent.
fn is_plan_approval_prompt(content: &str) -> bool {
    let chars = content.chars().count();
    let recent: String = if chars > APPROVAL_WINDOW_CHARS {
        content
            .chars()
            .skip(chars - APPROVAL_WINDOW_CHARS)
            .collect()
    } else {
        content.to_string()
    };
    PLAN_APPROVAL_PATTERNS
        .iter()
        .filter(|p| recent.contains(**p))
        .count()
        >= 2
}

#[cfg(test)]
#[path = "claude_tests.rs"]
mod tests;
