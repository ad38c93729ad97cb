// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shell tool: subprocess by default, tmux pane when `visible: true`.

use std::collections::BTreeMap;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use sr_core::escape_for_shell;
use sr_workflow::{ShellStep, Step, StepKind};

use crate::error::EngineError;
use crate::tool::{RunCtx, Tool, ToolResult};

/// Invisible-mode subprocess timeout.
const COMMAND_TIMEOUT: Duration = Duration::from_secs(600);

/// Visible mode: pane content hash cadence and idle threshold.
const HASH_CHECK_INTERVAL: Duration = Duration::from_secs(2);
const IDLE_TIMEOUT: Duration = Duration::from_secs(10);

pub struct ShellTool;

#[async_trait]
impl Tool for ShellTool {
    fn name(&self) -> &'static str {
        "shell"
    }

    async fn execute(&self, step: &Step, run: &mut RunCtx<'_>) -> Result<ToolResult, EngineError> {
        let StepKind::Shell(shell) = &step.kind else {
            return Ok(ToolResult::fail("shell tool received a non-shell step"));
        };

        let command = run.context.interpolate(&shell.command);
        let cwd = run
            .context
            .interpolate_optional(shell.cwd.as_deref())
            .unwrap_or_else(|| run.context.project_path().display().to_string());

        let env: BTreeMap<String, String> = shell
            .env
            .iter()
            .map(|(k, v)| (k.clone(), run.context.interpolate(v)))
            .collect();

        if shell.visible {
            Ok(execute_visible(run, &command, &cwd, &env, shell).await)
        } else {
            Ok(execute_subprocess(&command, &cwd, &env, shell).await)
        }
    }
}

/// Run in a background subprocess, capturing stdout and stderr.
async fn execute_subprocess(
    command: &str,
    cwd: &str,
    env: &BTreeMap<String, String>,
    shell: &ShellStep,
) -> ToolResult {
    let mut cmd = tokio::process::Command::new("sh");
    cmd.arg("-c")
        .arg(command)
        .current_dir(cwd)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    // Custom entries override the inherited environment
    for (key, value) in env {
        cmd.env(key, value);
    }

    let output = match tokio::time::timeout(COMMAND_TIMEOUT, cmd.output()).await {
        Err(_) => return ToolResult::fail("Command timed out after 10 minutes"),
        Ok(Err(e)) => return ToolResult::fail(e.to_string()),
        Ok(Ok(output)) => output,
    };

    let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
    let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

    let mut combined = stdout;
    if !stderr.is_empty() {
        combined.push_str("\n[STDERR]\n");
        combined.push_str(&stderr);
    }
    if shell.strip_output {
        combined = combined.trim().to_string();
    }

    let success = output.status.success();
    ToolResult {
        success,
        output: Some(combined),
        error: (!success).then_some(stderr),
        ..ToolResult::default()
    }
}

/// Run in a visible tmux pane, detecting completion by idle content.
async fn execute_visible(
    run: &mut RunCtx<'_>,
    command: &str,
    cwd: &str,
    env: &BTreeMap<String, String>,
    shell: &ShellStep,
) -> ToolResult {
    // Entries that differ from the inherited environment become exports
    let exports: Vec<String> = env
        .iter()
        .filter(|(key, value)| std::env::var(key).ok().as_deref() != Some(value))
        .map(|(key, value)| format!("export {key}='{}'", escape_for_shell(value)))
        .collect();
    let command = if exports.is_empty() {
        command.to_string()
    } else {
        format!("{} && {command}", exports.join(" && "))
    };

    if let Err(e) = run.panes.launch_shell_pane(&command, Some(cwd)).await {
        return ToolResult::fail(e.to_string());
    }

    let mut output = wait_until_idle(run).await;
    run.panes.close_pane().await;

    if shell.strip_output {
        output = output.trim().to_string();
    }

    // No exit code is observable in a pane; the step always succeeds
    ToolResult::ok_with_output(output)
}

/// Consider the command finished once the pane content hash stops
/// changing for the idle threshold.
async fn wait_until_idle(run: &mut RunCtx<'_>) -> String {
    let mut last_hash = String::new();
    let mut last_change = tokio::time::Instant::now();

    loop {
        tokio::time::sleep(HASH_CHECK_INTERVAL).await;
        let hash = run.panes.pane_content_hash().await;
        if hash != last_hash {
            last_hash = hash;
            last_change = tokio::time::Instant::now();
        } else if last_change.elapsed() >= IDLE_TIMEOUT {
            break;
        }
    }

    run.panes.capture_pane_content().await
}

#[cfg(test)]
#[path = "shell_tests.rs"]
mod tests;
