// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Checklist tool: run named validation checks concurrently.
//!
//! Three check kinds: `bash` runs a command and compares its output,
//! `regex` counts pattern matches via ripgrep, `model` asks a
//! lightweight LLM through the claude CLI. All checks run to completion;
//! nothing is cancelled on first failure.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use sr_workflow::step::parse_on_fail;
use sr_workflow::{Check, CheckKind, ChecklistSource, ChecklistStep, OnFailPolicy, Severity, Step, StepKind};
use tokio::task::JoinSet;

use crate::error::EngineError;
use crate::tool::{RunCtx, Tool, ToolResult};

/// Per-check subprocess timeout.
const CHECK_TIMEOUT: Duration = Duration::from_secs(60);

/// Model used for LLM-based checks.
const CHECK_MODEL: &str = "claude-3-5-haiku-latest";

/// Default pass pattern for model checks.
const DEFAULT_PASS_PATTERN: &str = "(?i)(PASS|pass|yes|ok|true)";

pub struct ChecklistTool;

#[derive(Debug, Clone)]
struct CheckResult {
    name: String,
    passed: bool,
    severity: Severity,
    message: String,
    details: Option<String>,
}

#[async_trait]
impl Tool for ChecklistTool {
    fn name(&self) -> &'static str {
        "checklist"
    }

    async fn execute(&self, step: &Step, run: &mut RunCtx<'_>) -> Result<ToolResult, EngineError> {
        let StepKind::Checklist(checklist) = &step.kind else {
            return Ok(ToolResult::fail("checklist tool received a non-checklist step"));
        };

        let (list_name, checks, file_on_fail) = match load_checklist(run, step, checklist) {
            Ok(loaded) => loaded,
            Err(message) => return Ok(ToolResult::fail(message)),
        };
        let on_fail = checklist
            .on_fail
            .or(file_on_fail)
            .unwrap_or(OnFailPolicy::Warn);

        // Interpolate check inputs up front, then fan out
        let project_path = run.context.project_path().to_path_buf();
        let prepared: Vec<PreparedCheck> = checks
            .iter()
            .map(|check| prepare_check(run, check, &project_path))
            .collect();

        let mut join_set = JoinSet::new();
        for (idx, check) in prepared.into_iter().enumerate() {
            join_set.spawn(async move { (idx, run_check(check).await) });
        }
        let mut results: Vec<(usize, CheckResult)> = Vec::new();
        while let Some(joined) = join_set.join_next().await {
            if let Ok(indexed) = joined {
                results.push(indexed);
            }
        }
        results.sort_by_key(|(idx, _)| *idx);
        let results: Vec<CheckResult> = results.into_iter().map(|(_, r)| r).collect();

        for result in &results {
            run.display.checklist_item(
                &result.name,
                result.passed,
                result.severity.as_str(),
                (!result.passed).then_some(result.message.as_str()),
            );
        }

        let has_errors = results
            .iter()
            .any(|r| !r.passed && r.severity == Severity::Error);
        let has_warnings = results
            .iter()
            .any(|r| !r.passed && r.severity == Severity::Warning);

        let success = match on_fail {
            OnFailPolicy::Stop => !has_errors && !has_warnings,
            OnFailPolicy::Warn => !has_errors,
            OnFailPolicy::Continue => true,
        };

        Ok(ToolResult {
            success,
            output: Some(format_results(&list_name, &results)),
            error: (!success).then(|| "Checklist validation failed".to_string()),
            ..ToolResult::default()
        })
    }
}

fn load_checklist(
    run: &RunCtx<'_>,
    step: &Step,
    checklist: &ChecklistStep,
) -> Result<(String, Vec<Check>, Option<OnFailPolicy>), String> {
    match &checklist.source {
        ChecklistSource::Inline(checks) => Ok((step.name.clone(), checks.clone(), None)),
        ChecklistSource::File(name) => {
            let name = run.context.interpolate(name);
            let dir = run.context.project_path().join(".claude").join("checklists");
            let file = ["", ".yaml", ".yml"]
                .iter()
                .map(|ext| dir.join(format!("{name}{ext}")))
                .find(|p| p.is_file())
                .ok_or_else(|| "Failed to load checklist configuration".to_string())?;

            let text = std::fs::read_to_string(&file)
                .map_err(|_| "Failed to load checklist configuration".to_string())?;
            let doc: serde_yaml::Value = serde_yaml::from_str(&text)
                .map_err(|_| "Failed to load checklist configuration".to_string())?;

            let list_name = doc
                .get("name")
                .and_then(serde_yaml::Value::as_str)
                .unwrap_or(&name)
                .to_string();
            let items = doc
                .get("items")
                .and_then(serde_yaml::Value::as_sequence)
                .ok_or_else(|| "Failed to load checklist configuration".to_string())?;
            let checks = items
                .iter()
                .map(Check::from_yaml)
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| format!("Failed to load checklist configuration: {e}"))?;
            let on_fail = doc
                .get("on_fail")
                .and_then(serde_yaml::Value::as_str)
                .and_then(parse_on_fail);
            Ok((list_name, checks, on_fail))
        }
    }
}

/// A check with its inputs already interpolated, ready to run on a task.
struct PreparedCheck {
    name: String,
    severity: Severity,
    project_path: PathBuf,
    kind: PreparedKind,
}

enum PreparedKind {
    Bash {
        command: String,
        expect: Option<String>,
        expect_not: Option<String>,
        expect_regex: Option<String>,
    },
    Regex {
        pattern: String,
        files: String,
        exclude: Option<String>,
        expect: i64,
    },
    Model {
        prompt: String,
        pass_pattern: String,
    },
}

/// Empty, zero, false, and null values carry nothing worth showing the
/// model and are skipped.
fn has_content(value: &serde_json::Value) -> bool {
    match value {
        serde_json::Value::Null => false,
        serde_json::Value::Bool(b) => *b,
        serde_json::Value::Number(n) => n.as_f64() != Some(0.0),
        serde_json::Value::String(s) => !s.is_empty(),
        serde_json::Value::Array(items) => !items.is_empty(),
        serde_json::Value::Object(map) => !map.is_empty(),
    }
}

fn prepare_check(run: &RunCtx<'_>, check: &Check, project_path: &std::path::Path) -> PreparedCheck {
    let kind = match &check.kind {
        CheckKind::Bash {
            command,
            expect,
            expect_not,
            expect_regex,
        } => PreparedKind::Bash {
            command: run.context.interpolate(command),
            expect: expect.clone(),
            expect_not: expect_not.clone(),
            expect_regex: expect_regex.clone(),
        },
        CheckKind::Regex {
            pattern,
            files,
            exclude,
            expect,
        } => PreparedKind::Regex {
            pattern: pattern.clone(),
            files: files.clone(),
            exclude: exclude.clone(),
            expect: *expect,
        },
        CheckKind::Model {
            prompt,
            pass_pattern,
            context_vars,
        } => {
            let mut prompt = run.context.interpolate(prompt);
            // Non-empty named context variables are prepended as sections
            let mut sections: Vec<String> = Vec::new();
            for var in context_vars {
                if let Some(value) = run.context.get(var).filter(|v| has_content(v)) {
                    sections.push(format!("## {var}\n{}", sr_core::stringify(value)));
                }
            }
            if !sections.is_empty() {
                prompt = format!("{}\n\n{prompt}", sections.join("\n\n"));
            }
            PreparedKind::Model {
                prompt,
                pass_pattern: if pass_pattern.is_empty() {
                    DEFAULT_PASS_PATTERN.to_string()
                } else {
                    pass_pattern.clone()
                },
            }
        }
    };

    PreparedCheck {
        name: check.name.clone(),
        severity: check.severity,
        project_path: project_path.to_path_buf(),
        kind,
    }
}

async fn run_check(check: PreparedCheck) -> CheckResult {
    let name = check.name.clone();
    let severity = check.severity;
    fn fail(name: &str, severity: Severity, message: String) -> CheckResult {
        CheckResult {
            name: name.to_string(),
            passed: false,
            severity,
            message,
            details: None,
        }
    }

    match &check.kind {
        PreparedKind::Bash {
            command,
            expect,
            expect_not,
            expect_regex,
        } => {
            let output = match run_command("sh", &["-c", command], &check.project_path).await {
                Ok(output) => output,
                Err(message) => return fail(&name, severity, message),
            };
            let stdout = output.0.trim().to_string();

            let (passed, message) = if let Some(expected) = expect {
                if &stdout == expected {
                    (true, "Output matches expected value".to_string())
                } else {
                    (false, format!("Expected '{expected}', got '{stdout}'"))
                }
            } else if let Some(forbidden) = expect_not {
                if stdout.contains(forbidden.as_str()) {
                    (false, format!("Output contains forbidden value: {forbidden}"))
                } else {
                    (true, "Output does not contain forbidden value".to_string())
                }
            } else if let Some(pattern) = expect_regex {
                match Regex::new(pattern) {
                    Ok(re) if re.is_match(&stdout) => {
                        (true, "Output matches pattern".to_string())
                    }
                    Ok(_) => (false, format!("Output does not match pattern: {pattern}")),
                    Err(e) => (false, format!("Invalid pattern: {e}")),
                }
            } else if output.1 {
                (true, "Command succeeded".to_string())
            } else {
                (false, "Command failed with nonzero exit code".to_string())
            };

            CheckResult {
                name,
                passed,
                severity,
                message,
                details: (!passed).then_some(stdout),
            }
        }

        PreparedKind::Regex {
            pattern,
            files,
            exclude,
            expect,
        } => {
            let mut args: Vec<String> = vec![
                "--count-matches".to_string(),
                "-e".to_string(),
                pattern.clone(),
                "--glob".to_string(),
                files.clone(),
            ];
            if let Some(exclude) = exclude {
                for pattern in exclude.split(',') {
                    args.push("--glob".to_string());
                    args.push(format!("!{}", pattern.trim()));
                }
            }
            args.push(".".to_string());
            let arg_refs: Vec<&str> = args.iter().map(String::as_str).collect();

            let output = match run_command("rg", &arg_refs, &check.project_path).await {
                Ok(output) => output.0,
                Err(message) => return fail(&name, severity, message),
            };

            // Output format is file:count per line
            let mut total = 0i64;
            let mut details = Vec::new();
            for line in output.lines() {
                if let Some((file, count)) = line.rsplit_once(':') {
                    if let Ok(count) = count.trim().parse::<i64>() {
                        total += count;
                        if count > 0 {
                            details.push(format!("{file}: {count} matches"));
                        }
                    }
                }
            }

            let passed = total == *expect;
            CheckResult {
                name,
                passed,
                severity,
                message: format!("Found {total} matches, expected {expect}"),
                details: (!passed && !details.is_empty())
                    .then(|| details.into_iter().take(10).collect::<Vec<_>>().join("\n")),
            }
        }

        PreparedKind::Model {
            prompt,
            pass_pattern,
        } => {
            let response = match run_command(
                "claude",
                &["-p", "--model", CHECK_MODEL, "--max-turns", "1", prompt],
                &check.project_path,
            )
            .await
            {
                Ok(output) => output.0,
                Err(message) => return fail(&name, severity, format!("Model check failed: {message}")),
            };

            let passed = Regex::new(pass_pattern)
                .map(|re| re.is_match(&response))
                .unwrap_or(false);
            CheckResult {
                name,
                passed,
                severity,
                message: if passed { "Check passed" } else { "Check failed" }.to_string(),
                details: (!passed).then_some(response),
            }
        }
    }
}

/// Run a subprocess with the shared check timeout. Returns (stdout,
/// success).
async fn run_command(
    program: &str,
    args: &[&str],
    cwd: &std::path::Path,
) -> Result<(String, bool), String> {
    let mut cmd = tokio::process::Command::new(program);
    cmd.args(args)
        .current_dir(cwd)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let output = tokio::time::timeout(CHECK_TIMEOUT, cmd.output())
        .await
        .map_err(|_| "Command timed out after 60 seconds".to_string())?
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                format!("{program} not found - please install it")
            } else {
                e.to_string()
            }
        })?;

    Ok((
        String::from_utf8_lossy(&output.stdout).into_owned(),
        output.status.success(),
    ))
}

fn format_results(list_name: &str, results: &[CheckResult]) -> String {
    let passed_count = results.iter().filter(|r| r.passed).count();
    let warning_count = results
        .iter()
        .filter(|r| !r.passed && r.severity == Severity::Warning)
        .count();
    let error_count = results
        .iter()
        .filter(|r| !r.passed && r.severity == Severity::Error)
        .count();

    let status = if error_count > 0 {
        "FAILED"
    } else if warning_count > 0 {
        "PASSED with warnings"
    } else {
        "PASSED"
    };

    let mut lines = vec![
        format!("## Checklist: {list_name}"),
        format!("Status: {status} ({passed_count}/{} checks passed)", results.len()),
    ];
    if warning_count > 0 {
        lines.push(format!("Warnings: {warning_count}"));
    }
    if error_count > 0 {
        lines.push(format!("Errors: {error_count}"));
    }
    lines.push(String::new());

    for result in results {
        let icon = if result.passed {
            "✓"
        } else {
            match result.severity {
                Severity::Error => "✗",
                Severity::Warning => "⚠",
                Severity::Info => "ℹ",
            }
        };
        lines.push(format!("{icon} {}", result.name));
        if !result.passed {
            lines.push(format!("  {}", result.message));
            if let Some(details) = &result.details {
                for line in details.lines().take(5) {
                    lines.push(format!("    {line}"));
                }
            }
        }
    }

    lines.join("\n")
}

#[cfg(test)]
#[path = "checklist_tests.rs"]
mod tests;
