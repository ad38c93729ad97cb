// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::test_support::{step, Harness};
use serde_json::json;

async fn execute(harness: &mut Harness, yaml: &str) -> ToolResult {
    let step = step(yaml);
    RetryTool
        .execute(&step, &mut harness.run_ctx())
        .await
        .unwrap()
}

#[tokio::test]
async fn until_condition_ends_retry_with_success() {
    let mut harness = Harness::new().await;
    let result = execute(
        &mut harness,
        r#"
name: Until second attempt
tool: retry
max_attempts: 3
until: '{ec} == 0'
steps:
  - name: Check attempt
    tool: shell
    command: 'test {_attempt} -eq 2; echo $?'
    output_var: ec
"#,
    )
    .await;

    assert!(result.success);
    assert_eq!(result.output.as_deref(), Some("Succeeded on attempt 2"));
    assert_eq!(harness.context.get("_retry_attempts"), Some(&json!("2")));
    assert_eq!(harness.context.get("_retry_succeeded"), Some(&json!("true")));
}

#[tokio::test]
async fn no_until_succeeds_on_first_clean_run() {
    let mut harness = Harness::new().await;
    let result = execute(
        &mut harness,
        r#"
name: One shot
tool: retry
max_attempts: 3
steps:
  - name: Fine
    tool: set
    var: x
    value: ok
"#,
    )
    .await;
    assert!(result.success);
    assert_eq!(result.output.as_deref(), Some("Succeeded on attempt 1"));
    assert_eq!(harness.context.get("_retry_attempts"), Some(&json!("1")));
}

#[tokio::test]
async fn nested_failures_retry_until_exhausted() {
    let mut harness = Harness::new().await;
    harness.context.set("runs", "0");
    let result = execute(
        &mut harness,
        r#"
name: Doomed
tool: retry
max_attempts: 3
steps:
  - name: Count runs
    tool: set
    var: runs
    expr: '{runs} + 1'
  - name: Fail
    tool: shell
    command: exit 7
"#,
    )
    .await;

    assert!(!result.success);
    assert!(result
        .error
        .unwrap()
        .starts_with("Retry failed after 3 attempts"));
    assert_eq!(harness.context.get("runs"), Some(&json!("3")));
    assert_eq!(harness.context.get("_retry_attempts"), Some(&json!("3")));
    assert_eq!(
        harness.context.get("_retry_succeeded"),
        Some(&json!("false"))
    );
}

#[tokio::test]
async fn on_failure_continue_keeps_workflow_alive() {
    let mut harness = Harness::new().await;
    let result = execute(
        &mut harness,
        r#"
name: Tolerated
tool: retry
max_attempts: 2
on_failure: continue
steps:
  - name: Fail
    tool: shell
    command: exit 1
"#,
    )
    .await;
    assert!(result.success);
    assert_eq!(result.output.as_deref(), Some("Failed after 2 attempts"));
    assert_eq!(
        harness.context.get("_retry_succeeded"),
        Some(&json!("false"))
    );
}

#[tokio::test]
async fn until_error_fails_the_step() {
    let mut harness = Harness::new().await;
    let result = execute(
        &mut harness,
        r#"
name: Bad until
tool: retry
max_attempts: 2
until: '1 =='
steps:
  - name: Fine
    tool: set
    var: x
    value: ok
"#,
    )
    .await;
    assert!(!result.success);
    assert!(result
        .error
        .unwrap()
        .starts_with("Retry 'until' condition evaluation error"));
}

#[tokio::test]
async fn attempt_variable_is_one_indexed() {
    let mut harness = Harness::new().await;
    execute(
        &mut harness,
        r#"
name: Observe attempt
tool: retry
max_attempts: 1
steps:
  - name: Remember
    tool: set
    var: seen_attempt
    value: '{_attempt}'
"#,
    )
    .await;
    assert_eq!(harness.context.get("seen_attempt"), Some(&json!("1")));
}
