// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::test_support::{step, Harness};
use serde_json::json;

async fn execute(harness: &mut Harness, yaml: &str) -> ToolResult {
    let step = step(yaml);
    WhileTool
        .execute(&step, &mut harness.run_ctx())
        .await
        .unwrap()
}

#[tokio::test]
async fn loops_until_condition_false() {
    let mut harness = Harness::new().await;
    harness.context.set("count", "0");
    let result = execute(
        &mut harness,
        r#"
name: Count up
tool: while
condition: '{count} < 3'
max_iterations: 10
steps:
  - name: Bump
    tool: set
    var: count
    expr: '{count} + 1'
"#,
    )
    .await;

    assert!(result.success);
    assert_eq!(result.output.as_deref(), Some("Completed 3 iterations"));
    assert_eq!(harness.context.get("count"), Some(&json!("3")));
}

#[tokio::test]
async fn condition_false_immediately_runs_nothing() {
    let mut harness = Harness::new().await;
    harness.context.set("count", "5");
    let result = execute(
        &mut harness,
        r#"
name: Never
tool: while
condition: '{count} < 3'
max_iterations: 10
steps:
  - name: Bump
    tool: set
    var: touched
    value: 'yes'
"#,
    )
    .await;
    assert!(result.success);
    assert_eq!(result.output.as_deref(), Some("Completed 0 iterations"));
    assert!(harness.context.get("touched").is_none());
}

#[tokio::test]
async fn iteration_variable_visible_and_restored() {
    let mut harness = Harness::new().await;
    harness.context.set("count", "0");
    execute(
        &mut harness,
        r#"
name: Track
tool: while
condition: '{count} < 2'
max_iterations: 5
steps:
  - name: Remember
    tool: set
    var: last_iteration
    value: '{_iteration}'
  - name: Bump
    tool: set
    var: count
    expr: '{count} + 1'
"#,
    )
    .await;

    // 0-indexed and stringified inside the loop, removed after
    assert_eq!(harness.context.get("last_iteration"), Some(&json!("1")));
    assert!(harness.context.get("_iteration").is_none());
}

#[tokio::test]
async fn max_reached_with_error_policy_fails() {
    let mut harness = Harness::new().await;
    let result = execute(
        &mut harness,
        r#"
name: Forever
tool: while
condition: 'true'
max_iterations: 2
steps:
  - name: Noop
    tool: set
    var: x
    value: 1
"#,
    )
    .await;
    assert!(!result.success);
    assert!(result
        .error
        .unwrap()
        .contains("reached max_iterations (2) with condition still true"));
}

#[tokio::test]
async fn max_reached_with_continue_policy_succeeds() {
    let mut harness = Harness::new().await;
    let result = execute(
        &mut harness,
        r#"
name: Forever
tool: while
condition: 'true'
max_iterations: 2
on_max_reached: continue
steps:
  - name: Noop
    tool: set
    var: x
    value: 1
"#,
    )
    .await;
    assert!(result.success);
    assert_eq!(result.output.as_deref(), Some("Completed 2 iterations"));
}

#[tokio::test]
async fn nested_failure_fails_the_loop() {
    let mut harness = Harness::new().await;
    let result = execute(
        &mut harness,
        r#"
name: Fragile
tool: while
condition: 'true'
max_iterations: 5
steps:
  - name: Explode
    tool: shell
    command: exit 2
"#,
    )
    .await;
    assert!(!result.success);
    assert!(result
        .error
        .unwrap()
        .starts_with("While loop failed at iteration 0"));
}

#[tokio::test]
async fn break_exits_early() {
    let mut harness = Harness::new().await;
    harness.context.set("count", "0");
    let result = execute(
        &mut harness,
        r#"
name: Breakable
tool: while
condition: 'true'
max_iterations: 10
steps:
  - name: Bump
    tool: set
    var: count
    expr: '{count} + 1'
  - name: Bail
    tool: goto
    target: break
    when: '{count} == 2'
"#,
    )
    .await;
    assert!(result.success);
    assert_eq!(harness.context.get("count"), Some(&json!("2")));
}
