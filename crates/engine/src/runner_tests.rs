// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::test_support::{steps, Harness};
use serde_json::json;

async fn run_list(harness: &mut Harness, yaml: &str) -> ListOutcome {
    let list = steps(yaml);
    let mut run = harness.run_ctx();
    run_step_list(&list, &mut run).await.expect("no hard error")
}

// =============================================================================
// Linear execution and output capture
// =============================================================================

#[tokio::test]
async fn linear_run_with_capture() {
    let mut harness = Harness::new().await;
    let outcome = run_list(
        &mut harness,
        r#"
- name: Set name
  tool: set
  var: name
  value: world
- name: Greet
  tool: shell
  command: echo hello {name}
  output_var: out
- name: Copy
  tool: set
  var: msg
  expr: '{out}'
"#,
    )
    .await;

    assert!(outcome.success);
    assert_eq!(outcome.completed, 3);
    assert_eq!(harness.context.get("out"), Some(&json!("hello world")));
    assert_eq!(harness.context.get("msg"), Some(&json!("hello world")));
}

#[tokio::test]
async fn output_var_receives_exact_tool_output() {
    let mut harness = Harness::new().await;
    run_list(
        &mut harness,
        r#"
- name: Produce
  tool: shell
  command: printf 'a b  c'
  output_var: captured
"#,
    )
    .await;
    assert_eq!(harness.context.get("captured"), Some(&json!("a b  c")));
}

#[tokio::test]
async fn empty_output_is_not_captured() {
    let mut harness = Harness::new().await;
    run_list(
        &mut harness,
        r#"
- name: Silent
  tool: shell
  command: 'true'
  output_var: nothing
"#,
    )
    .await;
    assert!(harness.context.get("nothing").is_none());
}

// =============================================================================
// Conditions
// =============================================================================

#[tokio::test]
async fn unsatisfied_when_skips_step() {
    let mut harness = Harness::new().await;
    harness.context.set("flag", "0");
    let outcome = run_list(
        &mut harness,
        r#"
- name: Skipped
  tool: set
  var: touched
  value: 'yes'
  when: '{flag} == 1'
- name: Always
  tool: set
  var: ran
  value: 'yes'
"#,
    )
    .await;

    assert!(outcome.success);
    assert_eq!(outcome.completed, 1);
    assert!(harness.context.get("touched").is_none());
    assert_eq!(harness.context.get("ran"), Some(&json!("yes")));
}

#[tokio::test]
async fn condition_error_follows_stop_policy() {
    let mut harness = Harness::new().await;
    let outcome = run_list(
        &mut harness,
        r#"
- name: Broken guard
  tool: set
  var: x
  value: 1
  when: '1 =='
"#,
    )
    .await;
    assert!(!outcome.success);
    assert_eq!(outcome.failed_step.as_deref(), Some("Broken guard"));
}

#[tokio::test]
async fn condition_error_with_continue_policy_skips() {
    let mut harness = Harness::new().await;
    let outcome = run_list(
        &mut harness,
        r#"
- name: Broken guard
  tool: set
  var: x
  value: 1
  when: '1 =='
  on_error: continue
- name: After
  tool: set
  var: after
  value: 'yes'
"#,
    )
    .await;
    assert!(outcome.success);
    assert!(harness.context.get("x").is_none());
    assert_eq!(harness.context.get("after"), Some(&json!("yes")));
}

// =============================================================================
// Error policy
// =============================================================================

#[tokio::test]
async fn failing_step_with_stop_ends_the_list() {
    let mut harness = Harness::new().await;
    let outcome = run_list(
        &mut harness,
        r#"
- name: Fail
  tool: shell
  command: exit 3
- name: Never
  tool: set
  var: reached
  value: 'yes'
"#,
    )
    .await;
    assert!(!outcome.success);
    assert_eq!(outcome.failed_step.as_deref(), Some("Fail"));
    assert!(harness.context.get("reached").is_none());
}

#[tokio::test]
async fn failing_step_with_continue_proceeds() {
    let mut harness = Harness::new().await;
    let outcome = run_list(
        &mut harness,
        r#"
- name: Fail
  tool: shell
  command: exit 3
  on_error: continue
- name: Next
  tool: set
  var: reached
  value: 'yes'
"#,
    )
    .await;
    assert!(outcome.success);
    assert_eq!(harness.context.get("reached"), Some(&json!("yes")));
}

// =============================================================================
// Goto
// =============================================================================

#[tokio::test]
async fn goto_recovery_path() {
    let mut harness = Harness::new().await;
    let outcome = run_list(
        &mut harness,
        r#"
- name: A
  tool: shell
  command: exit 1
  on_error: continue
  output_var: ec
- name: B
  tool: goto
  target: D
  when: '{ec}!=0'
- name: C
  tool: set
  var: msg
  value: ok
- name: D
  tool: set
  var: msg
  value: failed
"#,
    )
    .await;

    assert!(outcome.success);
    assert_eq!(harness.context.get("msg"), Some(&json!("failed")));
}

#[tokio::test]
async fn goto_can_jump_backward() {
    let mut harness = Harness::new().await;
    harness.context.set("count", "0");
    let outcome = run_list(
        &mut harness,
        r#"
- name: Increment
  tool: set
  var: count
  expr: '{count} + 1'
- name: Again
  tool: goto
  target: Increment
  when: '{count} < 3'
- name: Done
  tool: set
  var: done
  value: 'yes'
"#,
    )
    .await;

    assert!(outcome.success);
    assert_eq!(harness.context.get("count"), Some(&json!("3")));
    assert_eq!(harness.context.get("done"), Some(&json!("yes")));
}

#[tokio::test]
async fn unknown_goto_target_fails_the_list() {
    let mut harness = Harness::new().await;
    let outcome = run_list(
        &mut harness,
        r#"
- name: Jump
  tool: goto
  target: Nowhere
"#,
    )
    .await;
    assert!(!outcome.success);
    assert!(outcome.error.unwrap().contains("Nowhere"));
}

#[tokio::test]
async fn interpolated_goto_target() {
    let mut harness = Harness::new().await;
    harness.context.set("dest", "End");
    let outcome = run_list(
        &mut harness,
        r#"
- name: Jump
  tool: goto
  target: '{dest}'
- name: Skipped
  tool: set
  var: skipped
  value: 'yes'
- name: End
  tool: set
  var: ended
  value: 'yes'
"#,
    )
    .await;
    assert!(outcome.success);
    assert!(harness.context.get("skipped").is_none());
    assert_eq!(harness.context.get("ended"), Some(&json!("yes")));
}

// =============================================================================
// Hard errors
// =============================================================================

#[tokio::test]
async fn duplicate_step_names_are_a_hard_error() {
    let mut harness = Harness::new().await;
    let list = steps(
        r#"
- name: Twin
  tool: set
  var: a
  value: 1
- name: Twin
  tool: set
  var: b
  value: 2
"#,
    );
    let mut run = harness.run_ctx();
    let result = run_step_list(&list, &mut run).await;
    assert!(matches!(result, Err(EngineError::DuplicateStepName { .. })));
}

#[tokio::test]
async fn step_names_interpolate_for_display() {
    let mut harness = Harness::new().await;
    harness.context.set("target", "prod");
    let outcome = run_list(
        &mut harness,
        r#"
- name: Deploy to {target}
  tool: set
  var: deployed
  value: 'yes'
"#,
    )
    .await;
    assert!(outcome.success);
    assert_eq!(
        harness.stats.step_times[0].0,
        "Deploy to prod"
    );
}
