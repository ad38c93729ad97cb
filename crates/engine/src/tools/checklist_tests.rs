// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::test_support::{step, Harness};

async fn execute(harness: &mut Harness, yaml: &str) -> ToolResult {
    let step = step(yaml);
    ChecklistTool
        .execute(&step, &mut harness.run_ctx())
        .await
        .unwrap()
}

// =============================================================================
// Bash checks
// =============================================================================

#[tokio::test]
async fn exit_code_check_passes() {
    let mut harness = Harness::new().await;
    let result = execute(
        &mut harness,
        r#"
name: Checks
tool: checklist
items:
  - name: always ok
    type: bash
    command: 'true'
"#,
    )
    .await;
    assert!(result.success);
    assert!(result.output.unwrap().contains("Status: PASSED (1/1 checks passed)"));
}

#[tokio::test]
async fn expect_compares_output() {
    let mut harness = Harness::new().await;
    let result = execute(
        &mut harness,
        r#"
name: Checks
tool: checklist
on_fail: stop
items:
  - name: version match
    type: bash
    command: echo v2
    expect: v2
  - name: version mismatch
    type: bash
    command: echo v2
    expect: v3
    severity: error
"#,
    )
    .await;
    assert!(!result.success);
    let output = result.output.unwrap();
    assert!(output.contains("Status: FAILED (1/2 checks passed)"));
    assert!(output.contains("Expected 'v3', got 'v2'"));
}

#[tokio::test]
async fn expect_not_flags_forbidden_output() {
    let mut harness = Harness::new().await;
    let result = execute(
        &mut harness,
        r#"
name: Checks
tool: checklist
on_fail: stop
items:
  - name: no todo markers
    type: bash
    command: echo TODO later
    expect_not: TODO
"#,
    )
    .await;
    assert!(!result.success);
}

#[tokio::test]
async fn expect_regex_matches_output() {
    let mut harness = Harness::new().await;
    let result = execute(
        &mut harness,
        r#"
name: Checks
tool: checklist
on_fail: stop
items:
  - name: semver
    type: bash
    command: echo 1.2.3
    expect_regex: '^\d+\.\d+\.\d+$'
"#,
    )
    .await;
    assert!(result.success);
}

#[tokio::test]
async fn check_commands_interpolate() {
    let mut harness = Harness::new().await;
    harness.context.set("expected", "ready");
    let result = execute(
        &mut harness,
        r#"
name: Checks
tool: checklist
on_fail: stop
items:
  - name: interpolated
    type: bash
    command: echo {expected}
    expect: ready
"#,
    )
    .await;
    assert!(result.success);
}

// =============================================================================
// Model-check context sections
// =============================================================================

#[test]
fn empty_context_values_are_skipped() {
    use serde_json::json;
    for empty in [json!(null), json!(""), json!(0), json!(false), json!([]), json!({})] {
        assert!(!has_content(&empty), "expected {empty} to be skipped");
    }
    for full in [json!("text"), json!(1), json!(true), json!(["x"]), json!({"a": 1})] {
        assert!(has_content(&full), "expected {full} to be kept");
    }
}

// =============================================================================
// Aggregation policies
// =============================================================================

const MIXED: &str = r#"
name: Checks
tool: checklist
on_fail: {policy}
items:
  - name: ok
    type: bash
    command: 'true'
  - name: warns
    type: bash
    command: 'false'
    severity: warning
"#;

async fn run_policy(policy: &str) -> ToolResult {
    let mut harness = Harness::new().await;
    let yaml = MIXED.replace("{policy}", policy);
    execute(&mut harness, &yaml).await
}

#[tokio::test]
async fn stop_fails_on_warnings() {
    assert!(!run_policy("stop").await.success);
}

#[tokio::test]
async fn warn_tolerates_warnings() {
    assert!(run_policy("warn").await.success);
}

#[tokio::test]
async fn warn_fails_on_errors() {
    let mut harness = Harness::new().await;
    let result = execute(
        &mut harness,
        r#"
name: Checks
tool: checklist
on_fail: warn
items:
  - name: broken
    type: bash
    command: 'false'
    severity: error
"#,
    )
    .await;
    assert!(!result.success);
}

#[tokio::test]
async fn continue_always_succeeds() {
    let mut harness = Harness::new().await;
    let result = execute(
        &mut harness,
        r#"
name: Checks
tool: checklist
on_fail: continue
items:
  - name: broken
    type: bash
    command: 'false'
    severity: error
"#,
    )
    .await;
    assert!(result.success);
}

// =============================================================================
// Checklist files
// =============================================================================

#[tokio::test]
async fn loads_checklist_from_file() {
    let mut harness = Harness::new().await;
    let dir = harness.project.path().join(".claude").join("checklists");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(
        dir.join("release.yaml"),
        r#"
name: Release gate
on_fail: stop
items:
  - name: ok
    type: bash
    command: 'true'
"#,
    )
    .unwrap();

    let result = execute(
        &mut harness,
        "name: C\ntool: checklist\nchecklist: release",
    )
    .await;
    assert!(result.success);
    assert!(result.output.unwrap().contains("## Checklist: Release gate"));
}

#[tokio::test]
async fn step_on_fail_overrides_file_policy() {
    let mut harness = Harness::new().await;
    let dir = harness.project.path().join(".claude").join("checklists");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(
        dir.join("gate.yml"),
        r#"
name: Gate
on_fail: stop
items:
  - name: warns
    type: bash
    command: 'false'
    severity: warning
"#,
    )
    .unwrap();

    let result = execute(
        &mut harness,
        "name: C\ntool: checklist\nchecklist: gate\non_fail: continue",
    )
    .await;
    assert!(result.success);
}

#[tokio::test]
async fn missing_checklist_file_fails() {
    let mut harness = Harness::new().await;
    let result = execute(
        &mut harness,
        "name: C\ntool: checklist\nchecklist: absent",
    )
    .await;
    assert!(!result.success);
    assert_eq!(
        result.error.as_deref(),
        Some("Failed to load checklist configuration")
    );
}
