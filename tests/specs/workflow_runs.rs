// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! End-to-end workflow runs through the runner, using a context export
//! step to observe final variable state.

use std::path::Path;
use std::sync::Arc;

use serde_json::json;
use sr_engine::{EngineError, SilentProgress, ToolRegistry, WorkflowRunner};
use sr_workflow::load_workflow;

/// Run a workflow body and return the exported context.
async fn run_and_export(project: &Path, steps_yaml: &str) -> serde_json::Value {
    let export_path = project.join("context.json");
    let body = format!(
        "type: claude-workflow\nversion: 2\nname: Spec\nsteps:\n{steps_yaml}\
         \n  - name: Export context\n    tool: context\n    action: export\n    file: '{}'\n",
        export_path.display()
    );
    let claude_dir = project.join(".claude");
    std::fs::create_dir_all(&claude_dir).unwrap();
    let file = claude_dir.join("workflow.yml");
    std::fs::write(&file, body).unwrap();

    let workflow = load_workflow(&file).unwrap();
    let runner = WorkflowRunner::new(
        workflow,
        project,
        ToolRegistry::standard(),
        Arc::new(SilentProgress),
    );
    runner.run(0).await.expect("workflow succeeds");

    serde_json::from_str(&std::fs::read_to_string(&export_path).unwrap()).unwrap()
}

#[tokio::test]
async fn linear_run_with_capture() {
    let project = tempfile::tempdir().unwrap();
    let context = run_and_export(
        project.path(),
        r#"  - name: Set name
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
    expr: '{out}'"#,
    )
    .await;

    assert_eq!(context["out"], json!("hello world"));
    assert_eq!(context["msg"], json!("hello world"));
}

#[tokio::test]
async fn goto_recovery() {
    let project = tempfile::tempdir().unwrap();
    let context = run_and_export(
        project.path(),
        r#"  - name: A
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
    value: failed"#,
    )
    .await;

    assert_eq!(context["msg"], json!("failed"));
}

#[tokio::test]
async fn retry_until_second_attempt() {
    let project = tempfile::tempdir().unwrap();
    let context = run_and_export(
        project.path(),
        r#"  - name: Retry
    tool: retry
    max_attempts: 3
    until: '{ec} == 0'
    steps:
      - name: Probe
        tool: shell
        command: 'test {_attempt} -eq 2; echo $?'
        output_var: ec"#,
    )
    .await;

    assert_eq!(context["_retry_attempts"], json!("2"));
    assert_eq!(context["_retry_succeeded"], json!("true"));
}

#[tokio::test]
async fn foreach_over_json_source() {
    let project = tempfile::tempdir().unwrap();
    let context = run_and_export(
        project.path(),
        r#"  - name: Seed
    tool: set
    var: items
    value: '[{"id":1},{"id":2}]'
  - name: Loop
    tool: foreach
    source: items
    item_var: it
    steps:
      - name: Remember
        tool: set
        var: last
        expr: '{it}'"#,
    )
    .await;

    assert_eq!(context["last"], json!(r#"{"id":2}"#));
}

#[tokio::test]
async fn failing_step_surfaces_as_step_error() {
    let project = tempfile::tempdir().unwrap();
    let claude_dir = project.path().join(".claude");
    std::fs::create_dir_all(&claude_dir).unwrap();
    let file = claude_dir.join("workflow.yml");
    std::fs::write(
        &file,
        "type: claude-workflow\nversion: 2\nname: Doomed\nsteps:\n\
         \x20 - name: Explode\n    tool: shell\n    command: exit 9\n",
    )
    .unwrap();

    let workflow = load_workflow(&file).unwrap();
    let runner = WorkflowRunner::new(
        workflow,
        project.path(),
        ToolRegistry::standard(),
        Arc::new(SilentProgress),
    );
    let error = runner.run(0).await.unwrap_err();
    let EngineError::Step { step, .. } = &error else {
        panic!("expected step error, got {error:?}");
    };
    assert_eq!(step, "Explode");
    assert_eq!(error.exit_code(), 1);
}

#[tokio::test]
async fn run_report_counts_completed_steps() {
    let project = tempfile::tempdir().unwrap();
    let claude_dir = project.path().join(".claude");
    std::fs::create_dir_all(&claude_dir).unwrap();
    let file = claude_dir.join("workflow.yml");
    std::fs::write(
        &file,
        "type: claude-workflow\nversion: 2\nname: Timed\nsteps:\n\
         \x20 - name: One\n    tool: set\n    var: a\n    value: 1\n\
         \x20 - name: Two\n    tool: set\n    var: b\n    value: 2\n",
    )
    .unwrap();

    let workflow = load_workflow(&file).unwrap();
    let runner = WorkflowRunner::new(
        workflow,
        project.path(),
        ToolRegistry::standard(),
        Arc::new(SilentProgress),
    );
    let report = runner.run(0).await.unwrap();
    assert_eq!(report.completed, 2);
    assert_eq!(report.step_times.len(), 2);
    assert_eq!(report.step_times[0].0, "One");
}
