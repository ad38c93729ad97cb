// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::test_support::{step, Harness};
use serde_json::json;

async fn execute(harness: &mut Harness, yaml: &str) -> ToolResult {
    let step = step(yaml);
    ContextTool
        .execute(&step, &mut harness.run_ctx())
        .await
        .unwrap()
}

#[tokio::test]
async fn set_assigns_interpolated_values() {
    let mut harness = Harness::new().await;
    harness.context.set("base", "v1");
    let result = execute(
        &mut harness,
        "name: C\ntool: context\naction: set\nvalues:\n  release: '{base}-final'\n  count: 3",
    )
    .await;
    assert!(result.success);
    assert_eq!(harness.context.get("release"), Some(&json!("v1-final")));
    assert_eq!(harness.context.get("count"), Some(&json!("3")));
}

#[tokio::test]
async fn copy_mirrors_variables() {
    let mut harness = Harness::new().await;
    harness.context.set("src", "payload");
    let result = execute(
        &mut harness,
        "name: C\ntool: context\naction: copy\nmappings:\n  src: dst",
    )
    .await;
    assert!(result.success);
    assert_eq!(harness.context.get("dst"), Some(&json!("payload")));
}

#[tokio::test]
async fn copy_reports_missing_sources() {
    let mut harness = Harness::new().await;
    let result = execute(
        &mut harness,
        "name: C\ntool: context\naction: copy\nmappings:\n  ghost: dst",
    )
    .await;
    assert!(result.success);
    assert!(result.output.unwrap().contains("Not found: ghost"));
    assert!(harness.context.get("dst").is_none());
}

#[tokio::test]
async fn clear_removes_listed_variables() {
    let mut harness = Harness::new().await;
    harness.context.set("a", "1");
    harness.context.set("b", "2");
    let result = execute(
        &mut harness,
        "name: C\ntool: context\naction: clear\nvars:\n  - a\n  - missing",
    )
    .await;
    assert!(result.success);
    assert!(result.output.unwrap().contains("Cleared 1 variable(s): a"));
    assert!(harness.context.get("a").is_none());
    assert_eq!(harness.context.get("b"), Some(&json!("2")));
}

#[tokio::test]
async fn export_writes_whole_context() {
    let mut harness = Harness::new().await;
    harness.context.set("x", "1");
    let out = harness.project.path().join("ctx.json");
    let yaml = format!("name: C\ntool: context\naction: export\nfile: '{}'", out.display());
    let result = execute(&mut harness, &yaml).await;
    assert!(result.success);

    let exported: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(exported.get("x"), Some(&json!("1")));
    assert!(exported.get("_temp_dir").is_some());
}

#[tokio::test]
async fn export_with_filter() {
    let mut harness = Harness::new().await;
    harness.context.set("keep", "yes");
    harness.context.set("drop", "no");
    let out = harness.project.path().join("ctx.json");
    let yaml = format!(
        "name: C\ntool: context\naction: export\nfile: '{}'\nvars:\n  - keep",
        out.display()
    );
    execute(&mut harness, &yaml).await;

    let exported: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(exported, json!({"keep": "yes"}));
}
