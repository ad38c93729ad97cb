// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! CLI surface: exit codes and non-interactive selection.

use assert_cmd::Command;
use std::path::Path;

const WORKFLOW: &str = "\
type: claude-workflow
version: 2
name: Build
steps:
  - name: List
    tool: shell
    command: ls
";

fn sr() -> Command {
    let mut cmd = Command::cargo_bin("sr").expect("sr binary builds");
    cmd.env_remove("TMUX");
    cmd
}

fn project_with_workflow() -> tempfile::TempDir {
    let project = tempfile::tempdir().unwrap();
    write_workflow(project.path());
    project
}

fn write_workflow(project: &Path) {
    let claude_dir = project.join(".claude");
    std::fs::create_dir_all(&claude_dir).unwrap();
    std::fs::write(claude_dir.join("workflow.yml"), WORKFLOW).unwrap();
}

#[test]
fn refuses_to_run_outside_tmux() {
    let project = project_with_workflow();
    let output = sr().arg(project.path()).output().unwrap();
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("tmux"));
}

#[test]
fn missing_project_path_exits_one() {
    let output = sr().arg("/definitely/not/here").output().unwrap();
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Project path not found"));
}

#[test]
fn list_prints_workflows_without_tmux() {
    let project = project_with_workflow();
    let output = sr().arg(project.path()).arg("--list").output().unwrap();
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("Build"));
}

#[test]
fn list_with_no_workflows_exits_one() {
    let project = tempfile::tempdir().unwrap();
    let output = sr().arg(project.path()).arg("--list").output().unwrap();
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn conflicting_selection_flags_exit_one() {
    let project = project_with_workflow();
    let output = sr()
        .arg(project.path())
        .env("TMUX", "/tmp/tmux-1000/default,1234,0")
        .args(["-w", "Build", "-f", "x.yml"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Cannot use both"));
}
