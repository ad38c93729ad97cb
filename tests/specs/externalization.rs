// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Large-variable externalization at the prompt boundary.

use sr_core::{ExecutionContext, LARGE_VARIABLE_THRESHOLD};

#[test]
fn oversized_variable_becomes_file_reference() {
    let temp = tempfile::tempdir().unwrap();
    let mut context = ExecutionContext::new("/tmp/project");
    context.set_temp_dir(temp.path());

    let content = "x".repeat(12_000);
    context.set("big", content.clone());

    let prompt = context.interpolate_externalized("{big}").unwrap();
    let file = prompt.strip_prefix('@').expect("@file reference");
    assert!(file.ends_with("big.txt"));
    assert_eq!(std::fs::read_to_string(file).unwrap(), content);
}

#[test]
fn threshold_boundary() {
    let temp = tempfile::tempdir().unwrap();
    let mut context = ExecutionContext::new("/tmp/project");
    context.set_temp_dir(temp.path());

    context.set("exact", "y".repeat(LARGE_VARIABLE_THRESHOLD));
    let inline = context.interpolate_externalized("{exact}").unwrap();
    assert!(!inline.starts_with('@'));

    context.set("over", "y".repeat(LARGE_VARIABLE_THRESHOLD + 1));
    let external = context.interpolate_externalized("{over}").unwrap();
    assert!(external.starts_with('@'));
}
