// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use sr_core::ExecutionContext;

fn ctx() -> ExecutionContext {
    ExecutionContext::new("/tmp/project")
}

#[test]
fn satisfied_condition() {
    let mut ctx = ctx();
    ctx.set("ec", "0");
    let outcome = evaluate_condition(&ctx, "{ec} == 0").unwrap();
    assert!(outcome.satisfied);
    assert_eq!(outcome.reason, "0 == 0");
}

#[test]
fn unsatisfied_condition() {
    let mut ctx = ctx();
    ctx.set("ec", "1");
    let outcome = evaluate_condition(&ctx, "{ec} == 0").unwrap();
    assert!(!outcome.satisfied);
    assert_eq!(outcome.reason, "1 == 0");
}

#[test]
fn reason_is_interpolated_text() {
    let mut ctx = ctx();
    ctx.set("tests", "0");
    ctx.set("retries", "1");
    let outcome = evaluate_condition(&ctx, "{tests} != 0 and {retries} < 3").unwrap();
    assert_eq!(outcome.reason, "0 != 0 and 1 < 3");
    assert!(!outcome.satisfied);
}

#[test]
fn bare_variable_uses_truthiness() {
    let mut ctx = ctx();
    ctx.set("flag", "true");
    assert!(evaluate_condition(&ctx, "{flag}").unwrap().satisfied);
    ctx.set("flag", "0");
    assert!(!evaluate_condition(&ctx, "{flag}").unwrap().satisfied);
}

#[test]
fn undefined_variable_is_truthy_literal() {
    // The placeholder passes through and a non-empty string is truthy
    let outcome = evaluate_condition(&ctx(), "{missing}").unwrap();
    assert!(outcome.satisfied);
    assert_eq!(outcome.reason, "{missing}");
}

#[test]
fn malformed_condition_errors() {
    assert!(evaluate_condition(&ctx(), "1 ==").is_err());
}
