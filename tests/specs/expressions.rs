// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Expression evaluator laws.

use sr_core::ExecutionContext;
use sr_expr::evaluate;

fn eval(input: &str) -> String {
    evaluate(&ExecutionContext::new("/tmp"), input).expect("expression evaluates")
}

#[test]
fn conditional_law() {
    assert_eq!(eval("if true then a else b"), "a");
    assert_eq!(eval("if false then a else b"), "b");
}

#[test]
fn arithmetic_law() {
    assert_eq!(eval("1 + 2"), "3");
}

#[test]
fn concatenation_law() {
    assert_eq!(eval("'x' + 'y'"), "xy");
}

#[test]
fn interpolation_law() {
    let mut context = ExecutionContext::new("/tmp");
    context.set("path", "value");
    assert_eq!(context.interpolate("<pre>{path}<post>"), "<pre>value<post>");
    assert_eq!(
        context.interpolate("<pre>{undefined}<post>"),
        "<pre>{undefined}<post>"
    );
}
