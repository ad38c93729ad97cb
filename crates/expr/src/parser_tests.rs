// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::ast::Expr;
use crate::error::ExprError;
use crate::lexer::Lexer;

fn parse(input: &str) -> Result<Expr, ExprError> {
    Parser::new(Lexer::new(input).tokenize()).parse()
}

#[test]
fn parse_literal() {
    assert_eq!(parse("42").unwrap(), Expr::Number(42.0));
}

#[test]
fn parse_precedence_mul_over_add() {
    let expr = parse("1 + 2 * 3").unwrap();
    let Expr::Binary { op, rhs, .. } = expr else {
        panic!("expected binary, got {expr:?}");
    };
    assert_eq!(op, crate::token::Op::Plus);
    assert!(matches!(*rhs, Expr::Binary { .. }));
}

#[test]
fn parse_comparison_binds_looser_than_add() {
    let expr = parse("1 + 1 == 2").unwrap();
    let Expr::Binary { op, .. } = expr else {
        panic!("expected comparison, got {expr:?}");
    };
    assert!(op.is_comparison());
}

#[test]
fn parse_conditional_chain() {
    let expr = parse("if a then b else if c then d else e").unwrap();
    let Expr::If { else_value, .. } = expr else {
        panic!("expected conditional, got {expr:?}");
    };
    assert!(matches!(*else_value, Expr::If { .. }));
}

#[test]
fn parse_not_is_recursive() {
    let expr = parse("not not true").unwrap();
    assert!(matches!(expr, Expr::Not(inner) if matches!(*inner, Expr::Not(_))));
}

#[yare::parameterized(
    missing_then = { "if a b else c" },
    missing_else = { "if a then b" },
    unclosed_paren = { "(1 + 2" },
    dangling_op = { "1 +" },
    empty_parens = { "()" },
)]
fn parse_errors(input: &str) {
    assert!(parse(input).is_err());
}

#[test]
fn parse_trailing_tokens_rejected() {
    assert!(matches!(
        parse("1 2"),
        Err(ExprError::TrailingTokens { .. })
    ));
}
