// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::token::{Op, TokenKind};

fn kinds(input: &str) -> Vec<TokenKind> {
    Lexer::new(input)
        .tokenize()
        .into_iter()
        .map(|t| t.kind)
        .collect()
}

// =============================================================================
// Literals
// =============================================================================

#[test]
fn lex_integer() {
    assert_eq!(kinds("42"), [TokenKind::Number(42.0)]);
}

#[test]
fn lex_float() {
    assert_eq!(kinds("3.5"), [TokenKind::Number(3.5)]);
}

#[test]
fn lex_signed_number() {
    // A minus directly followed by a digit is part of the number
    assert_eq!(kinds("-7"), [TokenKind::Number(-7.0)]);
}

#[test]
fn lex_minus_with_space_is_operator() {
    assert_eq!(
        kinds("1 - 2"),
        [
            TokenKind::Number(1.0),
            TokenKind::Op(Op::Minus),
            TokenKind::Number(2.0),
        ]
    );
}

#[test]
fn lex_double_quoted_string() {
    assert_eq!(kinds(r#""hello world""#), [TokenKind::Str("hello world".into())]);
}

#[test]
fn lex_single_quoted_string() {
    assert_eq!(kinds("'x y'"), [TokenKind::Str("x y".into())]);
}

#[test]
fn lex_empty_string() {
    assert_eq!(kinds("''"), [TokenKind::Str(String::new())]);
}

#[yare::parameterized(
    lower = { "true", true },
    upper = { "TRUE", true },
    mixed = { "False", false },
)]
fn lex_bool_case_insensitive(input: &str, expected: bool) {
    assert_eq!(kinds(input), [TokenKind::Bool(expected)]);
}

#[test]
fn lex_bareword_as_string() {
    assert_eq!(kinds("passed"), [TokenKind::Str("passed".into())]);
}

// =============================================================================
// Keywords and operators
// =============================================================================

#[test]
fn lex_keywords_case_insensitive() {
    assert_eq!(
        kinds("IF x THEN y ELSE z"),
        [
            TokenKind::If,
            TokenKind::Str("x".into()),
            TokenKind::Then,
            TokenKind::Str("y".into()),
            TokenKind::Else,
            TokenKind::Str("z".into()),
        ]
    );
}

#[test]
fn lex_comparison_operators() {
    assert_eq!(
        kinds("a == b != c >= d <= e > f < g"),
        [
            TokenKind::Str("a".into()),
            TokenKind::Op(Op::Eq),
            TokenKind::Str("b".into()),
            TokenKind::Op(Op::Ne),
            TokenKind::Str("c".into()),
            TokenKind::Op(Op::Ge),
            TokenKind::Str("d".into()),
            TokenKind::Op(Op::Le),
            TokenKind::Str("e".into()),
            TokenKind::Op(Op::Gt),
            TokenKind::Str("f".into()),
            TokenKind::Op(Op::Lt),
            TokenKind::Str("g".into()),
        ]
    );
}

#[test]
fn lex_parens() {
    assert_eq!(
        kinds("(1)"),
        [
            TokenKind::LParen,
            TokenKind::Number(1.0),
            TokenKind::RParen,
        ]
    );
}

// =============================================================================
// Raw fallback
// =============================================================================

#[test]
fn unmatched_input_becomes_raw_token() {
    assert_eq!(kinds("@oddball"), [TokenKind::Str("@oddball".into())]);
}

#[test]
fn unterminated_quote_becomes_raw_token() {
    assert_eq!(kinds("'open"), [TokenKind::Str("'open".into())]);
}

#[test]
fn raw_token_swallows_rest() {
    assert_eq!(
        kinds("1 + @junk more"),
        [
            TokenKind::Number(1.0),
            TokenKind::Op(Op::Plus),
            TokenKind::Str("@junk more".into()),
        ]
    );
}

#[test]
fn empty_input_has_no_tokens() {
    assert!(kinds("").is_empty());
    assert!(kinds("   ").is_empty());
}
