// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn op_symbols_round_trip() {
    for op in [
        Op::Eq,
        Op::Ne,
        Op::Ge,
        Op::Le,
        Op::Gt,
        Op::Lt,
        Op::Plus,
        Op::Minus,
        Op::Star,
        Op::Slash,
        Op::Percent,
    ] {
        assert!(!op.symbol().is_empty());
    }
}

#[test]
fn comparison_classification() {
    assert!(Op::Eq.is_comparison());
    assert!(Op::Le.is_comparison());
    assert!(!Op::Plus.is_comparison());
    assert!(!Op::Percent.is_comparison());
}

#[test]
fn describe_is_readable() {
    assert_eq!(TokenKind::Op(Op::Ne).describe(), "!=");
    assert_eq!(TokenKind::Bool(true).describe(), "true");
    assert_eq!(TokenKind::If.describe(), "if");
}
