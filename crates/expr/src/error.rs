// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for expression parsing and evaluation.

use crate::token::Span;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ExprError {
    #[error("unexpected end of expression")]
    UnexpectedEnd,

    #[error("expected 'then' in conditional at position {}", span.start)]
    ExpectedThen { span: Span },

    #[error("expected 'else' in conditional at position {}", span.start)]
    ExpectedElse { span: Span },

    #[error("missing closing parenthesis at position {}", span.start)]
    MissingCloseParen { span: Span },

    #[error("unexpected token '{text}' at position {}", span.start)]
    UnexpectedToken { text: String, span: Span },

    #[error("unexpected tokens after expression at position {}", span.start)]
    TrailingTokens { span: Span },

    #[error("cannot perform {op} on non-numbers: {lhs} {op} {rhs}")]
    NonNumericOperands {
        op: &'static str,
        lhs: String,
        rhs: String,
    },

    #[error("cannot negate non-number: {value}")]
    NonNumericNegation { value: String },

    #[error("division by zero")]
    DivisionByZero,

    #[error("modulo by zero")]
    ModuloByZero,
}
