// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Expression evaluation.
//!
//! Evaluation is eager: both arms of a conditional and both sides of
//! `and`/`or` are computed before the result is chosen, so an error
//! anywhere in the expression always surfaces.

use sr_core::ExecutionContext;

use crate::ast::Expr;
use crate::error::ExprError;
use crate::lexer::Lexer;
use crate::parser::Parser;
use crate::token::Op;

/// An evaluated expression value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Num(f64),
    Str(String),
    Bool(bool),
}

impl Value {
    /// Numeric view: numbers directly, strings that parse as numbers.
    fn as_number(&self) -> Option<f64> {
        match self {
            Value::Num(n) => Some(*n),
            Value::Str(s) => s.trim().parse().ok(),
            Value::Bool(_) => None,
        }
    }

    /// Truthiness: booleans as themselves, numbers nonzero, strings false
    /// only for the empty/false/0/null/none spellings.
    fn is_truthy(&self) -> bool {
        match self {
            Value::Bool(b) => *b,
            Value::Num(n) => *n != 0.0,
            Value::Str(s) => is_truthy_str(s),
        }
    }

    /// Canonical string form: integers render without a decimal point.
    fn into_string(self) -> String {
        match self {
            Value::Str(s) => s,
            Value::Bool(b) => b.to_string(),
            Value::Num(n) => format_number(n),
        }
    }
}

/// String truthiness used by conditions and the evaluator.
pub fn is_truthy_str(s: &str) -> bool {
    !matches!(s.to_lowercase().as_str(), "" | "false" | "0" | "null" | "none")
}

fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 {
        format!("{:.0}", n)
    } else {
        n.to_string()
    }
}

/// Evaluate an expression against a context and return the stringified
/// result.
///
/// The raw input is interpolated through the context first, so `{var}`
/// placeholders become their resolved values before tokenization. An
/// input producing no tokens evaluates to the interpolated text itself.
pub fn evaluate(context: &ExecutionContext, expression: &str) -> Result<String, ExprError> {
    let interpolated = context.interpolate(expression);
    evaluate_raw(&interpolated)
}

/// Evaluate an already-interpolated expression string.
pub fn evaluate_raw(input: &str) -> Result<String, ExprError> {
    let tokens = Lexer::new(input).tokenize();
    if tokens.is_empty() {
        return Ok(input.to_string());
    }
    let expr = Parser::new(tokens).parse()?;
    Ok(eval_expr(&expr)?.into_string())
}

fn eval_expr(expr: &Expr) -> Result<Value, ExprError> {
    match expr {
        Expr::Number(n) => Ok(Value::Num(*n)),
        Expr::Str(s) => Ok(Value::Str(s.clone())),
        Expr::Bool(b) => Ok(Value::Bool(*b)),

        Expr::If {
            cond,
            then_value,
            else_value,
        } => {
            let cond = eval_expr(cond)?;
            let then_value = eval_expr(then_value)?;
            let else_value = eval_expr(else_value)?;
            Ok(if cond.is_truthy() { then_value } else { else_value })
        }

        Expr::Or(lhs, rhs) => {
            let lhs = eval_expr(lhs)?;
            let rhs = eval_expr(rhs)?;
            Ok(Value::Bool(lhs.is_truthy() || rhs.is_truthy()))
        }

        Expr::And(lhs, rhs) => {
            let lhs = eval_expr(lhs)?;
            let rhs = eval_expr(rhs)?;
            Ok(Value::Bool(lhs.is_truthy() && rhs.is_truthy()))
        }

        Expr::Not(value) => {
            let value = eval_expr(value)?;
            Ok(Value::Bool(!value.is_truthy()))
        }

        Expr::Binary { op, lhs, rhs, .. } => {
            let lhs = eval_expr(lhs)?;
            let rhs = eval_expr(rhs)?;
            if op.is_comparison() {
                eval_comparison(*op, lhs, rhs)
            } else {
                eval_arithmetic(*op, lhs, rhs)
            }
        }

        Expr::Neg { value, .. } => {
            let value = eval_expr(value)?;
            match value.as_number() {
                Some(n) => Ok(Value::Num(-n)),
                None => Err(ExprError::NonNumericNegation {
                    value: value.into_string(),
                }),
            }
        }
    }
}

fn eval_comparison(op: Op, lhs: Value, rhs: Value) -> Result<Value, ExprError> {
    // Numeric comparison when both sides are numbers, else string compare
    let ordering = match (lhs.as_number(), rhs.as_number()) {
        (Some(l), Some(r)) => l.partial_cmp(&r),
        _ => Some(lhs.into_string().cmp(&rhs.into_string())),
    };

    let result = match (op, ordering) {
        (Op::Eq, ord) => ord == Some(std::cmp::Ordering::Equal),
        (Op::Ne, ord) => ord != Some(std::cmp::Ordering::Equal),
        (Op::Gt, ord) => ord == Some(std::cmp::Ordering::Greater),
        (Op::Lt, ord) => ord == Some(std::cmp::Ordering::Less),
        (Op::Ge, ord) => matches!(
            ord,
            Some(std::cmp::Ordering::Greater | std::cmp::Ordering::Equal)
        ),
        (Op::Le, ord) => matches!(
            ord,
            Some(std::cmp::Ordering::Less | std::cmp::Ordering::Equal)
        ),
        _ => false,
    };
    Ok(Value::Bool(result))
}

fn eval_arithmetic(op: Op, lhs: Value, rhs: Value) -> Result<Value, ExprError> {
    let numbers = (lhs.as_number(), rhs.as_number());

    match op {
        Op::Plus => match numbers {
            (Some(l), Some(r)) => Ok(Value::Num(l + r)),
            _ => Ok(Value::Str(format!(
                "{}{}",
                lhs.into_string(),
                rhs.into_string()
            ))),
        },
        Op::Minus | Op::Star | Op::Slash | Op::Percent => {
            let (Some(l), Some(r)) = numbers else {
                return Err(ExprError::NonNumericOperands {
                    op: op.symbol(),
                    lhs: lhs.into_string(),
                    rhs: rhs.into_string(),
                });
            };
            match op {
                Op::Minus => Ok(Value::Num(l - r)),
                Op::Star => Ok(Value::Num(l * r)),
                Op::Slash => {
                    if r == 0.0 {
                        Err(ExprError::DivisionByZero)
                    } else {
                        Ok(Value::Num(l / r))
                    }
                }
                _ => {
                    if r == 0.0 {
                        Err(ExprError::ModuloByZero)
                    } else {
                        // Floored modulo: the result takes the divisor's sign
                        Ok(Value::Num(l - r * (l / r).floor()))
                    }
                }
            }
        }
        _ => Err(ExprError::NonNumericOperands {
            op: op.symbol(),
            lhs: lhs.into_string(),
            rhs: rhs.into_string(),
        }),
    }
}

#[cfg(test)]
#[path = "eval_tests.rs"]
mod tests;
