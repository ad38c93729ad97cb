// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Condition evaluation for `when`, `until`, and loop predicates.

use sr_core::ExecutionContext;
use thiserror::Error;

use crate::error::ExprError;
use crate::eval::{evaluate_raw, is_truthy_str};

/// Outcome of a condition check.
///
/// `reason` is the fully interpolated condition text, used by the display
/// layer to explain why a step was skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConditionOutcome {
    pub satisfied: bool,
    pub reason: String,
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConditionError {
    #[error("invalid condition '{condition}': {source}")]
    Invalid {
        condition: String,
        source: ExprError,
    },
}

/// Evaluate a condition template against the context.
///
/// The template is interpolated, evaluated as an expression, and the
/// result coerced to a boolean by string truthiness.
pub fn evaluate_condition(
    context: &ExecutionContext,
    condition: &str,
) -> Result<ConditionOutcome, ConditionError> {
    let reason = context.interpolate(condition);
    let result = evaluate_raw(&reason).map_err(|source| ConditionError::Invalid {
        condition: reason.clone(),
        source,
    })?;
    Ok(ConditionOutcome {
        satisfied: is_truthy_str(&result),
        reason,
    })
}

#[cfg(test)]
#[path = "condition_tests.rs"]
mod tests;
