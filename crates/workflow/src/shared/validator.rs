// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Input validation for shared steps.

use std::collections::BTreeMap;

use jsonschema::JSONSchema;
use serde_json::Value;

use crate::shared::error::SharedStepError;
use crate::shared::types::{Definition, InputSpec};

/// Validate and prepare inputs for a shared step.
///
/// Checks required inputs, applies defaults for missing optional ones,
/// and validates values against their JSON Schemas when declared. Only
/// declared inputs survive into the result.
pub fn validate_inputs(
    definition: &Definition,
    provided: &BTreeMap<String, Value>,
) -> Result<BTreeMap<String, Value>, SharedStepError> {
    let mut result = BTreeMap::new();

    for input in &definition.inputs {
        let mut value = provided.get(&input.name).cloned().filter(|v| !v.is_null());

        if value.is_none() {
            if input.required {
                return Err(SharedStepError::RequiredInputMissing {
                    input: input.name.clone(),
                    step_id: definition.identifier.clone(),
                });
            }
            value = input.default.clone();
        }

        let value = value.unwrap_or(Value::Null);
        if !value.is_null() {
            if let Some(schema) = &input.schema {
                validate_schema(input, schema, &value, &definition.identifier)?;
            }
        }

        result.insert(input.name.clone(), value);
    }

    Ok(result)
}

fn validate_schema(
    input: &InputSpec,
    schema: &Value,
    value: &Value,
    step_id: &str,
) -> Result<(), SharedStepError> {
    let compiled = JSONSchema::compile(schema).map_err(|e| SharedStepError::InvalidSchema {
        input: input.name.clone(),
        step_id: step_id.to_string(),
        message: e.to_string(),
    })?;

    if let Err(errors) = compiled.validate(value) {
        let errors: Vec<String> = errors
            .map(|e| {
                let path = e.instance_path.to_string();
                let path = if path.is_empty() { "root".to_string() } else { path };
                format!("{path}: {e}")
            })
            .collect();
        return Err(SharedStepError::SchemaValidation {
            input: input.name.clone(),
            step_id: step_id.to_string(),
            errors,
        });
    }

    Ok(())
}

#[cfg(test)]
#[path = "validator_tests.rs"]
mod tests;
