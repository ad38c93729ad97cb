// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::shared::types::{Definition, InputSpec, SourceKind};
use serde_json::json;
use std::collections::BTreeMap;

fn definition(inputs: Vec<InputSpec>) -> Definition {
    Definition {
        identifier: "project:test".to_string(),
        name: "Test".to_string(),
        description: String::new(),
        version: 1,
        inputs,
        outputs: Vec::new(),
        steps: Vec::new(),
        source_path: "step.yml".into(),
        source_kind: SourceKind::Project,
    }
}

fn provided(pairs: &[(&str, serde_json::Value)]) -> BTreeMap<String, serde_json::Value> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

#[test]
fn required_input_accepted() {
    let def = definition(vec![InputSpec::named("branch")]);
    let inputs = validate_inputs(&def, &provided(&[("branch", json!("main"))])).unwrap();
    assert_eq!(inputs.get("branch"), Some(&json!("main")));
}

#[test]
fn missing_required_input_rejected() {
    let def = definition(vec![InputSpec::named("branch")]);
    assert!(matches!(
        validate_inputs(&def, &BTreeMap::new()),
        Err(SharedStepError::RequiredInputMissing { .. })
    ));
}

#[test]
fn optional_input_gets_default() {
    let def = definition(vec![InputSpec {
        name: "depth".to_string(),
        description: String::new(),
        required: false,
        default: Some(json!(1)),
        schema: None,
    }]);
    let inputs = validate_inputs(&def, &BTreeMap::new()).unwrap();
    assert_eq!(inputs.get("depth"), Some(&json!(1)));
}

#[test]
fn optional_input_without_default_is_null() {
    let def = definition(vec![InputSpec {
        name: "label".to_string(),
        description: String::new(),
        required: false,
        default: None,
        schema: None,
    }]);
    let inputs = validate_inputs(&def, &BTreeMap::new()).unwrap();
    assert_eq!(inputs.get("label"), Some(&Value::Null));
}

#[test]
fn undeclared_inputs_are_dropped() {
    let def = definition(vec![InputSpec::named("branch")]);
    let inputs = validate_inputs(
        &def,
        &provided(&[("branch", json!("main")), ("extra", json!("x"))]),
    )
    .unwrap();
    assert!(!inputs.contains_key("extra"));
}

#[test]
fn schema_validation_passes() {
    let def = definition(vec![InputSpec {
        name: "count".to_string(),
        description: String::new(),
        required: true,
        default: None,
        schema: Some(json!({"type": "integer", "minimum": 0})),
    }]);
    assert!(validate_inputs(&def, &provided(&[("count", json!(3))])).is_ok());
}

#[test]
fn schema_validation_fails() {
    let def = definition(vec![InputSpec {
        name: "count".to_string(),
        description: String::new(),
        required: true,
        default: None,
        schema: Some(json!({"type": "integer"})),
    }]);
    assert!(matches!(
        validate_inputs(&def, &provided(&[("count", json!("three"))])),
        Err(SharedStepError::SchemaValidation { .. })
    ));
}
