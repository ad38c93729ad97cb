// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Resolver for `uses:` references.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::shared::error::SharedStepError;
use crate::shared::types::{Definition, InputSpec, OutputSpec, SourceKind};
use crate::step::{compile_steps, yaml_to_json, RawStep};

/// Marker fields every shared-step file must carry.
pub const STEP_TYPE: &str = "claude-step";
pub const STEP_VERSION: u32 = 1;

/// Resolves `prefix:name` references to parsed [`Definition`]s.
///
/// - `builtin:` resolves steps shipped alongside the binary.
/// - `project:` resolves `<project>/.claude/workflows/steps/<name>/step.yml`.
/// - `path:` resolves relative to the workflow file's directory.
///
/// Definitions are cached by identifier after first resolution.
pub struct Resolver {
    project_path: PathBuf,
    workflow_dir: PathBuf,
    builtin_dir: Option<PathBuf>,
    cache: HashMap<String, Definition>,
}

impl Resolver {
    pub fn new(project_path: impl Into<PathBuf>, workflow_dir: Option<PathBuf>) -> Self {
        let project_path = project_path.into();
        let workflow_dir = workflow_dir.unwrap_or_else(|| project_path.join(".claude"));
        Self {
            project_path,
            workflow_dir,
            builtin_dir: builtin_steps_dir(),
            cache: HashMap::new(),
        }
    }

    fn project_steps_dir(&self) -> PathBuf {
        self.project_path
            .join(".claude")
            .join("workflows")
            .join("steps")
    }

    /// Resolve a `uses:` reference.
    pub fn resolve(&mut self, uses: &str) -> Result<&Definition, SharedStepError> {
        if self.cache.contains_key(uses) {
            // Borrow-checker friendly double lookup on the cached path
            return Ok(&self.cache[uses]);
        }

        let Some((prefix, name)) = uses.split_once(':') else {
            return Err(SharedStepError::InvalidReference {
                uses: uses.to_string(),
            });
        };

        let mut searched = Vec::new();
        let file = match prefix.to_lowercase().as_str() {
            "builtin" => {
                let base = self.builtin_dir.clone().unwrap_or_default();
                probe_step_dir(&base.join(name), &mut searched)
            }
            "project" => probe_step_dir(&self.project_steps_dir().join(name), &mut searched),
            "path" => {
                let mut found = probe_step_dir(&self.workflow_dir.join(name), &mut searched);
                if found.is_none() {
                    // The name may point directly at a file or a bare dir
                    let direct = self.workflow_dir.join(name);
                    let candidate = match direct.extension().and_then(|e| e.to_str()) {
                        Some("yml") | Some("yaml") => direct,
                        _ => direct.join("step.yml"),
                    };
                    searched.push(candidate.display().to_string());
                    if candidate.is_file() {
                        found = Some(candidate);
                    }
                }
                found
            }
            other => {
                return Err(SharedStepError::UnknownPrefix {
                    prefix: other.to_string(),
                })
            }
        };

        let Some(file) = file else {
            return Err(SharedStepError::NotFound {
                uses: uses.to_string(),
                searched_paths: searched,
            });
        };

        let source_kind = match prefix.to_lowercase().as_str() {
            "builtin" => SourceKind::Builtin,
            "project" => SourceKind::Project,
            _ => SourceKind::Path,
        };

        let definition = parse_step_file(&file, source_kind, uses)?;
        self.cache.insert(uses.to_string(), definition);
        Ok(&self.cache[uses])
    }

    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }
}

/// Builtin steps live next to the executable, under `shared-steps/`.
fn builtin_steps_dir() -> Option<PathBuf> {
    let exe = std::env::current_exe().ok()?;
    Some(exe.parent()?.join("shared-steps"))
}

fn probe_step_dir(dir: &Path, searched: &mut Vec<String>) -> Option<PathBuf> {
    for file_name in ["step.yml", "step.yaml"] {
        let candidate = dir.join(file_name);
        searched.push(candidate.display().to_string());
        if candidate.is_file() {
            return Some(candidate);
        }
    }
    None
}

#[derive(Debug, Deserialize)]
struct RawDefinition {
    #[serde(rename = "type")]
    kind: Option<String>,
    version: Option<u32>,
    name: Option<String>,
    #[serde(default)]
    description: String,
    #[serde(default)]
    inputs: Vec<serde_yaml::Value>,
    #[serde(default)]
    outputs: Vec<serde_yaml::Value>,
    #[serde(default)]
    steps: Vec<RawStep>,
}

fn parse_step_file(
    path: &Path,
    source_kind: SourceKind,
    identifier: &str,
) -> Result<Definition, SharedStepError> {
    let parse_err = |message: String| SharedStepError::Parse {
        path: path.display().to_string(),
        message,
    };

    let text =
        std::fs::read_to_string(path).map_err(|e| parse_err(format!("file read error: {e}")))?;
    let raw: RawDefinition = serde_yaml::from_str(&text)
        .map_err(|e| parse_err(format!("YAML parse error: {e}")))?;

    match raw.kind.as_deref() {
        Some(STEP_TYPE) => {}
        other => {
            return Err(parse_err(format!(
                "invalid or missing 'type' field. Expected '{STEP_TYPE}', got {other:?}"
            )))
        }
    }
    match raw.version {
        Some(STEP_VERSION) => {}
        other => {
            return Err(parse_err(format!(
                "unsupported version: {other:?}. Only version {STEP_VERSION} is supported"
            )))
        }
    }

    if raw.steps.is_empty() {
        return Err(parse_err(
            "shared step must define at least one step in 'steps' field".to_string(),
        ));
    }

    let inputs = raw
        .inputs
        .iter()
        .enumerate()
        .map(|(idx, inp)| parse_input(inp).map_err(|e| parse_err(format!("input at index {idx} {e}"))))
        .collect::<Result<Vec<_>, _>>()?;

    let outputs = raw
        .outputs
        .iter()
        .enumerate()
        .map(|(idx, out)| {
            parse_output(out).map_err(|e| parse_err(format!("output at index {idx} {e}")))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let steps = compile_steps(raw.steps)
        .map_err(|e| parse_err(e.to_string()))?;

    let default_name = path
        .parent()
        .and_then(|p| p.file_name())
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    Ok(Definition {
        identifier: identifier.to_string(),
        name: raw.name.unwrap_or(default_name),
        description: raw.description,
        version: STEP_VERSION,
        inputs,
        outputs,
        steps,
        source_path: path.to_path_buf(),
        source_kind,
    })
}

fn parse_input(value: &serde_yaml::Value) -> Result<InputSpec, String> {
    match value {
        // Shorthand: a bare name is a required input with no default
        serde_yaml::Value::String(name) => Ok(InputSpec::named(name)),
        serde_yaml::Value::Mapping(_) => {
            let name = value
                .get("name")
                .and_then(serde_yaml::Value::as_str)
                .ok_or_else(|| "missing required 'name' field".to_string())?;
            Ok(InputSpec {
                name: name.to_string(),
                description: value
                    .get("description")
                    .and_then(serde_yaml::Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
                required: value
                    .get("required")
                    .and_then(serde_yaml::Value::as_bool)
                    .unwrap_or(true),
                default: value.get("default").cloned().map(yaml_to_json),
                schema: value.get("schema").cloned().map(yaml_to_json),
            })
        }
        other => Err(format!(
            "must be a string or mapping, got: {}",
            yaml_type_name(other)
        )),
    }
}

fn parse_output(value: &serde_yaml::Value) -> Result<OutputSpec, String> {
    match value {
        // Shorthand: name equals the internal variable
        serde_yaml::Value::String(name) => Ok(OutputSpec {
            name: name.clone(),
            description: String::new(),
            from_var: name.clone(),
        }),
        serde_yaml::Value::Mapping(_) => {
            let name = value
                .get("name")
                .and_then(serde_yaml::Value::as_str)
                .ok_or_else(|| "missing required 'name' field".to_string())?;
            let from_var = value
                .get("from")
                .or_else(|| value.get("from_var"))
                .and_then(serde_yaml::Value::as_str)
                .unwrap_or(name);
            Ok(OutputSpec {
                name: name.to_string(),
                description: value
                    .get("description")
                    .and_then(serde_yaml::Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
                from_var: from_var.to_string(),
            })
        }
        other => Err(format!(
            "must be a string or mapping, got: {}",
            yaml_type_name(other)
        )),
    }
}

fn yaml_type_name(value: &serde_yaml::Value) -> &'static str {
    match value {
        serde_yaml::Value::Null => "null",
        serde_yaml::Value::Bool(_) => "bool",
        serde_yaml::Value::Number(_) => "number",
        serde_yaml::Value::String(_) => "string",
        serde_yaml::Value::Sequence(_) => "sequence",
        serde_yaml::Value::Mapping(_) => "mapping",
        serde_yaml::Value::Tagged(_) => "tagged",
    }
}

#[cfg(test)]
#[path = "resolver_tests.rs"]
mod tests;
