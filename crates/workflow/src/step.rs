// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Workflow step records.
//!
//! Steps are parsed in two stages: a permissive [`RawStep`] mirrors the
//! YAML shape with every field optional, then [`Step::compile`] turns it
//! into a tagged record whose payload matches the selected tool. Field
//! validation happens here, at load time, not inside the tools.

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::error::ConfigError;

/// Disposition when a step reports failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorPolicy {
    #[default]
    Stop,
    Continue,
}

/// Disposition when a foreach item fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ItemErrorPolicy {
    /// Fail the workflow.
    #[default]
    Stop,
    /// Break the loop, workflow continues.
    StopLoop,
    /// Log and move to the next item.
    Continue,
}

/// Disposition when a while loop hits `max_iterations` with the condition
/// still true.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MaxReachedPolicy {
    #[default]
    Error,
    Continue,
}

/// Disposition when a retry loop exhausts its attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    #[default]
    Error,
    Continue,
}

/// Raw step shape as it appears in YAML. Every field is optional; the
/// compile step decides which ones the selected tool requires.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawStep {
    pub name: Option<String>,
    pub tool: Option<String>,
    pub when: Option<String>,
    pub output_var: Option<String>,
    pub on_error: Option<String>,

    // claude / shell
    pub prompt: Option<String>,
    pub command: Option<String>,
    pub visible: Option<bool>,
    pub cwd: Option<String>,
    pub strip_output: Option<bool>,
    pub env: Option<BTreeMap<String, serde_yaml::Value>>,

    // set / goto / range var
    pub var: Option<String>,
    pub value: Option<serde_yaml::Value>,
    pub expr: Option<String>,
    pub target: Option<String>,

    // loops
    pub source: Option<String>,
    pub item_var: Option<String>,
    pub index_var: Option<String>,
    pub steps: Option<Vec<RawStep>>,
    pub on_item_error: Option<String>,
    pub condition: Option<String>,
    pub max_iterations: Option<i64>,
    pub on_max_reached: Option<String>,
    pub max_attempts: Option<i64>,
    pub until: Option<String>,
    pub delay: Option<f64>,
    pub on_failure: Option<String>,
    pub from: Option<i64>,
    pub to: Option<i64>,
    pub step: Option<i64>,

    // json tool
    pub action: Option<String>,
    pub file: Option<String>,
    pub query: Option<String>,
    pub path: Option<String>,
    pub operation: Option<String>,
    pub create_if_missing: Option<bool>,

    // context tool
    pub values: Option<BTreeMap<String, serde_yaml::Value>>,
    pub mappings: Option<BTreeMap<String, String>>,
    pub vars: Option<Vec<String>>,

    // data tool
    pub content: Option<String>,
    pub format: Option<String>,
    pub filename: Option<String>,

    // checklist
    pub checklist: Option<String>,
    pub items: Option<Vec<serde_yaml::Value>>,
    pub on_fail: Option<String>,

    // shared step
    pub uses: Option<String>,
    pub with: Option<BTreeMap<String, serde_yaml::Value>>,
    pub outputs: Option<BTreeMap<String, String>>,
}

/// A compiled workflow step: common fields plus the tool-specific payload.
#[derive(Debug, Clone)]
pub struct Step {
    pub name: String,
    pub when: Option<String>,
    pub output_var: Option<String>,
    pub on_error: ErrorPolicy,
    pub kind: StepKind,
}

#[derive(Debug, Clone)]
pub enum StepKind {
    Claude(ClaudeStep),
    Shell(ShellStep),
    Set(SetStep),
    Goto(GotoStep),
    Foreach(ForeachStep),
    While(WhileStep),
    Retry(RetryStep),
    Range(RangeStep),
    Json(JsonStep),
    ContextOp(ContextOp),
    Data(DataStep),
    Checklist(ChecklistStep),
    Shared(SharedCall),
}

impl StepKind {
    /// Tool name as written in workflow files.
    pub fn tool_name(&self) -> &'static str {
        match self {
            StepKind::Claude(_) => "claude",
            StepKind::Shell(_) => "shell",
            StepKind::Set(_) => "set",
            StepKind::Goto(_) => "goto",
            StepKind::Foreach(_) => "foreach",
            StepKind::While(_) => "while",
            StepKind::Retry(_) => "retry",
            StepKind::Range(_) => "range",
            StepKind::Json(_) => "json",
            StepKind::ContextOp(_) => "context",
            StepKind::Data(_) => "data",
            StepKind::Checklist(_) => "checklist",
            StepKind::Shared(_) => "shared-step",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ClaudeStep {
    pub prompt: String,
}

#[derive(Debug, Clone)]
pub struct ShellStep {
    pub command: String,
    pub visible: bool,
    pub cwd: Option<String>,
    pub strip_output: bool,
    pub env: BTreeMap<String, String>,
}

#[derive(Debug, Clone)]
pub struct SetStep {
    pub var: String,
    pub source: SetSource,
}

#[derive(Debug, Clone)]
pub enum SetSource {
    /// Interpolated literal value.
    Value(String),
    /// Expression routed through the evaluator.
    Expr(String),
}

#[derive(Debug, Clone)]
pub struct GotoStep {
    pub target: String,
}

#[derive(Debug, Clone)]
pub struct ForeachStep {
    pub source: String,
    pub item_var: String,
    pub index_var: Option<String>,
    pub on_item_error: ItemErrorPolicy,
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone)]
pub struct WhileStep {
    pub condition: String,
    pub max_iterations: u32,
    pub on_max_reached: MaxReachedPolicy,
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone)]
pub struct RetryStep {
    pub max_attempts: u32,
    pub until: Option<String>,
    pub delay: f64,
    pub on_failure: FailurePolicy,
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone)]
pub struct RangeStep {
    pub from: i64,
    pub to: i64,
    pub step: i64,
    pub var: String,
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone)]
pub struct JsonStep {
    pub source: JsonSource,
    pub create_if_missing: bool,
    pub action: JsonAction,
}

#[derive(Debug, Clone)]
pub enum JsonSource {
    /// File path, format detected by extension.
    File(String),
    /// Context variable holding a JSON string.
    Variable(String),
}

#[derive(Debug, Clone)]
pub enum JsonAction {
    Query {
        query: String,
    },
    Set {
        path: String,
        value: serde_json::Value,
    },
    Update {
        path: String,
        operation: UpdateOp,
        value: serde_json::Value,
    },
    Delete {
        path: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOp {
    Append,
    Prepend,
    Increment,
    Merge,
}

#[derive(Debug, Clone)]
pub enum ContextOp {
    Set {
        values: BTreeMap<String, String>,
    },
    Copy {
        mappings: BTreeMap<String, String>,
    },
    Clear {
        vars: Vec<String>,
    },
    Export {
        file: String,
        vars: Option<Vec<String>>,
    },
}

#[derive(Debug, Clone)]
pub struct DataStep {
    pub content: String,
    pub format: DataFormat,
    pub filename: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DataFormat {
    Json,
    #[default]
    Text,
    Markdown,
}

impl DataFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            DataFormat::Json => "json",
            DataFormat::Text => "txt",
            DataFormat::Markdown => "md",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ChecklistStep {
    pub source: ChecklistSource,
    /// Step-level override; the checklist file may carry its own.
    pub on_fail: Option<OnFailPolicy>,
}

#[derive(Debug, Clone)]
pub enum ChecklistSource {
    /// Inline check definitions.
    Inline(Vec<Check>),
    /// Name resolved under `.claude/checklists/`.
    File(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OnFailPolicy {
    /// Any non-pass fails the step.
    Stop,
    /// Only error-severity failures fail the step.
    #[default]
    Warn,
    /// Always succeed.
    Continue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Severity {
    Error,
    #[default]
    Warning,
    Info,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Info => "info",
        }
    }
}

/// A single checklist check.
#[derive(Debug, Clone)]
pub struct Check {
    pub name: String,
    pub severity: Severity,
    pub kind: CheckKind,
}

#[derive(Debug, Clone)]
pub enum CheckKind {
    Bash {
        command: String,
        expect: Option<String>,
        expect_not: Option<String>,
        expect_regex: Option<String>,
    },
    Regex {
        pattern: String,
        files: String,
        exclude: Option<String>,
        expect: i64,
    },
    Model {
        prompt: String,
        pass_pattern: String,
        context_vars: Vec<String>,
    },
}

#[derive(Debug, Clone)]
pub struct SharedCall {
    pub uses: String,
    pub with: BTreeMap<String, serde_json::Value>,
    pub outputs: BTreeMap<String, String>,
}

// =============================================================================
// Compilation
// =============================================================================

impl Step {
    /// Compile a raw YAML step into its typed form, rejecting missing or
    /// invalid fields.
    pub fn compile(raw: RawStep) -> Result<Step, ConfigError> {
        let name = raw
            .name
            .clone()
            .filter(|n| !n.is_empty())
            .ok_or_else(|| ConfigError::invalid_step("<unnamed>", "step requires 'name' field"))?;

        let on_error = match raw.on_error.as_deref() {
            None | Some("stop") => ErrorPolicy::Stop,
            Some("continue") => ErrorPolicy::Continue,
            Some(other) => {
                return Err(ConfigError::invalid_step(
                    &name,
                    format!("invalid on_error value: {other}. Must be 'stop' or 'continue'"),
                ))
            }
        };

        let when = raw.when.clone().filter(|w| !w.is_empty());
        let output_var = raw.output_var.clone();
        let kind = compile_kind(&name, raw)?;

        Ok(Step {
            name,
            when,
            output_var,
            on_error,
            kind,
        })
    }
}

/// Compile a list of raw steps.
pub fn compile_steps(raw: Vec<RawStep>) -> Result<Vec<Step>, ConfigError> {
    raw.into_iter().map(Step::compile).collect()
}

fn compile_kind(name: &str, raw: RawStep) -> Result<StepKind, ConfigError> {
    // A `uses:` reference is a shared step regardless of the tool field
    if let Some(uses) = raw.uses.clone() {
        return Ok(StepKind::Shared(SharedCall {
            uses,
            with: raw
                .with
                .unwrap_or_default()
                .into_iter()
                .map(|(k, v)| (k, yaml_to_json(v)))
                .collect(),
            outputs: raw.outputs.unwrap_or_default(),
        }));
    }

    let tool = raw.tool.clone().unwrap_or_else(|| "claude".to_string());
    match tool.as_str() {
        "claude" => compile_claude(name, raw),
        // `bash` is the historical spelling of the shell tool
        "shell" | "bash" => compile_shell(name, raw),
        "set" => compile_set(name, raw),
        "goto" => compile_goto(name, raw),
        "foreach" => compile_foreach(name, raw),
        "while" => compile_while(name, raw),
        "retry" => compile_retry(name, raw),
        "range" => compile_range(name, raw),
        "json" => compile_json(name, raw),
        "context" => compile_context(name, raw),
        "data" => compile_data(name, raw),
        "checklist" => compile_checklist(name, raw),
        other => Err(ConfigError::invalid_step(
            name,
            format!("unknown tool: {other}"),
        )),
    }
}

fn compile_claude(name: &str, raw: RawStep) -> Result<StepKind, ConfigError> {
    let prompt = raw
        .prompt
        .ok_or_else(|| ConfigError::invalid_step(name, "claude step requires 'prompt' field"))?;
    Ok(StepKind::Claude(ClaudeStep { prompt }))
}

fn compile_shell(name: &str, raw: RawStep) -> Result<StepKind, ConfigError> {
    let command = raw
        .command
        .ok_or_else(|| ConfigError::invalid_step(name, "shell step requires 'command' field"))?;
    Ok(StepKind::Shell(ShellStep {
        command,
        visible: raw.visible.unwrap_or(false),
        cwd: raw.cwd,
        strip_output: raw.strip_output.unwrap_or(true),
        env: raw
            .env
            .unwrap_or_default()
            .into_iter()
            .map(|(k, v)| (k, yaml_to_string(&v)))
            .collect(),
    }))
}

fn compile_set(name: &str, raw: RawStep) -> Result<StepKind, ConfigError> {
    let var = raw
        .var
        .ok_or_else(|| ConfigError::invalid_step(name, "set step requires 'var' field"))?;
    let source = match (raw.value, raw.expr) {
        (Some(_), Some(_)) => {
            return Err(ConfigError::invalid_step(
                name,
                "set step cannot have both 'value' and 'expr' fields",
            ))
        }
        (Some(value), None) => SetSource::Value(yaml_to_string(&value)),
        (None, Some(expr)) => SetSource::Expr(expr),
        (None, None) => {
            return Err(ConfigError::invalid_step(
                name,
                "set step requires either 'value' or 'expr' field",
            ))
        }
    };
    Ok(StepKind::Set(SetStep { var, source }))
}

fn compile_goto(name: &str, raw: RawStep) -> Result<StepKind, ConfigError> {
    let target = raw
        .target
        .ok_or_else(|| ConfigError::invalid_step(name, "goto step requires 'target' field"))?;
    Ok(StepKind::Goto(GotoStep { target }))
}

fn nested_steps(name: &str, raw: Option<Vec<RawStep>>) -> Result<Vec<Step>, ConfigError> {
    let steps = raw.unwrap_or_default();
    if steps.is_empty() {
        return Err(ConfigError::invalid_step(
            name,
            "requires 'steps' field with at least one step",
        ));
    }
    compile_steps(steps)
}

fn compile_foreach(name: &str, raw: RawStep) -> Result<StepKind, ConfigError> {
    let source = raw.source.clone().filter(|s| !s.is_empty()).ok_or_else(|| {
        ConfigError::invalid_step(
            name,
            "foreach step requires 'source' field (variable name containing array)",
        )
    })?;
    let item_var = raw.item_var.clone().filter(|s| !s.is_empty()).ok_or_else(|| {
        ConfigError::invalid_step(
            name,
            "foreach step requires 'item_var' field (name for current item)",
        )
    })?;
    let on_item_error = match raw.on_item_error.as_deref() {
        None | Some("stop") => ItemErrorPolicy::Stop,
        Some("stop_loop") => ItemErrorPolicy::StopLoop,
        Some("continue") => ItemErrorPolicy::Continue,
        Some(other) => {
            return Err(ConfigError::invalid_step(
                name,
                format!(
                    "invalid on_item_error value: {other}. \
                     Must be 'stop', 'stop_loop', or 'continue'"
                ),
            ))
        }
    };
    Ok(StepKind::Foreach(ForeachStep {
        source,
        item_var,
        index_var: raw.index_var.clone(),
        on_item_error,
        steps: nested_steps(name, raw.steps)?,
    }))
}

fn compile_while(name: &str, raw: RawStep) -> Result<StepKind, ConfigError> {
    let condition = raw
        .condition
        .clone()
        .filter(|c| !c.is_empty())
        .ok_or_else(|| ConfigError::invalid_step(name, "while step requires 'condition' field"))?;
    let max_iterations = raw.max_iterations.ok_or_else(|| {
        ConfigError::invalid_step(
            name,
            "while step requires 'max_iterations' field (safety limit to prevent infinite loops)",
        )
    })?;
    if max_iterations <= 0 {
        return Err(ConfigError::invalid_step(
            name,
            format!("'max_iterations' must be a positive integer, got {max_iterations}"),
        ));
    }
    let on_max_reached = match raw.on_max_reached.as_deref() {
        None | Some("error") => MaxReachedPolicy::Error,
        Some("continue") => MaxReachedPolicy::Continue,
        Some(other) => {
            return Err(ConfigError::invalid_step(
                name,
                format!("invalid on_max_reached value: {other}. Must be 'error' or 'continue'"),
            ))
        }
    };
    Ok(StepKind::While(WhileStep {
        condition,
        max_iterations: max_iterations as u32,
        on_max_reached,
        steps: nested_steps(name, raw.steps)?,
    }))
}

fn compile_retry(name: &str, raw: RawStep) -> Result<StepKind, ConfigError> {
    let max_attempts = raw
        .max_attempts
        .ok_or_else(|| ConfigError::invalid_step(name, "retry step requires 'max_attempts' field"))?;
    if max_attempts <= 0 {
        return Err(ConfigError::invalid_step(
            name,
            format!("'max_attempts' must be a positive integer, got {max_attempts}"),
        ));
    }
    let delay = raw.delay.unwrap_or(0.0);
    if delay < 0.0 {
        return Err(ConfigError::invalid_step(
            name,
            format!("'delay' must be non-negative, got {delay}"),
        ));
    }
    let on_failure = match raw.on_failure.as_deref() {
        None | Some("error") => FailurePolicy::Error,
        Some("continue") => FailurePolicy::Continue,
        Some(other) => {
            return Err(ConfigError::invalid_step(
                name,
                format!("invalid on_failure value: {other}. Must be 'error' or 'continue'"),
            ))
        }
    };
    Ok(StepKind::Retry(RetryStep {
        max_attempts: max_attempts as u32,
        until: raw.until.clone(),
        delay,
        on_failure,
        steps: nested_steps(name, raw.steps)?,
    }))
}

fn compile_range(name: &str, raw: RawStep) -> Result<StepKind, ConfigError> {
    let from = raw
        .from
        .ok_or_else(|| ConfigError::invalid_step(name, "range step requires 'from' field (start value)"))?;
    let to = raw
        .to
        .ok_or_else(|| ConfigError::invalid_step(name, "range step requires 'to' field (end value)"))?;
    let step = raw.step.unwrap_or(1);
    if step == 0 {
        return Err(ConfigError::invalid_step(
            name,
            "'step' cannot be zero (would cause infinite loop)",
        ));
    }
    let var = raw
        .var
        .clone()
        .filter(|v| !v.is_empty())
        .ok_or_else(|| {
            ConfigError::invalid_step(name, "range step requires 'var' field (variable name for current value)")
        })?;
    Ok(StepKind::Range(RangeStep {
        from,
        to,
        step,
        var,
        steps: nested_steps(name, raw.steps)?,
    }))
}

fn compile_json(name: &str, raw: RawStep) -> Result<StepKind, ConfigError> {
    let source = match (raw.file.clone(), raw.source.clone()) {
        (Some(file), _) => JsonSource::File(file),
        (None, Some(var)) => JsonSource::Variable(var),
        (None, None) => {
            return Err(ConfigError::invalid_step(
                name,
                "json step requires either 'file' (path) or 'source' (variable name)",
            ))
        }
    };

    let action_name = raw
        .action
        .clone()
        .ok_or_else(|| ConfigError::invalid_step(name, "json step requires 'action' field"))?;

    let path_field = |raw: &RawStep, action: &str| -> Result<String, ConfigError> {
        raw.path
            .clone()
            .filter(|p| !p.is_empty())
            .ok_or_else(|| {
                ConfigError::invalid_step(name, format!("json {action} action requires 'path' field"))
            })
    };

    let action = match action_name.as_str() {
        "query" => JsonAction::Query {
            query: raw.query.clone().filter(|q| !q.is_empty()).ok_or_else(|| {
                ConfigError::invalid_step(name, "json query action requires 'query' field")
            })?,
        },
        "set" => JsonAction::Set {
            path: path_field(&raw, "set")?,
            value: raw
                .value
                .clone()
                .map(yaml_to_json)
                .ok_or_else(|| {
                    ConfigError::invalid_step(name, "json set action requires 'value' field")
                })?,
        },
        "update" => {
            let operation = match raw.operation.as_deref() {
                Some("append") => UpdateOp::Append,
                Some("prepend") => UpdateOp::Prepend,
                Some("increment") => UpdateOp::Increment,
                Some("merge") => UpdateOp::Merge,
                Some(other) => {
                    return Err(ConfigError::invalid_step(
                        name,
                        format!(
                            "invalid operation '{other}'. \
                             Must be one of: append, prepend, increment, merge"
                        ),
                    ))
                }
                None => {
                    return Err(ConfigError::invalid_step(
                        name,
                        "json update action requires 'operation' field",
                    ))
                }
            };
            JsonAction::Update {
                path: path_field(&raw, "update")?,
                operation,
                value: raw.value.clone().map(yaml_to_json).ok_or_else(|| {
                    ConfigError::invalid_step(name, "json update action requires 'value' field")
                })?,
            }
        }
        "delete" => JsonAction::Delete {
            path: path_field(&raw, "delete")?,
        },
        other => {
            return Err(ConfigError::invalid_step(
                name,
                format!("invalid action '{other}'. Must be one of: query, set, update, delete"),
            ))
        }
    };

    Ok(StepKind::Json(JsonStep {
        source,
        create_if_missing: raw.create_if_missing.unwrap_or(false),
        action,
    }))
}

fn compile_context(name: &str, raw: RawStep) -> Result<StepKind, ConfigError> {
    let action = raw
        .action
        .clone()
        .ok_or_else(|| ConfigError::invalid_step(name, "context step requires 'action' field"))?;
    let op = match action.as_str() {
        "set" => ContextOp::Set {
            values: raw
                .values
                .ok_or_else(|| {
                    ConfigError::invalid_step(name, "context 'set' action requires 'values' field")
                })?
                .into_iter()
                .map(|(k, v)| (k, yaml_to_string(&v)))
                .collect(),
        },
        "copy" => ContextOp::Copy {
            mappings: raw.mappings.ok_or_else(|| {
                ConfigError::invalid_step(name, "context 'copy' action requires 'mappings' field")
            })?,
        },
        "clear" => ContextOp::Clear {
            vars: raw.vars.ok_or_else(|| {
                ConfigError::invalid_step(name, "context 'clear' action requires 'vars' field")
            })?,
        },
        "export" => ContextOp::Export {
            file: raw.file.ok_or_else(|| {
                ConfigError::invalid_step(name, "context 'export' action requires 'file' field")
            })?,
            vars: raw.vars,
        },
        other => {
            return Err(ConfigError::invalid_step(
                name,
                format!("invalid action '{other}'. Valid: clear, copy, export, set"),
            ))
        }
    };
    Ok(StepKind::ContextOp(op))
}

fn compile_data(name: &str, raw: RawStep) -> Result<StepKind, ConfigError> {
    let content = raw
        .content
        .ok_or_else(|| ConfigError::invalid_step(name, "data step requires 'content' field"))?;
    let format = match raw.format.as_deref() {
        None | Some("text") => DataFormat::Text,
        Some("json") => DataFormat::Json,
        Some("markdown") => DataFormat::Markdown,
        Some(other) => {
            return Err(ConfigError::invalid_step(
                name,
                format!("invalid format '{other}'. Valid: json, markdown, text"),
            ))
        }
    };
    Ok(StepKind::Data(DataStep {
        content,
        format,
        filename: raw.filename,
    }))
}

fn compile_checklist(name: &str, raw: RawStep) -> Result<StepKind, ConfigError> {
    let on_fail = match raw.on_fail.as_deref() {
        None => None,
        Some(policy) => Some(parse_on_fail(policy).ok_or_else(|| {
            ConfigError::invalid_step(
                name,
                format!("invalid on_fail value: {policy}. Must be 'stop', 'warn', or 'continue'"),
            )
        })?),
    };

    let source = if let Some(items) = raw.items {
        let checks = items
            .iter()
            .enumerate()
            .map(|(idx, item)| {
                Check::from_yaml(item)
                    .map_err(|e| ConfigError::invalid_step(name, format!("check item {idx}: {e}")))
            })
            .collect::<Result<Vec<_>, _>>()?;
        ChecklistSource::Inline(checks)
    } else if let Some(file) = raw.checklist {
        ChecklistSource::File(file)
    } else {
        return Err(ConfigError::invalid_step(
            name,
            "checklist step requires either 'checklist' (file name) or 'items' (inline check definitions)",
        ));
    };

    Ok(StepKind::Checklist(ChecklistStep { source, on_fail }))
}

/// Parse an `on_fail` policy name.
pub fn parse_on_fail(s: &str) -> Option<OnFailPolicy> {
    match s {
        "stop" => Some(OnFailPolicy::Stop),
        "warn" => Some(OnFailPolicy::Warn),
        "continue" => Some(OnFailPolicy::Continue),
        _ => None,
    }
}

impl Check {
    /// Parse one check definition from a YAML mapping. Shared between
    /// inline step items (compile time) and checklist files (run time).
    pub fn from_yaml(value: &serde_yaml::Value) -> Result<Check, String> {
        if !value.is_mapping() {
            return Err("check must be a mapping".to_string());
        }

        let get_str = |key: &str| -> Option<String> {
            value.get(key).map(yaml_to_string).filter(|s| !s.is_empty())
        };

        let name = get_str("name").ok_or_else(|| "missing required 'name' field".to_string())?;
        let check_type =
            get_str("type").ok_or_else(|| "missing required 'type' field".to_string())?;

        let severity = match get_str("severity").as_deref() {
            None => Severity::Warning,
            Some("error") => Severity::Error,
            Some("warning") => Severity::Warning,
            Some("info") => Severity::Info,
            Some(other) => return Err(format!("invalid severity '{other}'")),
        };

        let kind = match check_type.as_str() {
            "bash" => CheckKind::Bash {
                command: get_str("command")
                    .ok_or_else(|| "bash check requires 'command'".to_string())?,
                expect: get_str("expect"),
                expect_not: get_str("expect_not"),
                expect_regex: get_str("expect_regex"),
            },
            "regex" => CheckKind::Regex {
                pattern: get_str("pattern")
                    .ok_or_else(|| "regex check requires 'pattern'".to_string())?,
                files: get_str("files").unwrap_or_else(|| "**/*".to_string()),
                exclude: get_str("exclude"),
                expect: value.get("expect").and_then(serde_yaml::Value::as_i64).unwrap_or(0),
            },
            "model" => CheckKind::Model {
                prompt: get_str("prompt")
                    .ok_or_else(|| "model check requires 'prompt'".to_string())?,
                pass_pattern: get_str("pass_pattern")
                    .unwrap_or_else(|| "(?i)(PASS|pass|yes|ok|true)".to_string()),
                context_vars: value
                    .get("context_vars")
                    .and_then(serde_yaml::Value::as_sequence)
                    .map(|seq| seq.iter().map(yaml_to_string).collect())
                    .unwrap_or_default(),
            },
            other => {
                return Err(format!(
                    "invalid type '{other}'. Valid types: bash, regex, model"
                ))
            }
        };

        Ok(Check {
            name,
            severity,
            kind,
        })
    }
}

// =============================================================================
// YAML value coercion
// =============================================================================

/// Stringify a YAML scalar the way step fields expect: strings bare,
/// numbers and booleans in their literal form, containers as JSON.
pub fn yaml_to_string(value: &serde_yaml::Value) -> String {
    match value {
        serde_yaml::Value::String(s) => s.clone(),
        serde_yaml::Value::Bool(b) => b.to_string(),
        serde_yaml::Value::Number(n) => n.to_string(),
        serde_yaml::Value::Null => String::new(),
        other => serde_json::to_string(&yaml_to_json(other.clone())).unwrap_or_default(),
    }
}

/// Convert a YAML value into its JSON equivalent.
pub fn yaml_to_json(value: serde_yaml::Value) -> serde_json::Value {
    serde_json::to_value(value).unwrap_or(serde_json::Value::Null)
}

#[cfg(test)]
#[path = "step_tests.rs"]
mod tests;
