// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Workflow configuration: settings blocks, file loading, and discovery.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::ConfigError;
use crate::step::{compile_steps, RawStep, Step};

/// Marker fields every workflow file must carry.
pub const WORKFLOW_TYPE: &str = "claude-workflow";
pub const WORKFLOW_VERSION: u32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SplitDirection {
    #[default]
    Vertical,
    Horizontal,
}

/// Terminal-multiplexer settings for spawned panes.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TmuxSettings {
    pub split: SplitDirection,
    /// Idle budget in seconds for visible shell completion detection.
    pub idle_time: f64,
}

impl Default for TmuxSettings {
    fn default() -> Self {
        Self {
            split: SplitDirection::Vertical,
            idle_time: 3.0,
        }
    }
}

/// Settings for spawned Claude Code processes.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClaudeSettings {
    pub cwd: Option<String>,
    pub model: Option<String>,
    pub dangerously_skip_permissions: bool,
    #[serde(deserialize_with = "string_or_list")]
    pub allowed_tools: Vec<String>,
    pub auto_approve_plan: bool,
    pub append_system_prompt: Option<String>,
}

impl Default for ClaudeSettings {
    fn default() -> Self {
        Self {
            cwd: None,
            model: None,
            dangerously_skip_permissions: false,
            allowed_tools: Vec::new(),
            auto_approve_plan: true,
            append_system_prompt: None,
        }
    }
}

/// A loaded, compiled workflow. Immutable during execution.
#[derive(Debug, Clone)]
pub struct Workflow {
    pub name: String,
    pub steps: Vec<Step>,
    pub tmux: TmuxSettings,
    pub claude: ClaudeSettings,
    /// Directory of the workflow file, for `path:` shared-step resolution.
    pub workflow_dir: Option<PathBuf>,
}

impl Workflow {
    /// Whether any step (at any nesting level) launches Claude.
    pub fn uses_claude(&self) -> bool {
        fn scan(steps: &[Step]) -> bool {
            steps.iter().any(|s| match &s.kind {
                crate::step::StepKind::Claude(_) => true,
                crate::step::StepKind::Foreach(f) => scan(&f.steps),
                crate::step::StepKind::While(w) => scan(&w.steps),
                crate::step::StepKind::Retry(r) => scan(&r.steps),
                crate::step::StepKind::Range(r) => scan(&r.steps),
                // Shared steps resolve at run time; assume they may
                crate::step::StepKind::Shared(_) => true,
                _ => false,
            })
        }
        scan(&self.steps)
    }
}

#[derive(Debug, Deserialize)]
struct RawWorkflow {
    #[serde(rename = "type")]
    kind: Option<String>,
    version: Option<u32>,
    name: Option<String>,
    #[serde(default)]
    tmux: TmuxSettings,
    #[serde(default)]
    claude: ClaudeSettings,
    #[serde(default)]
    steps: Vec<RawStep>,
}

fn string_or_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }
    Ok(match Option::<OneOrMany>::deserialize(deserializer)? {
        None => Vec::new(),
        Some(OneOrMany::One(s)) => vec![s],
        Some(OneOrMany::Many(v)) => v,
    })
}

/// Load and compile a workflow from a file.
pub fn load_workflow(path: &Path) -> Result<Workflow, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::NotFound {
            path: path.to_path_buf(),
        });
    }
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let raw: RawWorkflow = serde_yaml::from_str(&text).map_err(|source| ConfigError::Yaml {
        path: path.to_path_buf(),
        source,
    })?;

    validate_header(&raw, path)?;

    Ok(Workflow {
        name: raw.name.unwrap_or_else(|| "Workflow".to_string()),
        steps: compile_steps(raw.steps)?,
        tmux: raw.tmux,
        claude: raw.claude,
        workflow_dir: path.parent().map(Path::to_path_buf),
    })
}

/// Validate a file's `type` and `version` markers without compiling it.
pub fn validate_workflow_file(path: &Path) -> Result<(), ConfigError> {
    if !path.exists() {
        return Err(ConfigError::NotFound {
            path: path.to_path_buf(),
        });
    }
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let raw: RawWorkflow = serde_yaml::from_str(&text).map_err(|source| ConfigError::Yaml {
        path: path.to_path_buf(),
        source,
    })?;
    validate_header(&raw, path)
}

fn validate_header(raw: &RawWorkflow, path: &Path) -> Result<(), ConfigError> {
    match raw.kind.as_deref() {
        Some(WORKFLOW_TYPE) => {}
        other => {
            return Err(ConfigError::InvalidWorkflow {
                path: path.to_path_buf(),
                message: format!(
                    "invalid or missing 'type' field. Expected '{WORKFLOW_TYPE}', got {other:?}"
                ),
            })
        }
    }
    match raw.version {
        Some(WORKFLOW_VERSION) => Ok(()),
        other => Err(ConfigError::InvalidWorkflow {
            path: path.to_path_buf(),
            message: format!(
                "unsupported version: {other:?}. Only version {WORKFLOW_VERSION} is supported"
            ),
        }),
    }
}

/// A workflow file found during discovery.
#[derive(Debug, Clone)]
pub struct DiscoveredWorkflow {
    pub name: String,
    pub file_path: PathBuf,
}

/// Scan `<project>/.claude/` for valid workflow files.
///
/// Files that fail to parse or lack the type/version markers are skipped.
pub fn discover_workflows(project_path: &Path) -> Vec<DiscoveredWorkflow> {
    let claude_dir = project_path.join(".claude");
    let Ok(entries) = std::fs::read_dir(&claude_dir) else {
        return Vec::new();
    };

    let mut found = Vec::new();
    for entry in entries.flatten() {
        let path = entry.path();
        let is_yaml = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e == "yml" || e == "yaml");
        if !is_yaml {
            continue;
        }
        let Ok(text) = std::fs::read_to_string(&path) else {
            continue;
        };
        let Ok(raw) = serde_yaml::from_str::<RawWorkflow>(&text) else {
            continue;
        };
        if validate_header(&raw, &path).is_err() {
            continue;
        }
        found.push(DiscoveredWorkflow {
            name: raw.name.unwrap_or_else(|| "Workflow".to_string()),
            file_path: path,
        });
    }

    found.sort_by(|a, b| a.name.cmp(&b.name));
    found
}

/// Find a discovered workflow by its `name` field.
pub fn find_workflow_by_name<'a>(
    workflows: &'a [DiscoveredWorkflow],
    name: &str,
) -> Option<&'a DiscoveredWorkflow> {
    workflows.iter().find(|w| w.name == name)
}

#[cfg(test)]
#[path = "workflow_tests.rs"]
mod tests;
