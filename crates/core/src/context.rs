// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Execution context: variable storage and placeholder interpolation.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

use crate::error::ContextError;
use crate::path::VarPath;
use crate::value::{stringify, Value};

/// Character threshold above which an interpolated variable is written to
/// a temp file and replaced with an `@<path>` reference.
pub const LARGE_VARIABLE_THRESHOLD: usize = 10_000;

/// Regex pattern for `{var_name}` or `{var.path.0.field}` placeholders.
// Allow expect here as the regex is compile-time verified to be valid
#[allow(clippy::expect_used)]
pub static INTERPOLATION_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{([A-Za-z_][A-Za-z0-9_]*(?:\.[A-Za-z0-9_]+)*)\}")
        .expect("constant regex pattern is valid")
});

/// Escape a string for safe use inside shell single-quoted contexts.
///
/// Single quotes in the value are replaced with `'\''` (end quote, escaped
/// literal quote, start quote), which is the standard bash idiom for
/// embedding a single quote inside a single-quoted string.
pub fn escape_for_shell(s: &str) -> String {
    s.replace('\'', "'\\''")
}

/// Holds variables and state during a workflow run.
///
/// Stores both static variables from the workflow file and dynamic
/// variables captured from tool outputs. Mutated only by the step task;
/// lifetime is a single workflow run.
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    project_path: PathBuf,
    temp_dir: Option<PathBuf>,
    variables: HashMap<String, Value>,
}

impl ExecutionContext {
    pub fn new(project_path: impl Into<PathBuf>) -> Self {
        Self {
            project_path: project_path.into(),
            temp_dir: None,
            variables: HashMap::new(),
        }
    }

    /// Root path of the project the workflow operates on.
    pub fn project_path(&self) -> &Path {
        &self.project_path
    }

    /// Per-run temp directory, if one has been set up.
    pub fn temp_dir(&self) -> Option<&Path> {
        self.temp_dir.as_deref()
    }

    pub fn set_temp_dir(&mut self, dir: impl Into<PathBuf>) {
        self.temp_dir = Some(dir.into());
    }

    /// Set a variable value (total replacement).
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.variables.insert(name.into(), value.into());
    }

    /// Get a variable value.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.variables.get(name)
    }

    /// Set multiple variables at once.
    pub fn update(&mut self, variables: impl IntoIterator<Item = (String, Value)>) {
        self.variables.extend(variables);
    }

    /// Remove a variable, returning its previous value.
    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.variables.remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.variables.contains_key(name)
    }

    /// All variables, for export and inspection.
    pub fn variables(&self) -> &HashMap<String, Value> {
        &self.variables
    }

    /// Resolve a parsed path to its string form.
    ///
    /// Descends into JSON-decoded structures for dotted paths. Containers
    /// serialize to JSON, scalars stringify. Returns `None` when the root
    /// variable is missing, null, or the path does not resolve.
    pub fn resolve_to_string(&self, path: &VarPath) -> Option<String> {
        let root = self.variables.get(path.root())?;
        let resolved = path.walk(root)?;
        Some(stringify(&resolved))
    }

    /// Replace `{var}` and `{var.field.0}` placeholders with values.
    ///
    /// Unresolved placeholders pass through unchanged.
    pub fn interpolate(&self, template: &str) -> String {
        INTERPOLATION_PATTERN
            .replace_all(template, |caps: &regex::Captures| {
                match VarPath::parse(&caps[1]).and_then(|p| self.resolve_to_string(&p)) {
                    Some(value) => value,
                    None => caps[0].to_string(),
                }
            })
            .into_owned()
    }

    /// Interpolate a template that may be absent.
    pub fn interpolate_optional(&self, template: Option<&str>) -> Option<String> {
        template.map(|t| self.interpolate(t))
    }

    /// Replace placeholders, externalizing large values to files.
    ///
    /// Values longer than [`LARGE_VARIABLE_THRESHOLD`] characters are
    /// written to `<temp_dir>/<slug>.txt` and the placeholder becomes
    /// `@<absolute path>`. Within one call, re-referenced paths share a
    /// single file. Files are written fresh on every call so changed
    /// variables never serve stale content.
    pub fn interpolate_externalized(&self, template: &str) -> Result<String, ContextError> {
        let mut out = String::with_capacity(template.len());
        let mut last = 0;
        // Per-call dedup of externalized files, keyed by dotted path
        let mut externalized: HashMap<String, String> = HashMap::new();

        for caps in INTERPOLATION_PATTERN.captures_iter(template) {
            let Some(m) = caps.get(0) else { continue };
            out.push_str(&template[last..m.start()]);
            last = m.end();

            let Some(path) = VarPath::parse(&caps[1]) else {
                out.push_str(m.as_str());
                continue;
            };

            if let Some(file) = externalized.get(&path.dotted()) {
                out.push('@');
                out.push_str(file);
                continue;
            }

            match self.resolve_to_string(&path) {
                None => out.push_str(m.as_str()),
                Some(value) => {
                    let size = value.chars().count();
                    if size > LARGE_VARIABLE_THRESHOLD {
                        let dir = self.temp_dir.as_deref().ok_or_else(|| {
                            ContextError::NoTempDir {
                                path: path.dotted(),
                                size,
                            }
                        })?;
                        let file_path = dir.join(format!("{}.txt", path.slug()));
                        std::fs::write(&file_path, &value)?;
                        let abs = file_path.canonicalize().unwrap_or(file_path);
                        let abs = abs.to_string_lossy().into_owned();
                        out.push('@');
                        out.push_str(&abs);
                        externalized.insert(path.dotted(), abs);
                    } else {
                        out.push_str(&value);
                    }
                }
            }
        }

        out.push_str(&template[last..]);
        Ok(out)
    }
}

#[cfg(test)]
#[path = "context_tests.rs"]
mod tests;
