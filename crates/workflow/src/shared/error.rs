// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for shared-step resolution and validation.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SharedStepError {
    #[error("invalid 'uses' format: '{uses}'. Expected 'prefix:name' (e.g. 'builtin:git-checkout')")]
    InvalidReference { uses: String },

    #[error("unknown step source prefix: '{prefix}'. Valid prefixes: builtin, project, path")]
    UnknownPrefix { prefix: String },

    #[error("shared step not found: {uses}\nSearched paths:\n  {}", searched_paths.join("\n  "))]
    NotFound {
        uses: String,
        searched_paths: Vec<String>,
    },

    #[error("failed to parse shared step at {path}: {message}")]
    Parse { path: String, message: String },

    #[error("circular dependency detected: {chain}")]
    CircularDependency { chain: String },

    #[error("maximum nesting depth ({max_depth}) exceeded. Current stack: {chain}")]
    MaxDepthExceeded { max_depth: usize, chain: String },

    #[error("required input '{input}' not provided for step '{step_id}'")]
    RequiredInputMissing { input: String, step_id: String },

    #[error("input '{input}' for step '{step_id}' failed schema validation:\n  {}", errors.join("\n  "))]
    SchemaValidation {
        input: String,
        step_id: String,
        errors: Vec<String>,
    },

    #[error("input '{input}' for step '{step_id}' has an invalid schema: {message}")]
    InvalidSchema {
        input: String,
        step_id: String,
        message: String,
    },
}
