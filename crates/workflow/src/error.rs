// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for workflow loading and validation.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("workflow file not found at {path}")]
    NotFound { path: PathBuf },

    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid YAML in {path}: {source}")]
    Yaml {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    #[error("{path}: {message}")]
    InvalidWorkflow { path: PathBuf, message: String },

    #[error("step '{step}': {message}")]
    InvalidStep { step: String, message: String },
}

impl ConfigError {
    pub fn invalid_step(step: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidStep {
            step: step.into(),
            message: message.into(),
        }
    }
}
