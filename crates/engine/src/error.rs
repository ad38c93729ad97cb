// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Errors that abort a workflow run.
//!
//! Tool-level failures travel inside `ToolResult` and follow the step's
//! `on_error` policy; the variants here are hard stops.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("configuration error: {0}")]
    Config(#[from] sr_workflow::ConfigError),

    #[error("duplicate step name '{name}'")]
    DuplicateStepName { name: String },

    #[error("unknown tool: {name}. Available: {available}")]
    UnknownTool { name: String, available: String },

    #[error("step '{step}' failed: {message}")]
    Step { step: String, message: String },

    #[error("shared step error: {0}")]
    SharedStep(#[from] sr_workflow::shared::SharedStepError),

    #[error("pane error: {0}")]
    Pane(#[from] sr_pane::PaneError),

    #[error("server error: {0}")]
    Server(#[from] sr_signal::ServerError),

    #[error("interrupted")]
    Interrupted,
}

impl EngineError {
    /// Process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            EngineError::Interrupted => 130,
            _ => 1,
        }
    }
}
