// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The tool interface and per-run services handed to tools.

use async_trait::async_trait;
use sr_core::ExecutionContext;
use sr_pane::PaneManager;
use sr_workflow::shared::{ExecutionStack, Resolver};
use sr_workflow::Step;

use crate::display::Progress;
use crate::error::EngineError;
use crate::registry::ToolRegistry;
use crate::runner::RunStats;

/// Marker a tool returns to request break/continue from the nearest
/// enclosing loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoopSignal {
    #[default]
    None,
    Break,
    Continue,
}

/// Result of one tool execution.
#[derive(Debug, Clone, Default)]
pub struct ToolResult {
    pub success: bool,
    pub output: Option<String>,
    pub error: Option<String>,
    /// Step name the runner should jump to next.
    pub goto_step: Option<String>,
    pub loop_signal: LoopSignal,
}

impl ToolResult {
    pub fn ok() -> Self {
        Self {
            success: true,
            ..Self::default()
        }
    }

    pub fn ok_with_output(output: impl Into<String>) -> Self {
        Self {
            success: true,
            output: Some(output.into()),
            ..Self::default()
        }
    }

    pub fn fail(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            ..Self::default()
        }
    }

    pub fn goto(target: impl Into<String>) -> Self {
        Self {
            success: true,
            goto_step: Some(target.into()),
            ..Self::default()
        }
    }

    pub fn signal(signal: LoopSignal) -> Self {
        Self {
            success: true,
            loop_signal: signal,
            ..Self::default()
        }
    }
}

/// Shared-step machinery carried through a run.
pub struct SharedState {
    pub resolver: Resolver,
    pub stack: ExecutionStack,
}

/// Mutable services a tool executes against.
///
/// The runner assembles one of these per run; loop tools re-enter the
/// step-list executor through it.
pub struct RunCtx<'a> {
    pub context: &'a mut ExecutionContext,
    pub panes: &'a mut PaneManager,
    pub registry: &'a ToolRegistry,
    pub display: &'a dyn Progress,
    pub shared: &'a mut SharedState,
    pub stats: &'a mut RunStats,
    /// Display nesting level; loop tools increment it for their bodies.
    pub depth: usize,
}

/// Executor for one step kind.
///
/// Field validation happens at workflow compile time; `execute` receives
/// an already-typed step. Recoverable failures are reported through
/// `ToolResult`; returned errors abort the run.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Tool identifier used in workflow files.
    fn name(&self) -> &'static str;

    async fn execute(&self, step: &Step, run: &mut RunCtx<'_>) -> Result<ToolResult, EngineError>;
}
