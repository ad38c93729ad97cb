// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Test fixtures shared by the engine's unit tests.

use std::sync::Arc;

use sr_core::ExecutionContext;
use sr_pane::PaneManager;
use sr_signal::SignalServer;
use sr_workflow::shared::{ExecutionStack, Resolver};
use sr_workflow::{ClaudeSettings, RawStep, Step, TmuxSettings};

use crate::display::SilentProgress;
use crate::registry::ToolRegistry;
use crate::runner::RunStats;
use crate::tool::{RunCtx, SharedState};

/// Everything a `RunCtx` borrows, owned in one place.
pub struct Harness {
    pub project: tempfile::TempDir,
    pub temp: tempfile::TempDir,
    pub context: ExecutionContext,
    pub panes: PaneManager,
    pub registry: ToolRegistry,
    pub display: SilentProgress,
    pub shared: SharedState,
    pub stats: RunStats,
}

impl Harness {
    pub async fn new() -> Self {
        let project = tempfile::tempdir().expect("temp project dir");
        let temp = tempfile::tempdir().expect("temp run dir");
        let server = Arc::new(SignalServer::start(0).await.expect("signal server"));

        let mut context = ExecutionContext::new(project.path());
        context.set_temp_dir(temp.path());
        context.set("_temp_dir", temp.path().display().to_string());

        let panes = PaneManager::new(
            TmuxSettings::default(),
            ClaudeSettings::default(),
            project.path(),
            server,
        );
        let shared = SharedState {
            resolver: Resolver::new(project.path(), None),
            stack: ExecutionStack::default(),
        };

        Self {
            project,
            temp,
            context,
            panes,
            registry: ToolRegistry::standard(),
            display: SilentProgress,
            shared,
            stats: RunStats::default(),
        }
    }

    pub fn run_ctx(&mut self) -> RunCtx<'_> {
        RunCtx {
            context: &mut self.context,
            panes: &mut self.panes,
            registry: &self.registry,
            display: &self.display,
            shared: &mut self.shared,
            stats: &mut self.stats,
            depth: 0,
        }
    }
}

/// Compile a step from its YAML form.
pub fn step(yaml: &str) -> Step {
    let raw: RawStep = serde_yaml::from_str(yaml).expect("valid step yaml");
    Step::compile(raw).expect("step compiles")
}

/// Compile a list of steps from YAML.
pub fn steps(yaml: &str) -> Vec<Step> {
    let raw: Vec<RawStep> = serde_yaml::from_str(yaml).expect("valid steps yaml");
    raw.into_iter()
        .map(|r| Step::compile(r).expect("step compiles"))
        .collect()
}
