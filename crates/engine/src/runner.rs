// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Workflow runner.
//!
//! Drives the top-level step list and owns the lifecycles of the signal
//! server, the pane manager, and the run temp directory. Loop tools and
//! shared steps re-enter [`run_step_list`] for their nested lists.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures_util::future::BoxFuture;
use sr_core::ExecutionContext;
use sr_expr::evaluate_condition;
use sr_pane::PaneManager;
use sr_signal::SignalServer;
use sr_workflow::shared::{ExecutionStack, Resolver};
use sr_workflow::{ErrorPolicy, Step, Workflow};

use crate::display::Progress;
use crate::error::EngineError;
use crate::registry::ToolRegistry;
use crate::tool::{LoopSignal, RunCtx, SharedState};

/// Pause between steps so the display can refresh.
const STEP_YIELD: Duration = Duration::from_millis(50);

/// Aggregate timing and completion counters for a run.
#[derive(Debug, Default)]
pub struct RunStats {
    pub completed: usize,
    pub step_times: Vec<(String, Duration)>,
}

/// Result of a completed run.
#[derive(Debug)]
pub struct RunReport {
    pub completed: usize,
    pub elapsed: Duration,
    pub step_times: Vec<(String, Duration)>,
}

/// Outcome of executing one step list.
#[derive(Debug, Clone, Default)]
pub struct ListOutcome {
    pub success: bool,
    pub error: Option<String>,
    pub failed_step: Option<String>,
    pub loop_signal: LoopSignal,
    pub completed: usize,
}

impl ListOutcome {
    fn completed(completed: usize) -> Self {
        Self {
            success: true,
            completed,
            ..Self::default()
        }
    }

    fn failed(step: &str, error: impl Into<String>, completed: usize) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            failed_step: Some(step.to_string()),
            completed,
            ..Self::default()
        }
    }
}

/// Orchestrates one workflow run.
pub struct WorkflowRunner {
    workflow: Workflow,
    project_path: PathBuf,
    registry: ToolRegistry,
    display: Arc<dyn Progress>,
}

impl WorkflowRunner {
    pub fn new(
        workflow: Workflow,
        project_path: impl Into<PathBuf>,
        registry: ToolRegistry,
        display: Arc<dyn Progress>,
    ) -> Self {
        Self {
            workflow,
            project_path: project_path.into(),
            registry,
            display,
        }
    }

    /// Run the workflow to completion.
    ///
    /// Starts the signal server on (or after) `requested_port`, creates
    /// the run temp directory, executes the step list, and tears
    /// everything down on every exit path, including interruption.
    pub async fn run(self, requested_port: u16) -> Result<RunReport, EngineError> {
        check_duplicate_names(&self.workflow.steps)?;

        let server = Arc::new(SignalServer::start(requested_port).await?);
        let mut panes = PaneManager::new(
            self.workflow.tmux.clone(),
            self.workflow.claude.clone(),
            self.project_path.clone(),
            Arc::clone(&server),
        );

        // Removed on drop, after the panes are gone
        let temp_dir = tempfile::Builder::new()
            .prefix("sr-run-")
            .tempdir()
            .map_err(|e| EngineError::Step {
                step: "<startup>".to_string(),
                message: format!("failed to create temp directory: {e}"),
            })?;

        let mut context = ExecutionContext::new(self.project_path.clone());
        context.set_temp_dir(temp_dir.path());
        context.set("_temp_dir", temp_dir.path().display().to_string());

        let mut shared = SharedState {
            resolver: Resolver::new(
                self.project_path.clone(),
                self.workflow.workflow_dir.clone(),
            ),
            stack: ExecutionStack::default(),
        };
        let mut stats = RunStats::default();

        self.display
            .workflow_started(&self.workflow.name, self.workflow.steps.len());
        let started = Instant::now();

        let result = {
            let mut run = RunCtx {
                context: &mut context,
                panes: &mut panes,
                registry: &self.registry,
                display: self.display.as_ref(),
                shared: &mut shared,
                stats: &mut stats,
                depth: 0,
            };
            tokio::select! {
                outcome = run_step_list(&self.workflow.steps, &mut run) => outcome,
                _ = interrupt_signal() => Err(EngineError::Interrupted),
            }
        };

        // Cleanup runs on every exit path and never raises
        panes.close_pane().await;
        server.stop().await;

        let elapsed = started.elapsed();
        let report = RunReport {
            completed: stats.completed,
            elapsed,
            step_times: stats.step_times,
        };

        match result {
            Ok(outcome) if outcome.success => {
                self.display
                    .summary(report.completed, elapsed, &report.step_times);
                Ok(report)
            }
            Ok(outcome) => {
                let step = outcome.failed_step.unwrap_or_default();
                let message = outcome.error.unwrap_or_else(|| "step failed".to_string());
                self.display.workflow_failed(&step, &message);
                self.display
                    .summary(report.completed, elapsed, &report.step_times);
                Err(EngineError::Step { step, message })
            }
            Err(error) => {
                self.display.workflow_failed("", &error.to_string());
                self.display
                    .summary(report.completed, elapsed, &report.step_times);
                Err(error)
            }
        }
    }
}

fn check_duplicate_names(steps: &[Step]) -> Result<(), EngineError> {
    let mut seen = HashMap::new();
    for step in steps {
        if seen.insert(step.name.as_str(), ()).is_some() {
            return Err(EngineError::DuplicateStepName {
                name: step.name.clone(),
            });
        }
    }
    Ok(())
}

async fn interrupt_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {}
        // No signal handler available: never resolve
        Err(_) => std::future::pending().await,
    }
}

/// Execute a list of steps with goto, condition guards, error policy,
/// output capture, and loop-signal propagation.
///
/// Used for the top-level workflow, loop bodies, and shared-step bodies
/// alike; loop signals terminate the list and surface to the caller.
pub fn run_step_list<'a, 'b>(
    steps: &'a [Step],
    run: &'a mut RunCtx<'b>,
) -> BoxFuture<'a, Result<ListOutcome, EngineError>>
where
    'b: 'a,
{
    Box::pin(async move {
        let mut index_map: HashMap<&str, usize> = HashMap::new();
        for (idx, step) in steps.iter().enumerate() {
            if index_map.insert(step.name.as_str(), idx).is_some() {
                return Err(EngineError::DuplicateStepName {
                    name: step.name.clone(),
                });
            }
        }

        let total = steps.len();
        let mut completed = 0;
        let mut i = 0;

        while i < total {
            let step = &steps[i];
            let display_name = run.context.interpolate(&step.name);
            let display = run.display;
            let depth = run.depth;

            if let Some(when) = &step.when {
                match evaluate_condition(run.context, when) {
                    Ok(outcome) if !outcome.satisfied => {
                        display.step_skipped(&display_name, &outcome.reason, depth);
                        i += 1;
                        continue;
                    }
                    Ok(_) => {}
                    Err(e) => {
                        // Condition errors follow the step's error policy
                        if step.on_error == ErrorPolicy::Stop {
                            return Ok(ListOutcome::failed(
                                &display_name,
                                format!("condition error: {e}"),
                                completed,
                            ));
                        }
                        display.step_skipped(&display_name, &format!("condition error: {e}"), depth);
                        i += 1;
                        continue;
                    }
                }
            }

            display.step_started(&display_name, step.kind.tool_name(), i + 1, total, depth);

            let tool = run
                .registry
                .get(step.kind.tool_name())
                .ok_or_else(|| EngineError::UnknownTool {
                    name: step.kind.tool_name().to_string(),
                    available: run.registry.available(),
                })?;

            let step_started = Instant::now();
            let result = tool.execute(step, run).await?;
            let duration = step_started.elapsed();
            tracing::debug!(
                step = %display_name,
                tool = step.kind.tool_name(),
                success = result.success,
                elapsed_ms = duration.as_millis() as u64,
                "executed step"
            );
            run.stats.step_times.push((display_name.clone(), duration));

            if let (Some(var), Some(output)) = (&step.output_var, &result.output) {
                if !output.is_empty() {
                    run.context.set(var.clone(), output.clone());
                }
            }

            if result.success {
                completed += 1;
                run.stats.completed += 1;
                display.step_completed(&display_name, duration, step.output_var.as_deref(), depth);
            } else {
                let error = result.error.as_deref().unwrap_or("step failed");
                display.step_failed(&display_name, duration, error, depth);
            }

            if result.loop_signal != LoopSignal::None {
                return Ok(ListOutcome {
                    success: result.success,
                    error: result.error,
                    failed_step: (!result.success).then(|| display_name.clone()),
                    loop_signal: result.loop_signal,
                    completed,
                });
            }

            if !result.success && step.on_error == ErrorPolicy::Stop {
                return Ok(ListOutcome::failed(
                    &display_name,
                    result.error.unwrap_or_else(|| "step failed".to_string()),
                    completed,
                ));
            }

            match &result.goto_step {
                Some(target) => match index_map.get(target.as_str()) {
                    Some(&idx) => i = idx,
                    None => {
                        return Ok(ListOutcome::failed(
                            &display_name,
                            format!("goto target '{target}' not found"),
                            completed,
                        ))
                    }
                },
                None => i += 1,
            }

            tokio::time::sleep(STEP_YIELD).await;
        }

        Ok(ListOutcome::completed(completed))
    })
}

/// Run a nested step list one display level deeper.
pub async fn run_nested(
    steps: &[Step],
    run: &mut RunCtx<'_>,
) -> Result<ListOutcome, EngineError> {
    run.depth += 1;
    let result = run_step_list(steps, run).await;
    run.depth -= 1;
    result
}

#[cfg(test)]
#[path = "runner_tests.rs"]
mod tests;
