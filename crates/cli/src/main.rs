// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! sr: run Claude Code workflows in tmux panes.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use sr_engine::{ConsoleProgress, ToolRegistry, WorkflowRunner};
use sr_workflow::{
    check_hooks_status, discover_workflows, find_workflow_by_name, hook_config_snippet,
    load_workflow, validate_workflow_file, HookStatus, Workflow,
};

/// An error carrying the process exit code. Command code returns this
/// instead of calling `std::process::exit()` directly, so `main()` owns
/// process termination.
#[derive(Debug)]
struct ExitError {
    code: i32,
    message: String,
}

impl ExitError {
    fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for ExitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ExitError {}

#[derive(Parser)]
#[command(
    name = "sr",
    version,
    about = "Run Claude Code workflows in tmux panes",
    after_help = "Must be run inside a tmux session:\n  tmux new -s workflow\n  sr /path/to/project"
)]
struct Args {
    /// Path to the project containing .claude/ workflows
    #[arg(default_value = ".")]
    project_path: PathBuf,

    /// Name of the workflow to run (from the file's `name` field)
    #[arg(short = 'w', long = "workflow")]
    workflow_name: Option<String>,

    /// Direct path to a workflow file
    #[arg(short = 'f', long = "file")]
    workflow_file: Option<PathBuf>,

    /// Port for the completion signal server
    #[arg(short = 'p', long, default_value_t = sr_signal::DEFAULT_PORT)]
    port: u16,

    /// List available workflows and exit
    #[arg(long)]
    list: bool,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(Args::parse()).await {
        if !e.message.is_empty() {
            eprintln!("{}", e.message);
        }
        std::process::exit(e.code);
    }
}

async fn run(args: Args) -> Result<(), ExitError> {
    let project_path = args
        .project_path
        .canonicalize()
        .map_err(|_| ExitError::new(1, format!("Project path not found: {}", args.project_path.display())))?;

    if args.list {
        return list_workflows(&project_path);
    }

    // Pane creation needs a live tmux session
    if std::env::var("TMUX").map(|v| v.is_empty()).unwrap_or(true) {
        return Err(ExitError::new(
            1,
            "Must run inside a tmux session. Start one first: tmux new -s workflow",
        ));
    }

    if args.workflow_name.is_some() && args.workflow_file.is_some() {
        return Err(ExitError::new(
            1,
            "Cannot use both -w/--workflow and -f/--file flags together",
        ));
    }

    let workflow_file = select_workflow_file(&args, &project_path)?;
    let workflow =
        load_workflow(&workflow_file).map_err(|e| ExitError::new(1, e.to_string()))?;

    check_hooks(&workflow, &project_path)?;

    let runner = WorkflowRunner::new(
        workflow,
        project_path,
        ToolRegistry::standard(),
        Arc::new(ConsoleProgress),
    );
    match runner.run(args.port).await {
        Ok(_) => Ok(()),
        // The runner already reported the failure through the display
        Err(e) => Err(ExitError::new(e.exit_code(), String::new())),
    }
}

fn list_workflows(project_path: &std::path::Path) -> Result<(), ExitError> {
    let workflows = discover_workflows(project_path);
    if workflows.is_empty() {
        return Err(ExitError::new(
            1,
            format!(
                "No workflow files found in {}/.claude/ \
                 (required fields: type: claude-workflow, version: 2)",
                project_path.display()
            ),
        ));
    }
    for workflow in workflows {
        println!("{} ({})", workflow.name, workflow.file_path.display());
    }
    Ok(())
}

fn select_workflow_file(args: &Args, project_path: &std::path::Path) -> Result<PathBuf, ExitError> {
    if let Some(file) = &args.workflow_file {
        let file = file
            .canonicalize()
            .map_err(|_| ExitError::new(1, format!("Workflow file not found: {}", file.display())))?;
        if file.strip_prefix(project_path).is_err() {
            eprintln!(
                "Warning: loading workflow from outside the project directory ({})",
                file.display()
            );
        }
        validate_workflow_file(&file).map_err(|e| ExitError::new(1, e.to_string()))?;
        return Ok(file);
    }

    let workflows = discover_workflows(project_path);

    if let Some(name) = &args.workflow_name {
        return match find_workflow_by_name(&workflows, name) {
            Some(found) => Ok(found.file_path.clone()),
            None => {
                let available: Vec<&str> = workflows.iter().map(|w| w.name.as_str()).collect();
                Err(ExitError::new(
                    1,
                    if available.is_empty() {
                        format!("Workflow '{name}' not found; no workflows in {}/.claude/", project_path.display())
                    } else {
                        format!(
                            "Workflow '{name}' not found. Available: {}",
                            available.join(", ")
                        )
                    },
                ))
            }
        };
    }

    match workflows.len() {
        0 => Err(ExitError::new(
            1,
            format!(
                "No workflow files found. Create one at {}/.claude/workflow.yml \
                 with type: claude-workflow and version: 2",
                project_path.display()
            ),
        )),
        1 => Ok(workflows[0].file_path.clone()),
        _ => {
            let names: Vec<&str> = workflows.iter().map(|w| w.name.as_str()).collect();
            Err(ExitError::new(
                1,
                format!(
                    "Multiple workflows found, pick one with -w: {}",
                    names.join(", ")
                ),
            ))
        }
    }
}

/// Interactive steps need the completion hooks in the host's Claude
/// settings; refuse to run without them.
fn check_hooks(workflow: &Workflow, project_path: &std::path::Path) -> Result<(), ExitError> {
    if !workflow.uses_claude() {
        return Ok(());
    }
    let result = check_hooks_status(Some(project_path));
    match result.status {
        HookStatus::Current => Ok(()),
        status => {
            let verb = match status {
                HookStatus::Missing => "not configured",
                _ => "outdated",
            };
            let snippet = serde_json::to_string_pretty(&hook_config_snippet())
                .unwrap_or_default();
            Err(ExitError::new(
                1,
                format!(
                    "Completion hooks are {verb}. Merge this into \
                     ~/.claude/settings.json (or {}/.claude/settings.json) and \
                     restart Claude Code:\n{snippet}",
                    project_path.display()
                ),
            ))
        }
    }
}

#[cfg(test)]
#[path = "main_tests.rs"]
mod tests;
