// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Progress reporting.
//!
//! The engine emits structured events to a [`Progress`] collaborator
//! injected at startup; it never drives the terminal itself. The console
//! implementation here prints plain indented lines. Richer front-ends
//! implement the same trait.

use std::time::Duration;

use sr_core::format_elapsed;

/// Structured progress events from the runner and tools.
pub trait Progress: Send + Sync {
    fn workflow_started(&self, name: &str, total_steps: usize);
    fn step_started(&self, name: &str, tool: &str, index: usize, total: usize, depth: usize);
    fn step_completed(&self, name: &str, duration: Duration, output_var: Option<&str>, depth: usize);
    fn step_failed(&self, name: &str, duration: Duration, error: &str, depth: usize);
    fn step_skipped(&self, name: &str, reason: &str, depth: usize);
    fn loop_started(&self, name: &str, total: usize, depth: usize);
    fn iteration_started(&self, index: usize, total: usize, label: &str, depth: usize);
    /// Free-form note (loop break/continue, waits, auto-approval).
    fn note(&self, message: &str, depth: usize);
    fn checklist_item(&self, name: &str, passed: bool, severity: &str, message: Option<&str>);
    fn workflow_failed(&self, step: &str, error: &str);
    fn summary(&self, completed: usize, elapsed: Duration, step_times: &[(String, Duration)]);
}

/// Plain-text console progress.
pub struct ConsoleProgress;

fn indent(depth: usize) -> String {
    "  ".repeat(depth)
}

impl Progress for ConsoleProgress {
    fn workflow_started(&self, name: &str, total_steps: usize) {
        println!("▶ {name} ({total_steps} steps)");
    }

    fn step_started(&self, name: &str, tool: &str, index: usize, total: usize, depth: usize) {
        println!("{}[{index}/{total}] {name} ({tool})", indent(depth));
    }

    fn step_completed(&self, name: &str, duration: Duration, output_var: Option<&str>, depth: usize) {
        let capture = output_var
            .map(|v| format!(" -> {v}"))
            .unwrap_or_default();
        println!(
            "{}✓ {name} [{}]{capture}",
            indent(depth),
            format_elapsed(duration)
        );
    }

    fn step_failed(&self, name: &str, duration: Duration, error: &str, depth: usize) {
        println!(
            "{}✗ {name} [{}]: {error}",
            indent(depth),
            format_elapsed(duration)
        );
    }

    fn step_skipped(&self, name: &str, reason: &str, depth: usize) {
        println!("{}- {name} skipped ({reason})", indent(depth));
    }

    fn loop_started(&self, name: &str, total: usize, depth: usize) {
        println!("{}⟳ {name} ({total})", indent(depth));
    }

    fn iteration_started(&self, index: usize, total: usize, label: &str, depth: usize) {
        println!("{}[{}/{}] {label}", indent(depth), index + 1, total);
    }

    fn note(&self, message: &str, depth: usize) {
        println!("{}{message}", indent(depth));
    }

    fn checklist_item(&self, name: &str, passed: bool, severity: &str, message: Option<&str>) {
        let icon = if passed { "✓" } else { "✗" };
        match message {
            Some(message) => println!("  {icon} {name} [{severity}]: {message}"),
            None => println!("  {icon} {name}"),
        }
    }

    fn workflow_failed(&self, step: &str, error: &str) {
        eprintln!("✗ step '{step}' failed: {error}");
    }

    fn summary(&self, completed: usize, elapsed: Duration, step_times: &[(String, Duration)]) {
        println!();
        println!(
            "{completed} step(s) completed in {}",
            format_elapsed(elapsed)
        );
        for (name, duration) in step_times {
            println!("  {name}: {}", format_elapsed(*duration));
        }
    }
}

/// Discards all events; used by tests and embedders.
pub struct SilentProgress;

impl Progress for SilentProgress {
    fn workflow_started(&self, _: &str, _: usize) {}
    fn step_started(&self, _: &str, _: &str, _: usize, _: usize, _: usize) {}
    fn step_completed(&self, _: &str, _: Duration, _: Option<&str>, _: usize) {}
    fn step_failed(&self, _: &str, _: Duration, _: &str, _: usize) {}
    fn step_skipped(&self, _: &str, _: &str, _: usize) {}
    fn loop_started(&self, _: &str, _: usize, _: usize) {}
    fn iteration_started(&self, _: usize, _: usize, _: &str, _: usize) {}
    fn note(&self, _: &str, _: usize) {}
    fn checklist_item(&self, _: &str, _: bool, _: &str, _: Option<&str>) {}
    fn workflow_failed(&self, _: &str, _: &str) {}
    fn summary(&self, _: usize, _: Duration, _: &[(String, Duration)]) {}
}
