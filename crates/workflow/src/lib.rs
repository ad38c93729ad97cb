// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! sr-workflow: Workflow and shared-step data model.
//!
//! Parses YAML workflow files into compiled, tagged step records, and
//! resolves reusable shared-step bundles.

pub mod error;
pub mod hooks;
pub mod shared;
pub mod step;
pub mod workflow;

pub use error::ConfigError;
pub use hooks::{
    check_hooks_status, check_hooks_status_in, hook_config_snippet, HookCheckResult, HookStatus,
};
pub use step::{
    Check, CheckKind, ChecklistSource, ChecklistStep, ClaudeStep, ContextOp, DataFormat, DataStep,
    ErrorPolicy, FailurePolicy, ForeachStep, GotoStep, ItemErrorPolicy, JsonAction, JsonSource,
    JsonStep, MaxReachedPolicy, OnFailPolicy, RangeStep, RawStep, RetryStep, SetSource, SetStep,
    SharedCall, ShellStep, Severity, Step, StepKind, UpdateOp, WhileStep,
};
pub use workflow::{
    discover_workflows, find_workflow_by_name, load_workflow, validate_workflow_file,
    ClaudeSettings, DiscoveredWorkflow, SplitDirection, TmuxSettings, Workflow,
};
