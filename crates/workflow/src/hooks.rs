// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Detection of the completion-signal hooks in Claude settings.
//!
//! Interactive steps rely on the host's Stop and SessionEnd hooks to POST
//! `/complete` and `/exited` to the signal server. This module checks
//! whether those hooks are present and current; installation stays a
//! manual action guided by [`hook_config_snippet`].

use std::path::{Path, PathBuf};

use serde_json::json;

/// Marker present in every orchestrator hook command.
pub const HOOK_IDENTIFIER: &str = "$ORCHESTRATOR_PORT";

/// Expected Stop hook command.
///
/// `--data-urlencode` keeps tmux pane ids (which start with `%`) intact
/// in the form body.
pub const STOP_HOOK_COMMAND: &str = "curl -s -X POST \
     \"http://localhost:$ORCHESTRATOR_PORT/complete\" \
     --data-urlencode \"pane=$TMUX_PANE\" 2>/dev/null || true";

/// Expected SessionEnd hook command.
pub const SESSION_END_HOOK_COMMAND: &str = "curl -s -X POST \
     \"http://localhost:$ORCHESTRATOR_PORT/exited\" \
     --data-urlencode \"pane=$TMUX_PANE\" 2>/dev/null || true";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookStatus {
    /// No orchestrator hooks found.
    Missing,
    /// Hooks found but their commands do not match the current versions.
    Outdated,
    /// Hooks are up to date.
    Current,
}

#[derive(Debug, Clone)]
pub struct HookCheckResult {
    pub status: HookStatus,
    /// Settings file where hooks were found, if any.
    pub settings_path: Option<PathBuf>,
}

/// The settings JSON users must merge to enable completion signals.
pub fn hook_config_snippet() -> serde_json::Value {
    let entry = |command: &str| {
        json!([{
            "matcher": "",
            "hooks": [{"type": "command", "command": command}],
        }])
    };
    json!({
        "hooks": {
            "Stop": entry(STOP_HOOK_COMMAND),
            "SessionEnd": entry(SESSION_END_HOOK_COMMAND),
        }
    })
}

/// Check hook status across project and global Claude settings.
///
/// Project settings take priority over `~/.claude/settings.json`.
pub fn check_hooks_status(project_path: Option<&Path>) -> HookCheckResult {
    let home = std::env::var_os("HOME").map(PathBuf::from);
    check_hooks_status_in(project_path, home.as_deref())
}

/// Hook check against explicit project and home directories.
pub fn check_hooks_status_in(
    project_path: Option<&Path>,
    home_dir: Option<&Path>,
) -> HookCheckResult {
    let mut settings_paths = Vec::new();
    if let Some(project) = project_path {
        settings_paths.push(project.join(".claude").join("settings.json"));
    }
    if let Some(home) = home_dir {
        settings_paths.push(home.join(".claude").join("settings.json"));
    }

    for settings_path in settings_paths {
        let Ok(text) = std::fs::read_to_string(&settings_path) else {
            continue;
        };
        let Ok(settings) = serde_json::from_str::<serde_json::Value>(&text) else {
            continue;
        };

        let stop = hook_status(&settings, "Stop", STOP_HOOK_COMMAND);
        let session_end = hook_status(&settings, "SessionEnd", SESSION_END_HOOK_COMMAND);

        if stop == HookStatus::Current && session_end == HookStatus::Current {
            return HookCheckResult {
                status: HookStatus::Current,
                settings_path: Some(settings_path),
            };
        }
        // Any partially-present configuration reports as outdated from
        // this file
        if stop != HookStatus::Missing || session_end != HookStatus::Missing {
            return HookCheckResult {
                status: HookStatus::Outdated,
                settings_path: Some(settings_path),
            };
        }
    }

    HookCheckResult {
        status: HookStatus::Missing,
        settings_path: None,
    }
}

fn hook_status(settings: &serde_json::Value, hook_name: &str, expected: &str) -> HookStatus {
    let groups = settings
        .get("hooks")
        .and_then(|h| h.get(hook_name))
        .and_then(|v| v.as_array());
    let Some(groups) = groups else {
        return HookStatus::Missing;
    };

    let mut found_any = false;
    for group in groups {
        let hooks = group.get("hooks").and_then(|v| v.as_array());
        for hook in hooks.into_iter().flatten() {
            let is_command = hook.get("type").and_then(|v| v.as_str()) == Some("command");
            let command = hook.get("command").and_then(|v| v.as_str()).unwrap_or("");
            if is_command && command.contains(HOOK_IDENTIFIER) {
                found_any = true;
                if command.trim() == expected.trim() {
                    return HookStatus::Current;
                }
            }
        }
    }

    if found_any {
        HookStatus::Outdated
    } else {
        HookStatus::Missing
    }
}

#[cfg(test)]
#[path = "hooks_tests.rs"]
mod tests;
