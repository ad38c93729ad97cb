// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tmux pane manager.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use sr_core::escape_for_shell;
use sr_signal::SignalServer;
use sr_workflow::{ClaudeSettings, SplitDirection, TmuxSettings};
use thiserror::Error;
use tokio::process::Command;

/// Environment variable carrying the signal-server port into spawned
/// processes; the completion hooks read it back.
pub const PORT_ENV_VAR: &str = "ORCHESTRATOR_PORT";

/// Prompts longer than this are rejected before pane creation.
pub const MAX_PROMPT_CHARS: usize = 100_000;

#[derive(Debug, Error)]
pub enum PaneError {
    #[error("prompt is {size} chars, exceeding the {limit} char limit")]
    PromptTooLarge { size: usize, limit: usize },

    #[error("tmux command failed: {message}")]
    Tmux { message: String },

    #[error("failed to run tmux: {0}")]
    Spawn(#[from] std::io::Error),
}

/// Manages tmux panes for workflow execution.
///
/// At most one pane is current at any time. Claude panes are registered
/// with the signal server before their command is sent, so a completion
/// signal can never race registration.
pub struct PaneManager {
    tmux: TmuxSettings,
    claude: ClaudeSettings,
    project_path: PathBuf,
    server: Arc<SignalServer>,
    current_pane: Option<String>,
}

impl PaneManager {
    pub fn new(
        tmux: TmuxSettings,
        claude: ClaudeSettings,
        project_path: impl Into<PathBuf>,
        server: Arc<SignalServer>,
    ) -> Self {
        Self {
            tmux,
            claude,
            project_path: project_path.into(),
            server,
            current_pane: None,
        }
    }

    /// The currently open pane, if any.
    pub fn current_pane(&self) -> Option<&str> {
        self.current_pane.as_deref()
    }

    /// The signal server panes report back to.
    pub fn server(&self) -> &SignalServer {
        &self.server
    }

    pub fn claude_settings(&self) -> &ClaudeSettings {
        &self.claude
    }

    /// Build the Claude Code command line for a pane.
    ///
    /// The prompt is single-quoted with embedded quotes escaped by the
    /// `'\''` idiom; the signal-server port rides along as an
    /// environment variable for the completion hooks.
    pub fn build_claude_command(&self, prompt: &str) -> String {
        let cwd = self
            .claude
            .cwd
            .clone()
            .unwrap_or_else(|| self.project_path.display().to_string());

        let mut parts = vec![format!(
            "cd '{}' && {}={} claude",
            escape_for_shell(&cwd),
            PORT_ENV_VAR,
            self.server.port()
        )];

        if let Some(model) = &self.claude.model {
            parts.push(format!("--model {model}"));
        }
        if self.claude.dangerously_skip_permissions {
            parts.push("--dangerously-skip-permissions".to_string());
        }
        if !self.claude.allowed_tools.is_empty() {
            parts.push(format!(
                "--allowed-tools \"{}\"",
                self.claude.allowed_tools.join(" ")
            ));
        }
        parts.push(format!("'{}'", escape_for_shell(prompt)));

        parts.join(" ")
    }

    /// Build the command line for a visible shell pane.
    pub fn build_shell_command(&self, command: &str, cwd: Option<&str>) -> String {
        let cwd = cwd
            .map(str::to_string)
            .or_else(|| self.claude.cwd.clone())
            .unwrap_or_else(|| self.project_path.display().to_string());
        format!("cd '{}' && {}", escape_for_shell(&cwd), command)
    }

    /// Launch Claude Code in a new pane with the given prompt.
    ///
    /// The pane is registered with the signal server before the command
    /// is sent into it.
    pub async fn launch_claude_pane(&mut self, prompt: &str) -> Result<String, PaneError> {
        let size = prompt.chars().count();
        if size > MAX_PROMPT_CHARS {
            return Err(PaneError::PromptTooLarge {
                size,
                limit: MAX_PROMPT_CHARS,
            });
        }

        let command = self.build_claude_command(prompt);
        let pane_id = self.create_pane().await?;
        self.server.register_pane(&pane_id);
        self.run_in_pane(&pane_id, &command).await?;
        tracing::info!(pane = %pane_id, "claude pane started");

        self.current_pane = Some(pane_id.clone());
        Ok(pane_id)
    }

    /// Launch a shell command in a new pane.
    ///
    /// Shell panes have no completion hooks and are not registered with
    /// the signal server; callers detect completion by idle content.
    pub async fn launch_shell_pane(
        &mut self,
        command: &str,
        cwd: Option<&str>,
    ) -> Result<String, PaneError> {
        let full_command = self.build_shell_command(command, cwd);
        let pane_id = self.create_pane().await?;
        self.run_in_pane(&pane_id, &full_command).await?;
        tracing::info!(pane = %pane_id, "shell pane started");

        self.current_pane = Some(pane_id.clone());
        Ok(pane_id)
    }

    /// Create an empty pane and return its id.
    async fn create_pane(&self) -> Result<String, PaneError> {
        let split = match self.tmux.split {
            SplitDirection::Vertical => "-v",
            SplitDirection::Horizontal => "-h",
        };
        let output = run_tmux(&["split-window", split, "-l", "50%", "-P", "-F", "#{pane_id}"])
            .await?;
        let pane_id = output.trim().to_string();
        if pane_id.is_empty() {
            return Err(PaneError::Tmux {
                message: "split-window returned no pane id".to_string(),
            });
        }
        Ok(pane_id)
    }

    /// Type a command into a pane and run it.
    async fn run_in_pane(&self, pane_id: &str, command: &str) -> Result<(), PaneError> {
        run_tmux(&["send-keys", "-t", pane_id, command, "Enter"]).await?;
        Ok(())
    }

    /// Send a literal key (e.g. `Enter`) to the current pane.
    pub async fn send_keys(&self, keys: &str) {
        if let Some(pane) = &self.current_pane {
            let _ = run_tmux(&["send-keys", "-t", pane, keys]).await;
        }
    }

    /// Close the current pane and wait for it to be fully gone.
    ///
    /// Flow: interrupt, two Ctrl-D nudges, wait for the session-end
    /// signal (bounded), kill the pane, then poll until tmux no longer
    /// lists it.
    pub async fn close_pane(&mut self) {
        let Some(pane_id) = self.current_pane.take() else {
            return;
        };

        let _ = run_tmux(&["send-keys", "-t", &pane_id, "C-c"]).await;
        tokio::time::sleep(Duration::from_millis(300)).await;

        let _ = run_tmux(&["send-keys", "-t", &pane_id, "C-d"]).await;
        tokio::time::sleep(Duration::from_millis(200)).await;
        let _ = run_tmux(&["send-keys", "-t", &pane_id, "C-d"]).await;
        tokio::time::sleep(Duration::from_millis(300)).await;

        // Give the process a chance to end its session cleanly; timeout
        // is ignored because the kill below is unconditional
        self.server
            .wait_for_exited(&pane_id, Duration::from_secs(30))
            .await;

        self.kill_pane_safely(&pane_id).await;

        if !self.wait_for_pane_close(&pane_id, Duration::from_secs(10)).await {
            self.kill_pane_safely(&pane_id).await;
            self.wait_for_pane_close(&pane_id, Duration::from_secs(5)).await;
        }

        self.server.unregister_pane(&pane_id);
        tracing::info!(pane = %pane_id, "pane closed");
    }

    async fn kill_pane_safely(&self, pane_id: &str) {
        let _ = run_tmux(&["kill-pane", "-t", pane_id]).await;
    }

    /// Check whether tmux still lists a pane.
    pub async fn pane_exists(&self, pane_id: &str) -> bool {
        match run_tmux(&["list-panes", "-a", "-F", "#{pane_id}"]).await {
            Ok(output) => output.lines().any(|line| line.trim() == pane_id),
            Err(_) => false,
        }
    }

    async fn wait_for_pane_close(&self, pane_id: &str, timeout: Duration) -> bool {
        let deadline = tokio::time::Instant::now() + timeout;
        while tokio::time::Instant::now() < deadline {
            if !self.pane_exists(pane_id).await {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(200)).await;
        }
        false
    }

    /// Capture the current pane's text content.
    pub async fn capture_pane_content(&self) -> String {
        let Some(pane) = &self.current_pane else {
            return String::new();
        };
        run_tmux(&["capture-pane", "-t", pane, "-p"])
            .await
            .unwrap_or_default()
    }

    /// MD5 digest of the current pane content, for idle detection.
    pub async fn pane_content_hash(&self) -> String {
        let content = self.capture_pane_content().await;
        if content.is_empty() {
            return String::new();
        }
        format!("{:x}", md5::compute(content.as_bytes()))
    }
}

/// Run a tmux command with a 5 second timeout, returning stdout.
async fn run_tmux(args: &[&str]) -> Result<String, PaneError> {
    let future = Command::new("tmux").args(args).output();
    let output = tokio::time::timeout(Duration::from_secs(5), future)
        .await
        .map_err(|_| PaneError::Tmux {
            message: format!("tmux {} timed out", args.first().unwrap_or(&"")),
        })??;

    if !output.status.success() {
        return Err(PaneError::Tmux {
            message: format!(
                "tmux {} failed: {}",
                args.first().unwrap_or(&""),
                String::from_utf8_lossy(&output.stderr).trim()
            ),
        });
    }
    Ok(String::from_utf8_lossy(&output.stdout).to_string())
}

#[cfg(test)]
#[path = "manager_tests.rs"]
mod tests;
