// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Completion-signal HTTP server.
//!
//! Listens on loopback for `POST /complete` and `POST /exited` with a
//! form-encoded `pane` parameter, and latches a per-pane event that step
//! code can wait on. Malformed or unregistered pane ids are ignored with
//! a 200 so hooks never fail the host process.

use std::collections::HashMap;
use std::sync::{Arc, LazyLock};
use std::time::Duration;

use axum::extract::{Form, State};
use axum::routing::{get, post};
use axum::Router;
use parking_lot::Mutex;
use regex::Regex;
use serde::Deserialize;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;

/// Default port for the signal server.
pub const DEFAULT_PORT: u16 = 7432;

/// Ports scanned past the requested one before giving up.
pub const MAX_PORT_ATTEMPTS: u16 = 100;

/// Tmux pane ids follow the pattern `%<number>` (e.g. `%0`, `%123`).
// Allow expect here as the regex is compile-time verified to be valid
#[allow(clippy::expect_used)]
static PANE_ID_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^%\d+$").expect("constant regex pattern is valid"));

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("no available port found in range {start}-{end}")]
    NoAvailablePort { start: u16, end: u16 },

    #[error("failed to read bound address: {0}")]
    Io(#[from] std::io::Error),
}

/// One-shot latch pair per registered pane.
struct PaneEvents {
    complete: watch::Sender<bool>,
    exited: watch::Sender<bool>,
}

impl PaneEvents {
    fn new() -> Self {
        let (complete, _) = watch::channel(false);
        let (exited, _) = watch::channel(false);
        Self { complete, exited }
    }
}

#[derive(Clone, Default)]
struct SignalState {
    panes: Arc<Mutex<HashMap<String, PaneEvents>>>,
}

#[derive(Deserialize)]
struct PaneForm {
    #[serde(default)]
    pane: String,
}

/// The running signal server: an axum listener on its own task plus the
/// per-pane event map shared with step code.
pub struct SignalServer {
    state: SignalState,
    port: u16,
    shutdown: Mutex<Option<oneshot::Sender<()>>>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl SignalServer {
    /// Bind loopback and start serving.
    ///
    /// The requested port is probed first, then the following
    /// [`MAX_PORT_ATTEMPTS`] ports in sequence.
    pub async fn start(requested_port: u16) -> Result<Self, ServerError> {
        let listener = bind_with_fallback(requested_port).await?;
        let port = listener.local_addr()?.port();

        let state = SignalState::default();
        let app = Router::new()
            .route("/complete", post(handle_complete))
            .route("/exited", post(handle_exited))
            .route("/health", get(handle_health))
            .with_state(state.clone());

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let task = tokio::spawn(async move {
            let serve = axum::serve(listener, app).with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
            });
            if let Err(e) = serve.await {
                tracing::warn!(error = %e, "signal server exited with error");
            }
        });

        tracing::debug!(port, "signal server listening");
        Ok(Self {
            state,
            port,
            shutdown: Mutex::new(Some(shutdown_tx)),
            task: Mutex::new(Some(task)),
        })
    }

    /// The actually bound port (may differ from the requested one).
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Register a pane for completion tracking with fresh unset events.
    /// Idempotent per pane.
    pub fn register_pane(&self, pane_id: &str) {
        self.state
            .panes
            .lock()
            .insert(pane_id.to_string(), PaneEvents::new());
    }

    /// Remove a pane's events.
    pub fn unregister_pane(&self, pane_id: &str) {
        self.state.panes.lock().remove(pane_id);
    }

    /// Wait for the completion signal of a pane.
    ///
    /// Returns true once the signal fires, false on timeout or when the
    /// pane is not registered.
    pub async fn wait_for_complete(&self, pane_id: &str, timeout: Duration) -> bool {
        self.wait_for(pane_id, timeout, |events| events.complete.subscribe())
            .await
    }

    /// Wait for the session-end signal of a pane.
    pub async fn wait_for_exited(&self, pane_id: &str, timeout: Duration) -> bool {
        self.wait_for(pane_id, timeout, |events| events.exited.subscribe())
            .await
    }

    async fn wait_for(
        &self,
        pane_id: &str,
        timeout: Duration,
        subscribe: impl FnOnce(&PaneEvents) -> watch::Receiver<bool>,
    ) -> bool {
        let receiver = {
            let panes = self.state.panes.lock();
            match panes.get(pane_id) {
                Some(events) => subscribe(events),
                None => {
                    eprintln!("DEBUG wait_for: pane {:?} not found in map", pane_id);
                    return false;
                }
            }
        };
        let mut receiver = receiver;
        eprintln!("DEBUG wait_for: initial value = {:?}", *receiver.borrow());
        let r = tokio::time::timeout(timeout, receiver.wait_for(|fired| *fired))
            .await
            .map(|result| result.is_ok())
            .unwrap_or(false);
        eprintln!("DEBUG wait_for: result = {}", r);
        r
    }

    /// Gracefully stop the server, joining its task with a bounded wait.
    pub async fn stop(&self) {
        if let Some(shutdown) = self.shutdown.lock().take() {
            let _ = shutdown.send(());
        }
        let task = self.task.lock().take();
        if let Some(task) = task {
            if tokio::time::timeout(Duration::from_secs(5), task)
                .await
                .is_err()
            {
                tracing::warn!("signal server did not shut down within 5s");
            }
        }
    }
}

impl Drop for SignalServer {
    fn drop(&mut self) {
        if let Some(task) = self.task.lock().take() {
            task.abort();
        }
    }
}

async fn bind_with_fallback(start: u16) -> Result<TcpListener, ServerError> {
    let end = start.saturating_add(MAX_PORT_ATTEMPTS);
    for port in start..=end {
        if let Ok(listener) = TcpListener::bind(("127.0.0.1", port)).await {
            return Ok(listener);
        }
    }
    Err(ServerError::NoAvailablePort { start, end })
}

fn signal(state: &SignalState, pane_id: &str, pick: impl Fn(&PaneEvents) -> &watch::Sender<bool>) {
    if pane_id.is_empty() || !PANE_ID_PATTERN.is_match(pane_id) {
        return;
    }
    let panes = state.panes.lock();
    if let Some(events) = panes.get(pane_id) {
        let _ = pick(events).send(true);
    }
}

async fn handle_complete(State(state): State<SignalState>, Form(form): Form<PaneForm>) -> &'static str {
    tracing::debug!(pane = %form.pane, "complete signal");
    signal(&state, &form.pane, |events| &events.complete);
    "ok"
}

async fn handle_exited(State(state): State<SignalState>, Form(form): Form<PaneForm>) -> &'static str {
    tracing::debug!(pane = %form.pane, "exited signal");
    signal(&state, &form.pane, |events| &events.exited);
    "ok"
}

async fn handle_health() -> &'static str {
    "ok"
}

#[cfg(test)]
#[path = "server_tests.rs"]
mod tests;
