// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Signal-server port selection and its propagation into pane commands.

use std::sync::Arc;
use std::time::Duration;

use sr_pane::PaneManager;
use sr_signal::{SignalServer, MAX_PORT_ATTEMPTS};
use sr_workflow::{ClaudeSettings, TmuxSettings};
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};

#[tokio::test]
async fn busy_port_falls_forward_and_reaches_the_command_line() {
    // Hold the requested port so the server has to scan
    let held = TcpListener::bind(("127.0.0.1", 0)).await.unwrap();
    let requested = held.local_addr().unwrap().port();

    let server = Arc::new(SignalServer::start(requested).await.unwrap());
    let bound = server.port();
    assert!(bound > requested);
    assert!(bound <= requested.saturating_add(MAX_PORT_ATTEMPTS));

    // Every spawned process sees the actual port in its environment
    let manager = PaneManager::new(
        TmuxSettings::default(),
        ClaudeSettings::default(),
        "/tmp/project",
        Arc::clone(&server),
    );
    let command = manager.build_claude_command("do it");
    assert!(command.contains(&format!("ORCHESTRATOR_PORT={bound} ")));

    server.stop().await;
}

async fn post_complete(port: u16, pane: &str) {
    let body = format!("pane={}", pane.replace('%', "%25"));
    let request = format!(
        "POST /complete HTTP/1.1\r\nHost: 127.0.0.1\r\n\
         Content-Type: application/x-www-form-urlencoded\r\n\
         Content-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    );
    let mut stream = TcpStream::connect(("127.0.0.1", port)).await.unwrap();
    stream.write_all(request.as_bytes()).await.unwrap();
    let _ = stream.shutdown().await;
}

#[tokio::test]
async fn sub_second_completion_signal_is_observed_by_sliced_waits() {
    let server = Arc::new(SignalServer::start(0).await.unwrap());
    server.register_pane("%42");

    // The signal lands 200ms in, inside the first half-second slice
    let port = server.port();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(200)).await;
        post_complete(port, "%42").await;
    });

    // Poll in half-second slices the way the interactive tool does
    let mut fired = false;
    for _ in 0..10 {
        if server.wait_for_complete("%42", Duration::from_millis(500)).await {
            fired = true;
            break;
        }
    }
    assert!(fired);
    server.stop().await;
}
