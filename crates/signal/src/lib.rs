// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! sr-signal: Local HTTP server for completion signals.
//!
//! Externally launched processes report back through hooks that POST to
//! this server; per-pane events unblock waits in step code.

pub mod server;

pub use server::{SignalServer, ServerError, DEFAULT_PORT, MAX_PORT_ATTEMPTS};
