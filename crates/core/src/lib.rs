// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! sr-core: Core library for the Showrunner (sr) workflow orchestrator

pub mod context;
pub mod error;
pub mod path;
pub mod time_fmt;
pub mod value;

pub use context::{
    escape_for_shell, ExecutionContext, INTERPOLATION_PATTERN, LARGE_VARIABLE_THRESHOLD,
};
pub use error::ContextError;
pub use path::VarPath;
pub use time_fmt::format_elapsed;
pub use value::{decode_if_json, stringify, Value};
