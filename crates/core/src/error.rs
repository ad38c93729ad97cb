// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for context operations.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ContextError {
    #[error(
        "variable '{path}' is {size} chars and exceeds the inline threshold, \
         but no temp directory is available for externalization"
    )]
    NoTempDir { path: String, size: usize },

    #[error("failed to write externalized variable: {0}")]
    Io(#[from] std::io::Error),
}
