// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Data tool: write managed files into the run temp directory.

use async_trait::async_trait;
use sr_workflow::{DataFormat, Step, StepKind};
use uuid::Uuid;

use crate::error::EngineError;
use crate::tool::{RunCtx, Tool, ToolResult};

pub struct DataTool;

#[async_trait]
impl Tool for DataTool {
    fn name(&self) -> &'static str {
        "data"
    }

    async fn execute(&self, step: &Step, run: &mut RunCtx<'_>) -> Result<ToolResult, EngineError> {
        let StepKind::Data(data) = &step.kind else {
            return Ok(ToolResult::fail("data tool received a non-data step"));
        };

        let content = run.context.interpolate(&data.content);

        let formatted = match data.format {
            DataFormat::Json => match serde_json::from_str::<serde_json::Value>(&content) {
                Ok(value) => serde_json::to_string_pretty(&value).unwrap_or(content),
                Err(e) => return Ok(ToolResult::fail(format!("Invalid JSON content: {e}"))),
            },
            DataFormat::Text | DataFormat::Markdown => content,
        };

        let Some(temp_dir) = run.context.temp_dir().map(std::path::Path::to_path_buf) else {
            return Ok(ToolResult::fail(
                "No temp directory available. \
                 The data tool requires workflow temp directory support.",
            ));
        };

        let file_name = match &data.filename {
            Some(name) => run.context.interpolate(name),
            None => {
                let unique = Uuid::new_v4().simple().to_string();
                format!("data_{}.{}", &unique[..8], data.format.extension())
            }
        };

        let file_path = temp_dir.join(file_name);
        if let Err(e) = std::fs::write(&file_path, formatted) {
            return Ok(ToolResult::fail(format!("Failed to write file: {e}")));
        }

        Ok(ToolResult::ok_with_output(file_path.display().to_string()))
    }
}

#[cfg(test)]
#[path = "data_tests.rs"]
mod tests;
