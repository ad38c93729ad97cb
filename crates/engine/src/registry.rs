// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tool registry.
//!
//! Built explicitly at startup and injected into the runner, so callers
//! can omit tools they do not authorize and tests can substitute fakes.

use std::collections::BTreeMap;

use crate::tool::Tool;
use crate::tools;

pub struct ToolRegistry {
    tools: BTreeMap<&'static str, Box<dyn Tool>>,
}

impl ToolRegistry {
    pub fn empty() -> Self {
        Self {
            tools: BTreeMap::new(),
        }
    }

    /// Registry with the full built-in tool set.
    pub fn standard() -> Self {
        let mut registry = Self::empty();
        registry.register(Box::new(tools::claude::ClaudeTool));
        registry.register(Box::new(tools::shell::ShellTool));
        registry.register(Box::new(tools::set::SetTool));
        registry.register(Box::new(tools::goto::GotoTool));
        registry.register(Box::new(tools::foreach::ForeachTool));
        registry.register(Box::new(tools::while_loop::WhileTool));
        registry.register(Box::new(tools::retry::RetryTool));
        registry.register(Box::new(tools::range::RangeTool));
        registry.register(Box::new(tools::json::JsonTool));
        registry.register(Box::new(tools::context_tool::ContextTool));
        registry.register(Box::new(tools::data::DataTool));
        registry.register(Box::new(tools::checklist::ChecklistTool));
        registry.register(Box::new(tools::shared::SharedStepTool));
        registry
    }

    pub fn register(&mut self, tool: Box<dyn Tool>) {
        self.tools.insert(tool.name(), tool);
    }

    pub fn get(&self, name: &str) -> Option<&dyn Tool> {
        self.tools.get(name).map(Box::as_ref)
    }

    /// Registered tool names, for error messages.
    pub fn available(&self) -> String {
        self.tools
            .keys()
            .copied()
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
