use super::knowledge::{CurrentTimeTool, ReadKnowledgeTool, WriteKnowledgeTool};
use super::traits::{Tool, ToolResult, ToolSpec};
use crate::clock::Clock;
use crate::knowledge::KnowledgeGateway;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Named tool set handed to one oracle conversation.
#[derive(Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read, write, and time tools for the reactive path.
    pub fn conversation(gateway: Arc<KnowledgeGateway>, clock: Arc<dyn Clock>) -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(ReadKnowledgeTool::new(Arc::clone(&gateway))));
        registry.register(Arc::new(WriteKnowledgeTool::new(gateway)));
        registry.register(Arc::new(CurrentTimeTool::new(clock)));
        registry
    }

    /// Read-only tools for proactive decisions.
    pub fn proactive(gateway: Arc<KnowledgeGateway>, clock: Arc<dyn Clock>) -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(ReadKnowledgeTool::new(gateway)));
        registry.register(Arc::new(CurrentTimeTool::new(clock)));
        registry
    }

    /// Register a tool. Replaces any existing tool with the same name.
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        self.tools.insert(tool.name().to_string(), tool);
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.get(name)
    }

    pub fn tool_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tools.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Specs sorted by name so requests are stable between calls.
    pub fn specs(&self) -> Vec<ToolSpec> {
        let mut specs: Vec<ToolSpec> = self.tools.values().map(|tool| tool.spec()).collect();
        specs.sort_by(|a, b| a.name.cmp(&b.name));
        specs
    }

    pub fn is_mutating(&self, name: &str) -> bool {
        self.tools.get(name).is_some_and(|tool| tool.mutates())
    }

    /// Execute a tool by name. Unknown tools and tool failures come back as
    /// error results so the oracle can see them.
    pub async fn execute(&self, name: &str, args: Value) -> ToolResult {
        let Some(tool) = self.tools.get(name) else {
            return ToolResult::failed(format!("Tool not found: {name}"));
        };
        match tool.execute(args).await {
            Ok(result) => result,
            Err(e) => {
                tracing::warn!(tool = name, error = %e, "Tool execution failed");
                ToolResult::failed(e.to_string())
            }
        }
    }
}
