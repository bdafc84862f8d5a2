use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;

/// Result of a tool execution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolResult {
    pub success: bool,
    pub output: String,
    pub error: Option<String>,
}

impl ToolResult {
    pub fn ok(output: impl Into<String>) -> Self {
        Self {
            success: true,
            output: output.into(),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            output: String::new(),
            error: Some(error.into()),
        }
    }

    /// Text fed back to the oracle as the tool result content.
    pub fn content(&self) -> String {
        match (&self.error, self.success) {
            (Some(error), false) => format!("error: {error}"),
            _ => self.output.clone(),
        }
    }
}

/// Description of a tool for the oracle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

pub type ToolFuture<'a> = Pin<Box<dyn Future<Output = anyhow::Result<ToolResult>> + Send + 'a>>;

pub trait Tool: Send + Sync {
    /// Tool name (used in oracle function calling)
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// JSON schema for parameters
    fn parameters_schema(&self) -> serde_json::Value;

    /// Whether a successful call changes the knowledge store.
    fn mutates(&self) -> bool {
        false
    }

    fn execute<'a>(&'a self, args: serde_json::Value) -> ToolFuture<'a>;

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.parameters_schema(),
        }
    }
}
