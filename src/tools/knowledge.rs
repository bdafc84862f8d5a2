use super::traits::{Tool, ToolFuture, ToolResult};
use crate::clock::Clock;
use crate::knowledge::{KnowledgeGateway, WriteMode};
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;

pub const READ_TOOL: &str = "read_knowledge";
pub const WRITE_TOOL: &str = "write_knowledge";
pub const TIME_TOOL: &str = "current_time";

/// Read a file (or list a directory) from the knowledge store.
pub struct ReadKnowledgeTool {
    gateway: Arc<KnowledgeGateway>,
}

impl ReadKnowledgeTool {
    pub fn new(gateway: Arc<KnowledgeGateway>) -> Self {
        Self { gateway }
    }
}

#[derive(Debug, Deserialize)]
struct ReadArgs {
    path: String,
}

impl Tool for ReadKnowledgeTool {
    fn name(&self) -> &str {
        READ_TOOL
    }

    fn description(&self) -> &str {
        "Read a file from the user's knowledge store. Reading a directory lists its entries."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "Path relative to the knowledge root, e.g. now.md or memory/timeline/daily/2026-10-16.md"
                }
            },
            "required": ["path"]
        })
    }

    fn execute<'a>(&'a self, args: Value) -> ToolFuture<'a> {
        Box::pin(async move {
            let args: ReadArgs = match serde_json::from_value(args) {
                Ok(args) => args,
                Err(e) => return Ok(ToolResult::failed(format!("invalid arguments: {e}"))),
            };
            Ok(match self.gateway.read(&args.path).await {
                Ok(outcome) => ToolResult::ok(outcome.into_text()),
                Err(e) => ToolResult::failed(e.to_string()),
            })
        })
    }
}

/// Write or append to an allow-listed file in the knowledge store.
pub struct WriteKnowledgeTool {
    gateway: Arc<KnowledgeGateway>,
}

impl WriteKnowledgeTool {
    pub fn new(gateway: Arc<KnowledgeGateway>) -> Self {
        Self { gateway }
    }
}

#[derive(Debug, Deserialize)]
struct WriteArgs {
    path: String,
    content: String,
    #[serde(default)]
    mode: WriteMode,
}

impl Tool for WriteKnowledgeTool {
    fn name(&self) -> &str {
        WRITE_TOOL
    }

    fn description(&self) -> &str {
        "Write to a file in the user's knowledge store. Use mode=append to add an entry, overwrite to replace the file."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "path": {"type": "string", "description": "Path relative to the knowledge root"},
                "content": {"type": "string"},
                "mode": {"type": "string", "enum": ["overwrite", "append"], "default": "overwrite"}
            },
            "required": ["path", "content"]
        })
    }

    fn mutates(&self) -> bool {
        true
    }

    fn execute<'a>(&'a self, args: Value) -> ToolFuture<'a> {
        Box::pin(async move {
            let args: WriteArgs = match serde_json::from_value(args) {
                Ok(args) => args,
                Err(e) => return Ok(ToolResult::failed(format!("invalid arguments: {e}"))),
            };
            Ok(
                match self.gateway.write(&args.path, &args.content, args.mode).await {
                    Ok(path) => ToolResult::ok(format!("{} {path}", args.mode)),
                    Err(e) => ToolResult::failed(e.to_string()),
                },
            )
        })
    }
}

/// Current local date and time.
pub struct CurrentTimeTool {
    clock: Arc<dyn Clock>,
}

impl CurrentTimeTool {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }
}

impl Tool for CurrentTimeTool {
    fn name(&self) -> &str {
        TIME_TOOL
    }

    fn description(&self) -> &str {
        "Get the current local date and time."
    }

    fn parameters_schema(&self) -> Value {
        json!({"type": "object", "properties": {}})
    }

    fn execute<'a>(&'a self, _args: Value) -> ToolFuture<'a> {
        Box::pin(async move {
            let now = self.clock.now();
            Ok(ToolResult::ok(now.format("%H:%M %A %Y-%m-%d").to_string()))
        })
    }
}
