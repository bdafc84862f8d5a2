pub mod knowledge;
pub mod registry;
pub mod traits;

pub use knowledge::{
    CurrentTimeTool, READ_TOOL, ReadKnowledgeTool, TIME_TOOL, WRITE_TOOL, WriteKnowledgeTool,
};
pub use registry::ToolRegistry;
pub use traits::{Tool, ToolFuture, ToolResult, ToolSpec};
