pub mod postprocess;
pub mod tool_loop;

pub use tool_loop::{LoopStopReason, ToolCallRecord, ToolLoop, ToolLoopResult};
