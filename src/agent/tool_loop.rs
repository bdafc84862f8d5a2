use crate::error::OracleError;
use crate::oracle::{DecisionOracle, OracleTurn, ProviderMessage};
use crate::tools::{ToolRegistry, ToolResult};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Absolute upper bound on tool-loop iterations, regardless of configuration.
pub(crate) const TOOL_LOOP_HARD_CAP: u32 = 25;

/// Drives oracle rounds, executing requested tools between them, until the
/// oracle answers or the iteration cap is reached.
pub struct ToolLoop {
    registry: Arc<ToolRegistry>,
    max_iterations: u32,
}

/// Record of a single tool invocation within the loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCallRecord {
    pub tool_name: String,
    pub args: serde_json::Value,
    pub result: ToolResult,
    pub iteration: u32,
    pub mutating: bool,
}

/// Why the tool loop terminated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopStopReason {
    /// The oracle answered without requesting more tool calls.
    Completed,
    /// The iteration limit was reached while the oracle still wanted tools.
    MaxIterations,
}

#[derive(Debug)]
pub struct ToolLoopResult {
    pub final_text: String,
    pub tool_calls: Vec<ToolCallRecord>,
    pub iterations: u32,
    pub stop_reason: LoopStopReason,
    /// The full exchange including tool rounds, for a follow-up run.
    pub messages: Vec<ProviderMessage>,
}

impl ToolLoopResult {
    /// Whether any state-changing tool call succeeded during this run.
    pub fn wrote_this_turn(&self) -> bool {
        self.tool_calls
            .iter()
            .any(|call| call.mutating && call.result.success)
    }

    /// Paths successfully written this run, as the oracle named them.
    pub fn written_paths(&self) -> impl Iterator<Item = &str> {
        self.tool_calls
            .iter()
            .filter(|call| call.mutating && call.result.success)
            .filter_map(|call| call.args.get("path").and_then(serde_json::Value::as_str))
    }

    /// The answer, or an exhaustion error if the loop never produced one.
    pub fn into_answer(self) -> Result<String, OracleError> {
        match self.stop_reason {
            LoopStopReason::Completed => Ok(self.final_text),
            LoopStopReason::MaxIterations => Err(OracleError::Exhausted {
                iterations: self.iterations,
            }),
        }
    }
}

impl ToolLoop {
    pub fn new(registry: Arc<ToolRegistry>, max_iterations: u32) -> Self {
        Self {
            registry,
            max_iterations: max_iterations.clamp(1, TOOL_LOOP_HARD_CAP),
        }
    }

    pub fn max_iterations(&self) -> u32 {
        self.max_iterations
    }

    pub async fn run(
        &self,
        oracle: &DecisionOracle,
        system: &str,
        mut messages: Vec<ProviderMessage>,
    ) -> Result<ToolLoopResult, OracleError> {
        let tools = self.registry.specs();
        let mut tool_calls = Vec::new();
        let mut last_text = String::new();
        let mut iteration = 0;

        while iteration < self.max_iterations {
            let turn = oracle.converse(system, &messages, &tools).await?;
            iteration += 1;
            messages.push(turn.to_assistant_message());

            let calls = match turn {
                OracleTurn::Final(text) => {
                    return Ok(ToolLoopResult {
                        final_text: text,
                        tool_calls,
                        iterations: iteration,
                        stop_reason: LoopStopReason::Completed,
                        messages,
                    });
                }
                OracleTurn::ToolCalls { text, calls } => {
                    if !text.is_empty() {
                        last_text = text;
                    }
                    calls
                }
            };

            for call in calls {
                let result = self.registry.execute(&call.name, call.input.clone()).await;
                tracing::debug!(
                    tool = %call.name,
                    success = result.success,
                    iteration,
                    "Tool call executed"
                );
                messages.push(ProviderMessage::tool_result(
                    &call.id,
                    result.content(),
                    !result.success,
                ));
                tool_calls.push(ToolCallRecord {
                    mutating: self.registry.is_mutating(&call.name),
                    tool_name: call.name,
                    args: call.input,
                    result,
                    iteration,
                });
            }
        }

        tracing::warn!(iterations = iteration, "Tool loop hit its iteration cap");
        Ok(ToolLoopResult {
            final_text: last_text,
            tool_calls,
            iterations: iteration,
            stop_reason: LoopStopReason::MaxIterations,
            messages,
        })
    }
}
