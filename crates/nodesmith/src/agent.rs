//! The orchestration loop: one user request through planning, retrieval,
//! model exchange, and a bounded number of tool round trips.

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;

use crate::catalog::CREATE_MATERIAL_TOOL;
use crate::errors::AgentError;
use crate::logger::TurnLog;
use crate::mcp::protocol::{EngineError, EngineResult};
use crate::mcp::EngineClient;
use crate::providers::base::Provider;
use crate::retrieval::Retriever;

/// Ceiling on tool invocations within a single user turn.
pub const MAX_TOOL_LOOPS: usize = 10;

const CONTEXT_PREVIEW_CHARS: usize = 500;

/// Seam between the loop and the engine, so the loop can be driven against
/// mock engines in tests.
#[async_trait]
pub trait ToolExecutor: Send {
    async fn call_tool(&mut self, name: &str, arguments: &Value) -> EngineResult<String>;

    /// Tear down the underlying engine, if any
    async fn shutdown(&mut self) {}
}

#[async_trait]
impl ToolExecutor for EngineClient {
    async fn call_tool(&mut self, name: &str, arguments: &Value) -> EngineResult<String> {
        EngineClient::call_tool(self, name, arguments).await
    }

    async fn shutdown(&mut self) {
        self.close().await;
    }
}

/// How a turn ended. Only transport-fatal conditions surface as `Err`;
/// everything else is contained here so the session can continue.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TurnOutcome {
    Completed,
    /// Planning or a model exchange failed; the error is in the log
    Aborted,
    /// The round-trip ceiling was hit with a call still pending
    LoopLimitReached,
}

/// Agent wires a model provider to the engine and the retrieval backend
pub struct Agent {
    provider: Box<dyn Provider + Send>,
    engine: Box<dyn ToolExecutor>,
    retriever: Retriever,
}

impl Agent {
    pub fn new(
        provider: Box<dyn Provider + Send>,
        engine: Box<dyn ToolExecutor>,
        retriever: Retriever,
    ) -> Self {
        Self {
            provider,
            engine,
            retriever,
        }
    }

    /// Terminate the engine process. Idempotent.
    pub async fn shutdown(&mut self) {
        self.engine.shutdown().await;
    }

    /// Run one full turn. The caller owns the log and persists it afterwards,
    /// whatever the outcome.
    pub async fn run_turn(&mut self, user_input: &str, log: &mut TurnLog) -> Result<TurnOutcome> {
        log.record(&format!("User Query: {}", user_input));

        log.record("[Planner] Generating execution plan...");
        let plan = match self.provider.generate_plan(user_input).await {
            Ok(plan) => plan,
            Err(e) => {
                log.record(&format!("Error: {}", AgentError::PlanningFailed(e.to_string())));
                return Ok(TurnOutcome::Aborted);
            }
        };
        for (i, step) in plan.iter().enumerate() {
            log.record(&format!("[Planner] {}. {}", i + 1, step));
        }

        log.record("[RAG] Aggregating context from subtasks...");
        let context = self.retriever.aggregate(&plan).await;
        if context.is_empty() {
            log.record("[RAG] No relevant context found.");
        } else {
            log.record(&format!(
                "[RAG] Aggregated context:\n{}",
                preview(&context, CONTEXT_PREVIEW_CHARS)
            ));
        }

        let augmented = build_prompt(&plan, &context, user_input);

        let mut turn = match self.provider.send_message(&augmented).await {
            Ok(turn) => turn,
            Err(e) => {
                log.record(&format!("Error: {}", e));
                return Ok(TurnOutcome::Aborted);
            }
        };
        if !turn.text.is_empty() {
            log.record(&format!("Agent: {}", turn.text));
        }

        let mut loop_count = 0;
        loop {
            let Some(call) = turn.call.take() else {
                return Ok(TurnOutcome::Completed);
            };
            if loop_count == MAX_TOOL_LOOPS {
                log.record("Warning: Maximum tool loop limit reached.");
                return Ok(TurnOutcome::LoopLimitReached);
            }
            loop_count += 1;

            if call.name == CREATE_MATERIAL_TOOL {
                if let Some(name) = call.arguments.get("name").and_then(Value::as_str) {
                    log.set_artifact_name(name);
                }
            }

            log.record(&format!(
                "Agent calling tool: {}(...) ({}/{})",
                call.name, loop_count, MAX_TOOL_LOOPS
            ));

            // tool failures become textual results the model can react to;
            // only a dead engine channel ends the run
            let result = match self.engine.call_tool(&call.name, &call.arguments).await {
                Ok(text) => text,
                Err(e @ EngineError::ConnectionClosed) | Err(e @ EngineError::Transport(_)) => {
                    return Err(e.into());
                }
                Err(e) => AgentError::ExecutionError(e.to_string()).to_string(),
            };
            log.record(&format!("Tool Output: {}", result));

            turn = match self
                .provider
                .send_tool_result(&call.name, &result, call.id.as_deref())
                .await
            {
                Ok(turn) => turn,
                Err(e) => {
                    log.record(&format!("Error: {}", e));
                    return Ok(TurnOutcome::Aborted);
                }
            };
            if !turn.text.is_empty() {
                log.record(&format!("Agent: {}", turn.text));
            }
        }
    }
}

/// One augmented prompt embedding the plan, the retrieved context, and the
/// original request verbatim.
fn build_prompt(plan: &[String], context: &str, user_input: &str) -> String {
    let plan_lines = plan
        .iter()
        .enumerate()
        .map(|(i, step)| format!("{}. {}", i + 1, step))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "Plan of Action:\n{}\n\nUsing the following context from Blender documentation:\n{}\n\nUser Query: {}",
        plan_lines, context, user_input
    )
}

fn preview(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let cut: String = text.chars().take(max_chars).collect();
    format!("{}... (truncated)", cut)
}
