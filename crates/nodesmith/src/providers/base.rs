use anyhow::Result;
use async_trait::async_trait;

use crate::models::turn::ModelTurn;

/// Base trait for model providers (Gemini, OpenAI)
///
/// Each provider owns its own conversation state: the stateful-session
/// dialect keeps it inside a chat session, the stateless-history dialect
/// replays an explicit message list on every call. Callers never observe
/// the difference; every exchange comes back as a normalized [`ModelTurn`].
#[async_trait]
pub trait Provider: Send {
    /// The model identifier this provider was configured with
    fn model_name(&self) -> &str;

    /// One-shot planning call: break a user request into ordered subtasks.
    /// Does not touch the conversation state.
    async fn generate_plan(&mut self, request: &str) -> Result<Vec<String>>;

    /// Send a user message and get the next normalized turn
    async fn send_message(&mut self, text: &str) -> Result<ModelTurn>;

    /// Feed a tool's textual result back to the model.
    ///
    /// `call_id` is the correlation token that accompanied the call; the
    /// stateless-history dialect requires it unchanged, the stateful-session
    /// dialect ignores it.
    async fn send_tool_result(
        &mut self,
        tool_name: &str,
        result: &str,
        call_id: Option<&str>,
    ) -> Result<ModelTurn>;
}
