use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::Client;
use reqwest::StatusCode;
use serde_json::{json, Value};
use std::time::Duration;

use super::base::Provider;
use super::configs::GeminiProviderConfig;
use super::utils::{parse_plan_text, plan_prompt, tools_to_gemini_spec};
use crate::models::tool::Tool;
use crate::models::turn::{ModelTurn, ToolUse};

/// The stateful-session dialect.
///
/// Conversation state lives in a chat session of `contents` entries that is
/// appended to after every exchange. Tool results must go back as structured
/// `functionResponse` parts; plain text would break the provider's reasoning
/// about the call.
pub struct GeminiProvider {
    client: Client,
    config: GeminiProviderConfig,
    tools_spec: Vec<Value>,
    session: ChatSession,
}

/// Append-only message history owned by the provider.
struct ChatSession {
    contents: Vec<Value>,
}

impl ChatSession {
    fn new() -> Self {
        Self {
            contents: Vec::new(),
        }
    }

    fn push_user_text(&mut self, text: &str) {
        self.contents
            .push(json!({"role": "user", "parts": [{"text": text}]}));
    }

    fn push_function_response(&mut self, tool_name: &str, result: &str) {
        self.contents.push(json!({
            "role": "user",
            "parts": [{
                "functionResponse": {
                    "name": tool_name,
                    "response": {"result": result},
                }
            }]
        }));
    }

    fn push_model_content(&mut self, content: Value) {
        self.contents.push(content);
    }
}

impl GeminiProvider {
    pub fn new(config: GeminiProviderConfig, tools: &[Tool]) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(600)) // 10 minutes timeout
            .build()?;
        let tools_spec = tools_to_gemini_spec(tools)?;

        Ok(Self {
            client,
            config,
            tools_spec,
            session: ChatSession::new(),
        })
    }

    async fn post(&self, payload: Value) -> Result<Value> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.host.trim_end_matches('/'),
            self.config.model
        );

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.config.api_key)
            .json(&payload)
            .send()
            .await?;

        match response.status() {
            StatusCode::OK => Ok(response.json().await?),
            status if status == StatusCode::TOO_MANY_REQUESTS || status.as_u16() >= 500 => {
                Err(anyhow!("Server error: {}", status))
            }
            _ => Err(anyhow!(
                "Request failed: {}\nPayload: {}",
                response.status(),
                payload
            )),
        }
    }

    fn request_payload(&self, contents: &[Value]) -> Value {
        let mut payload = json!({"contents": contents});
        if !self.tools_spec.is_empty() {
            payload.as_object_mut().unwrap().insert(
                "tools".to_string(),
                json!([{"function_declarations": self.tools_spec}]),
            );
        }
        payload
    }

    /// Run one exchange: post the full session, append the model's reply to
    /// the session, and normalize it.
    async fn exchange(&mut self) -> Result<ModelTurn> {
        let payload = self.request_payload(&self.session.contents);
        let response = self.post(payload).await?;

        let content = response
            .pointer("/candidates/0/content")
            .cloned()
            .unwrap_or_else(|| json!({"role": "model", "parts": []}));
        self.session.push_model_content(content.clone());

        Ok(turn_from_content(&content))
    }
}

/// Normalize a Gemini content block into a [`ModelTurn`].
///
/// Scans parts for the first function call; text parts are still collected
/// alongside a call. A shape we don't recognize degrades to an empty turn
/// rather than an error.
fn turn_from_content(content: &Value) -> ModelTurn {
    let mut texts = Vec::new();
    let mut call = None;

    let parts = content
        .get("parts")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();

    for part in parts {
        if let Some(text) = part.get("text").and_then(Value::as_str) {
            if !text.is_empty() {
                texts.push(text.to_string());
            }
        }
        if call.is_none() {
            if let Some(function_call) = part.get("functionCall") {
                if let Some(name) = function_call.get("name").and_then(Value::as_str) {
                    let args = function_call
                        .get("args")
                        .cloned()
                        .unwrap_or_else(|| json!({}));
                    call = Some(ToolUse::new(name, args, None));
                }
            }
        }
    }

    ModelTurn {
        text: texts.join("\n"),
        call,
    }
}

#[async_trait]
impl Provider for GeminiProvider {
    fn model_name(&self) -> &str {
        &self.config.model
    }

    async fn generate_plan(&mut self, request: &str) -> Result<Vec<String>> {
        // One-shot call outside the chat session, no tools bound
        let payload = json!({
            "contents": [{"role": "user", "parts": [{"text": plan_prompt(request)}]}]
        });
        let response = self.post(payload).await?;
        let text = response
            .pointer("/candidates/0/content/parts/0/text")
            .and_then(Value::as_str)
            .unwrap_or_default();
        parse_plan_text(text)
    }

    async fn send_message(&mut self, text: &str) -> Result<ModelTurn> {
        self.session.push_user_text(text);
        self.exchange().await
    }

    async fn send_tool_result(
        &mut self,
        tool_name: &str,
        result: &str,
        _call_id: Option<&str>,
    ) -> Result<ModelTurn> {
        self.session.push_function_response(tool_name, result);
        self.exchange().await
    }
}
