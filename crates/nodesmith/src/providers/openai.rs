use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::Client;
use reqwest::StatusCode;
use serde_json::{json, Value};
use std::time::Duration;

use super::base::Provider;
use super::configs::OpenAiProviderConfig;
use super::utils::{parse_plan_text, plan_prompt, tools_to_openai_spec};
use crate::models::tool::Tool;
use crate::models::turn::{ModelTurn, ToolUse};

/// The stateless-history dialect.
///
/// There is no session object on the provider side: the full role-tagged
/// history is replayed on every call and grows append-only. Returning a tool
/// result requires the `tool_call_id` the provider handed out, threaded back
/// unchanged.
pub struct OpenAiProvider {
    client: Client,
    config: OpenAiProviderConfig,
    tools_spec: Vec<Value>,
    history: Vec<Value>,
}

impl OpenAiProvider {
    pub fn new(config: OpenAiProviderConfig, tools: &[Tool]) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(600)) // 10 minutes timeout
            .build()?;
        let tools_spec = tools_to_openai_spec(tools)?;

        Ok(Self {
            client,
            config,
            tools_spec,
            history: Vec::new(),
        })
    }

    async fn post(&self, payload: Value) -> Result<Value> {
        let url = format!(
            "{}/v1/chat/completions",
            self.config.host.trim_end_matches('/')
        );

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.config.api_key))
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

    /// Replay the full history, append the assistant reply, normalize it.
    async fn exchange(&mut self) -> Result<ModelTurn> {
        let mut payload = json!({
            "model": self.config.model,
            "messages": self.history,
        });
        if !self.tools_spec.is_empty() {
            let obj = payload.as_object_mut().unwrap();
            obj.insert("tools".to_string(), json!(self.tools_spec));
            obj.insert("tool_choice".to_string(), json!("auto"));
        }

        let response = self.post(payload).await?;
        if let Some(error) = response.get("error") {
            return Err(anyhow!("OpenAI API error: {}", error));
        }

        let message = response
            .pointer("/choices/0/message")
            .cloned()
            .unwrap_or_else(|| json!({"role": "assistant", "content": ""}));
        self.history.push(message.clone());

        Ok(turn_from_message(&message))
    }
}

/// Normalize an assistant message into a [`ModelTurn`].
///
/// Several `tool_calls` may come back; only the first is surfaced and the
/// rest are dropped. Anything malformed degrades to an empty turn.
fn turn_from_message(message: &Value) -> ModelTurn {
    let text = message
        .get("content")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    let call = message
        .get("tool_calls")
        .and_then(Value::as_array)
        .and_then(|calls| calls.first())
        .and_then(|call| {
            let id = call.get("id").and_then(Value::as_str)?;
            let name = call.pointer("/function/name").and_then(Value::as_str)?;
            let arguments: Value = call
                .pointer("/function/arguments")
                .and_then(Value::as_str)
                .and_then(|raw| serde_json::from_str(raw).ok())?;
            Some(ToolUse::new(name, arguments, Some(id.to_string())))
        });

    ModelTurn { text, call }
}

#[async_trait]
impl Provider for OpenAiProvider {
    fn model_name(&self) -> &str {
        &self.config.model
    }

    async fn generate_plan(&mut self, request: &str) -> Result<Vec<String>> {
        // One-shot call, kept out of the replayed history
        let payload = json!({
            "model": self.config.model,
            "messages": [{"role": "user", "content": plan_prompt(request)}],
        });
        let response = self.post(payload).await?;
        let text = response
            .pointer("/choices/0/message/content")
            .and_then(Value::as_str)
            .unwrap_or_default();
        parse_plan_text(text)
    }

    async fn send_message(&mut self, text: &str) -> Result<ModelTurn> {
        self.history.push(json!({"role": "user", "content": text}));
        self.exchange().await
    }

    async fn send_tool_result(
        &mut self,
        tool_name: &str,
        result: &str,
        call_id: Option<&str>,
    ) -> Result<ModelTurn> {
        self.history.push(json!({
            "role": "tool",
            "tool_call_id": call_id,
            "name": tool_name,
            "content": result,
        }));
        self.exchange().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::material_tools;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, Request, ResponseTemplate};

    async fn setup_mock_server(response_body: Value) -> (MockServer, OpenAiProvider) {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(response_body))
            .mount(&mock_server)
            .await;

        let config = OpenAiProviderConfig {
            host: mock_server.uri(),
            api_key: "test_api_key".to_string(),
            model: "gpt-4o".to_string(),
        };
        let provider = OpenAiProvider::new(config, &material_tools()).unwrap();
        (mock_server, provider)
    }

    fn completion(message: Value) -> Value {
        json!({"choices": [{"index": 0, "message": message, "finish_reason": "stop"}]})
    }

    #[tokio::test]
    async fn test_send_message_text() -> Result<()> {
        let (_server, mut provider) = setup_mock_server(completion(
            json!({"role": "assistant", "content": "Happy to help."}),
        ))
        .await;

        let turn = provider.send_message("make a material").await?;
        assert_eq!(turn.text, "Happy to help.");
        assert!(turn.call.is_none());
        // user message and assistant reply both recorded
        assert_eq!(provider.history.len(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_first_of_several_tool_calls_is_surfaced() -> Result<()> {
        let message = json!({
            "role": "assistant",
            "content": null,
            "tool_calls": [
                {
                    "id": "call_1",
                    "type": "function",
                    "function": {
                        "name": "create_procedural_material",
                        "arguments": "{\"name\":\"Rust\",\"python_code\":\"pass\"}"
                    }
                },
                {
                    "id": "call_2",
                    "type": "function",
                    "function": {"name": "list_materials", "arguments": "{}"}
                }
            ]
        });
        let (_server, mut provider) = setup_mock_server(completion(message)).await;

        let turn = provider.send_message("make rust and list").await?;
        let call = turn.call.unwrap();
        assert_eq!(call.name, "create_procedural_material");
        assert_eq!(call.id.as_deref(), Some("call_1"));
        Ok(())
    }

    #[tokio::test]
    async fn test_tool_result_threads_call_id_and_replays_history() -> Result<()> {
        let (server, mut provider) = setup_mock_server(completion(
            json!({"role": "assistant", "content": "Material looks good."}),
        ))
        .await;

        provider
            .send_tool_result("create_procedural_material", "Created.", Some("call_1"))
            .await?;

        let requests: Vec<Request> = server.received_requests().await.unwrap();
        let body: Value = serde_json::from_slice(&requests[0].body).unwrap();
        let tool_message = &body["messages"][0];
        assert_eq!(tool_message["role"], "tool");
        assert_eq!(tool_message["tool_call_id"], "call_1");
        assert_eq!(tool_message["content"], "Created.");
        // schema bound to this dialect carries lowercase type tags
        assert_eq!(
            body["tools"][0]["function"]["parameters"]["type"],
            "object"
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_malformed_arguments_degrade_to_no_call() -> Result<()> {
        let message = json!({
            "role": "assistant",
            "content": "trying a call",
            "tool_calls": [{
                "id": "call_1",
                "type": "function",
                "function": {"name": "list_materials", "arguments": "invalid json {"}
            }]
        });
        let (_server, mut provider) = setup_mock_server(completion(message)).await;

        let turn = provider.send_message("list please").await?;
        assert_eq!(turn.text, "trying a call");
        assert!(turn.call.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_generate_plan_keeps_history_clean() -> Result<()> {
        let (_server, mut provider) = setup_mock_server(completion(
            json!({"role": "assistant", "content": "[\"base color\", \"roughness\"]"}),
        ))
        .await;

        let plan = provider.generate_plan("shiny red metal").await?;
        assert_eq!(plan.len(), 2);
        assert!(provider.history.is_empty());
        Ok(())
    }
}
