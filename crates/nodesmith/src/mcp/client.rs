//! Tool-protocol client
//!
//! Drives the engine process through the three-phase handshake and then
//! issues `tools/*` requests one at a time, matching each response back to
//! its request by correlation id.

use serde_json::{json, Value};

use super::protocol::{
    CallToolResult, EngineError, EngineResult, EngineTool, InitializeResult, RpcNotification,
    RpcRequest, RpcResponse, PROTOCOL_VERSION,
};
use super::transport::EngineTransport;

const CLIENT_NAME: &str = "nodesmith";
const CLIENT_VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Clone, Copy, PartialEq)]
enum ClientState {
    Ready,
    Closed,
}

pub struct EngineClient {
    transport: EngineTransport,
    request_id: u64,
    state: ClientState,
}

impl EngineClient {
    /// Spawn the engine and complete the handshake: send `initialize`, wait
    /// for its response, then send the `initialized` notification.
    ///
    /// Any EOF or transport failure before the handshake completes is a fatal
    /// startup error; no further requests are sent on that channel.
    pub async fn connect(command: &str, args: &[String]) -> EngineResult<Self> {
        let transport = EngineTransport::spawn(command, args)?;
        let mut client = Self {
            transport,
            request_id: 0,
            state: ClientState::Ready,
        };

        let params = json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": {},
            "clientInfo": {"name": CLIENT_NAME, "version": CLIENT_VERSION},
        });
        let response = client
            .request("initialize", params)
            .await
            .map_err(|e| EngineError::Startup(e.to_string()))?;

        if let Some(error) = response.error {
            return Err(EngineError::Startup(error.message));
        }
        let _init: InitializeResult = response
            .result
            .ok_or_else(|| EngineError::Startup("initialize returned no result".to_string()))
            .and_then(|v| {
                serde_json::from_value(v)
                    .map_err(|e| EngineError::Startup(format!("Invalid initialize result: {}", e)))
            })?;

        client
            .notify("notifications/initialized", json!({}))
            .await
            .map_err(|e| EngineError::Startup(e.to_string()))?;

        Ok(client)
    }

    /// Invoke a named tool and return its textual output.
    ///
    /// Callers always receive a string: a well-formed error response from the
    /// server is rendered as `Error: {message}` rather than surfaced as an
    /// `Err`. Only a dead channel escapes as an error.
    pub async fn call_tool(&mut self, name: &str, arguments: &Value) -> EngineResult<String> {
        let response = self
            .request("tools/call", json!({"name": name, "arguments": arguments}))
            .await?;

        if let Some(error) = response.error {
            return Ok(format!("Error: {}", error.message));
        }

        let result: CallToolResult = response
            .result
            .map(serde_json::from_value)
            .transpose()
            .map_err(|e| EngineError::Protocol(format!("Invalid tool result: {}", e)))?
            .unwrap_or_else(|| CallToolResult {
                content: Vec::new(),
                is_error: false,
            });

        Ok(result.joined_text())
    }

    /// Fetch the tool catalog the engine advertises.
    pub async fn list_tools(&mut self) -> EngineResult<Vec<EngineTool>> {
        let response = self.request("tools/list", json!({})).await?;
        if let Some(error) = response.error {
            return Err(EngineError::Protocol(error.message));
        }
        let tools = response
            .result
            .and_then(|mut v| v.get_mut("tools").map(Value::take))
            .unwrap_or_else(|| json!([]));
        serde_json::from_value(tools)
            .map_err(|e| EngineError::Protocol(format!("Invalid tool list: {}", e)))
    }

    /// Liveness check.
    pub async fn ping(&mut self) -> EngineResult<()> {
        let response = self.request("ping", json!({})).await?;
        match response.error {
            Some(error) => Err(EngineError::Protocol(error.message)),
            None => Ok(()),
        }
    }

    /// Terminate the engine process. Idempotent; safe after a failed connect.
    pub async fn close(&mut self) {
        if self.state != ClientState::Closed {
            self.transport.terminate().await;
            self.state = ClientState::Closed;
        }
    }

    async fn request(&mut self, method: &str, params: Value) -> EngineResult<RpcResponse> {
        if self.state == ClientState::Closed {
            return Err(EngineError::ConnectionClosed);
        }
        self.request_id += 1;
        let request = RpcRequest::new(method, self.request_id, params);
        self.transport.write_line(&request).await?;
        self.wait_response(self.request_id).await
    }

    async fn notify(&mut self, method: &str, params: Value) -> EngineResult<()> {
        let notification = RpcNotification::new(method, params);
        self.transport.write_line(&notification).await
    }

    /// Block until the line with the matching correlation id arrives.
    ///
    /// Non-matching lines (notifications, log spill on the channel, replies
    /// to ids we no longer await) are skipped, not buffered. Malformed lines
    /// are discarded the same way.
    async fn wait_response(&mut self, id: u64) -> EngineResult<RpcResponse> {
        loop {
            let line = self.transport.read_line().await?;
            let value: Value = match serde_json::from_str(&line) {
                Ok(value) => value,
                Err(_) => continue,
            };
            if value.get("id").and_then(Value::as_u64) != Some(id) {
                continue;
            }
            return serde_json::from_value(value)
                .map_err(|e| EngineError::Protocol(format!("Invalid response: {}", e)));
        }
    }
}
