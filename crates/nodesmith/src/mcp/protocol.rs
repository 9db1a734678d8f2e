//! JSON-RPC 2.0 based protocol types for talking to the engine server.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

pub const PROTOCOL_VERSION: &str = "2024-11-05";
pub const JSONRPC_VERSION: &str = "2.0";

#[derive(Debug, Error)]
pub enum EngineError {
    /// I/O failure on the child process pipes
    #[error("Transport error: {0}")]
    Transport(String),

    /// The child closed its output stream while a reply was outstanding
    #[error("Engine closed the connection")]
    ConnectionClosed,

    /// Invalid JSON-RPC traffic
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// The handshake did not complete
    #[error("Engine startup failed: {0}")]
    Startup(String),
}

pub type EngineResult<T> = std::result::Result<T, EngineError>;

/// JSON-RPC request carrying a correlation id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcRequest {
    pub jsonrpc: String,
    pub id: u64,
    pub method: String,
    pub params: Value,
}

impl RpcRequest {
    pub fn new(method: impl Into<String>, id: u64, params: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            method: method.into(),
            params,
        }
    }
}

/// One-way notification; carries no id and expects no reply.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcNotification {
    pub jsonrpc: String,
    pub method: String,
    pub params: Value,
}

impl RpcNotification {
    pub fn new(method: impl Into<String>, params: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            method: method.into(),
            params,
        }
    }
}

/// JSON-RPC response, matched back to its request by id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcResponse {
    pub jsonrpc: String,
    pub id: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcError {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// A content block inside a tool result.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ToolContent {
    Text { text: String },
}

impl ToolContent {
    pub fn text<S: Into<String>>(text: S) -> Self {
        ToolContent::Text { text: text.into() }
    }

    pub fn as_text(&self) -> &str {
        match self {
            ToolContent::Text { text } => text,
        }
    }
}

/// Result payload of a `tools/call` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallToolResult {
    #[serde(default)]
    pub content: Vec<ToolContent>,
    #[serde(default, rename = "isError")]
    pub is_error: bool,
}

impl CallToolResult {
    /// Join all text blocks in order, newline separated.
    pub fn joined_text(&self) -> String {
        self.content
            .iter()
            .map(|c| c.as_text())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// A tool advertised by the engine in `tools/list`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineTool {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, rename = "inputSchema")]
    pub input_schema: Value,
}

/// Result payload of an `initialize` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitializeResult {
    #[serde(rename = "protocolVersion")]
    pub protocol_version: String,
    #[serde(default, rename = "serverInfo")]
    pub server_info: Option<ServerInfo>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerInfo {
    pub name: String,
    #[serde(default)]
    pub version: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_serialization() {
        let request = RpcRequest::new("tools/list", 1, json!({}));
        let line = serde_json::to_string(&request).unwrap();
        assert!(line.contains("\"jsonrpc\":\"2.0\""));
        assert!(line.contains("\"method\":\"tools/list\""));
        assert!(line.contains("\"id\":1"));
    }

    #[test]
    fn test_notification_has_no_id() {
        let note = RpcNotification::new("notifications/initialized", json!({}));
        let line = serde_json::to_string(&note).unwrap();
        assert!(!line.contains("\"id\""));
    }

    #[test]
    fn test_error_response_deserialization() {
        let line = r#"{"jsonrpc":"2.0","id":3,"error":{"code":-32601,"message":"Method not found"}}"#;
        let response: RpcResponse = serde_json::from_str(line).unwrap();
        assert_eq!(response.id, 3);
        assert!(response.result.is_none());
        assert_eq!(response.error.unwrap().message, "Method not found");
    }

    #[test]
    fn test_call_tool_result_joined_text() {
        let result: CallToolResult = serde_json::from_str(
            r#"{"content":[{"type":"text","text":"one"},{"type":"text","text":"two"}],"isError":false}"#,
        )
        .unwrap();
        assert_eq!(result.joined_text(), "one\ntwo");
        assert!(!result.is_error);
    }

    #[test]
    fn test_call_tool_result_defaults() {
        let result: CallToolResult = serde_json::from_str("{}").unwrap();
        assert!(result.content.is_empty());
        assert!(!result.is_error);
    }
}
