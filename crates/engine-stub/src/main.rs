//! Stand-in engine server for integration tests.
//!
//! Speaks the same line-delimited JSON-RPC dialect as the real Blender
//! server, with an in-memory material store instead of a scene graph.

use std::io::{self, BufRead, Write};

use nodesmith::catalog::{
    material_tools, CREATE_MATERIAL_TOOL, LIST_MATERIALS_TOOL, SAVE_BLEND_TOOL,
};
use nodesmith::mcp::protocol::{RpcError, RpcResponse, JSONRPC_VERSION, PROTOCOL_VERSION};
use serde_json::{json, Value};

fn main() -> io::Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut materials: Vec<String> = Vec::new();

    for line in stdin.lock().lines() {
        let line = line?;
        let message: Value = match serde_json::from_str(&line) {
            Ok(message) => message,
            Err(_) => continue,
        };

        let method = message.get("method").and_then(Value::as_str).unwrap_or("");
        let id = match message.get("id").and_then(Value::as_u64) {
            Some(id) => id,
            // notifications get no reply
            None => continue,
        };
        let params = message.get("params").cloned().unwrap_or(Value::Null);

        let response = match method {
            "initialize" => ok(
                id,
                json!({
                    "protocolVersion": PROTOCOL_VERSION,
                    "serverInfo": {"name": "engine-stub", "version": "0.1.0"},
                }),
            ),
            "ping" => ok(id, json!({})),
            "tools/list" => {
                let tools: Vec<Value> = material_tools()
                    .iter()
                    .map(|tool| {
                        json!({
                            "name": tool.name,
                            "description": tool.description,
                            "inputSchema": tool.input_schema,
                        })
                    })
                    .collect();
                ok(id, json!({ "tools": tools }))
            }
            "tools/call" => {
                let name = params.get("name").and_then(Value::as_str).unwrap_or("");
                let arguments = params.get("arguments").cloned().unwrap_or(json!({}));
                match call_tool(name, &arguments, &mut materials) {
                    Some(result) => ok(id, result),
                    None => error(id, -32601, format!("Tool not found: {}", name)),
                }
            }
            other => error(id, -32601, format!("Method not found: {}", other)),
        };

        let serialized = serde_json::to_string(&response)
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e.to_string()))?;
        writeln!(stdout, "{}", serialized)?;
        stdout.flush()?;
    }

    Ok(())
}

fn call_tool(name: &str, arguments: &Value, materials: &mut Vec<String>) -> Option<Value> {
    let result = match name {
        CREATE_MATERIAL_TOOL => {
            let material = arguments
                .get("name")
                .and_then(Value::as_str)
                .unwrap_or("Material");
            let code = arguments
                .get("python_code")
                .and_then(Value::as_str)
                .unwrap_or("");
            // scripts that raise are reported as tool-level failures, the
            // way the real server wraps exec() exceptions
            if code.contains("raise") {
                return Some(tool_result(format!("Error executing script: {}", code), true));
            }
            materials.push(material.to_string());
            tool_result(format!("Material '{}' created successfully", material), false)
        }
        LIST_MATERIALS_TOOL => tool_result(
            if materials.is_empty() {
                "No materials in scene".to_string()
            } else {
                materials.join(", ")
            },
            false,
        ),
        SAVE_BLEND_TOOL => {
            let filepath = arguments
                .get("filepath")
                .and_then(Value::as_str)
                .unwrap_or_default();
            if filepath.is_empty() {
                tool_result("Error: filepath is required".to_string(), true)
            } else {
                tool_result(format!("Saved scene to {}", filepath), false)
            }
        }
        _ => return None,
    };
    Some(result)
}

fn tool_result(text: String, is_error: bool) -> Value {
    json!({
        "content": [{"type": "text", "text": text}],
        "isError": is_error,
    })
}

fn ok(id: u64, result: Value) -> RpcResponse {
    RpcResponse {
        jsonrpc: JSONRPC_VERSION.to_string(),
        id,
        result: Some(result),
        error: None,
    }
}

fn error(id: u64, code: i32, message: String) -> RpcResponse {
    RpcResponse {
        jsonrpc: JSONRPC_VERSION.to_string(),
        id,
        result: None,
        error: Some(RpcError {
            code,
            message,
            data: None,
        }),
    }
}
