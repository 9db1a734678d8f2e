//! Drives the real client against the stub binary over stdio.

use nodesmith::catalog::{CREATE_MATERIAL_TOOL, LIST_MATERIALS_TOOL, SAVE_BLEND_TOOL};
use nodesmith::mcp::EngineClient;
use serde_json::json;

async fn connect_stub() -> EngineClient {
    EngineClient::connect(env!("CARGO_BIN_EXE_engine-stub"), &[])
        .await
        .unwrap()
}

#[tokio::test]
async fn test_handshake_and_tool_listing() {
    let mut client = connect_stub().await;

    let tools = client.list_tools().await.unwrap();
    let names: Vec<&str> = tools.iter().map(|t| t.name.as_str()).collect();
    assert!(names.contains(&CREATE_MATERIAL_TOOL));
    assert!(names.contains(&LIST_MATERIALS_TOOL));
    assert!(names.contains(&SAVE_BLEND_TOOL));

    client.ping().await.unwrap();
    client.close().await;
}

#[tokio::test]
async fn test_create_then_list_materials() {
    let mut client = connect_stub().await;

    let created = client
        .call_tool(
            CREATE_MATERIAL_TOOL,
            &json!({"name": "Rusty Metal", "python_code": "import bpy"}),
        )
        .await
        .unwrap();
    assert!(created.contains("Rusty Metal"));
    assert!(created.contains("created successfully"));

    let listing = client
        .call_tool(LIST_MATERIALS_TOOL, &json!({}))
        .await
        .unwrap();
    assert!(listing.contains("Rusty Metal"));

    client.close().await;
}

#[tokio::test]
async fn test_failing_script_surfaces_as_text() {
    let mut client = connect_stub().await;

    let result = client
        .call_tool(
            CREATE_MATERIAL_TOOL,
            &json!({"name": "Broken", "python_code": "raise RuntimeError('no')"}),
        )
        .await
        .unwrap();
    assert!(result.contains("Error executing script"));

    // the failed creation must not have been recorded
    let listing = client
        .call_tool(LIST_MATERIALS_TOOL, &json!({}))
        .await
        .unwrap();
    assert!(listing.contains("No materials"));

    client.close().await;
}

#[tokio::test]
async fn test_unknown_tool_becomes_error_string() {
    let mut client = connect_stub().await;

    let result = client
        .call_tool("sculpt_dragon", &json!({}))
        .await
        .unwrap();
    assert_eq!(result, "Error: Tool not found: sculpt_dragon");

    client.close().await;
}

#[tokio::test]
async fn test_save_requires_filepath() {
    let mut client = connect_stub().await;

    let missing = client
        .call_tool(SAVE_BLEND_TOOL, &json!({}))
        .await
        .unwrap();
    assert!(missing.contains("filepath is required"));

    let saved = client
        .call_tool(SAVE_BLEND_TOOL, &json!({"filepath": "/tmp/scene.blend"}))
        .await
        .unwrap();
    assert!(saved.contains("/tmp/scene.blend"));

    client.close().await;
}
