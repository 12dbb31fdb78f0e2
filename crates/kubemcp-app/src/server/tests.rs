use std::collections::HashMap;
use std::path::PathBuf;

use kubemcp_core::{ConfigLocation, ConnectionManager, KubeClientFactory};
use tempfile::TempDir;

use super::*;

const KUBECONFIG: &str = r#"
clusters:
- name: local
  cluster:
    server: https://127.0.0.1:6443
users:
- name: admin
  user:
    token: secret
contexts:
- name: kind-local
  context:
    cluster: local
    user: admin
current-context: kind-local
"#;

fn server() -> (TempDir, Arc<ToolServer>) {
    let dir = tempfile::tempdir().unwrap();
    let path: PathBuf = dir.path().join("config");
    std::fs::write(&path, KUBECONFIG).unwrap();

    let manager = ConnectionManager::new(KubeClientFactory).with_location(ConfigLocation::Custom(path));
    let registry = ToolRegistry::new(Arc::new(manager));
    (dir, Arc::new(ToolServer::new(registry, "kubemcp-test")))
}

async fn request(server: &ToolServer, frame: Value) -> JsonRpcResponse {
    server.handle_line(&frame.to_string()).await.unwrap()
}

#[tokio::test]
async fn initialize_reports_server_info() {
    let (_dir, server) = server();
    let response = request(&server, json!({ "jsonrpc": "2.0", "id": 1, "method": "initialize", "params": {} })).await;

    let result = response.result.unwrap();
    assert_eq!(result["protocolVersion"], PROTOCOL_VERSION);
    assert_eq!(result["serverInfo"]["name"], "kubemcp-test");
    assert_eq!(result["serverInfo"]["version"], env!("CARGO_PKG_VERSION"));
    assert!(result["capabilities"]["tools"].is_object());
}

#[tokio::test]
async fn notifications_get_no_response() {
    let (_dir, server) = server();
    let frame = json!({ "jsonrpc": "2.0", "method": "notifications/initialized" });
    assert!(server.handle_line(&frame.to_string()).await.is_none());

    let frame = json!({ "jsonrpc": "2.0", "method": "something/unknown" });
    assert!(server.handle_line(&frame.to_string()).await.is_none());
}

#[tokio::test]
async fn ping_returns_empty_result() {
    let (_dir, server) = server();
    let response = request(&server, json!({ "jsonrpc": "2.0", "id": "p", "method": "ping" })).await;
    assert_eq!(response.id, Some(json!("p")));
    assert_eq!(response.result, Some(json!({})));
}

#[tokio::test]
async fn tools_list_exposes_schemas() {
    let (_dir, server) = server();
    let response = request(&server, json!({ "jsonrpc": "2.0", "id": 2, "method": "tools/list" })).await;

    let tools = response.result.unwrap()["tools"].as_array().unwrap().clone();
    assert_eq!(tools.len(), 21);
    let switch = tools.iter().find(|t| t["name"] == "switch_context").unwrap();
    assert_eq!(switch["inputSchema"]["required"], json!(["contextName"]));
}

#[tokio::test]
async fn tools_call_returns_tool_result() {
    let (_dir, server) = server();
    let response = request(
        &server,
        json!({ "jsonrpc": "2.0", "id": 3, "method": "tools/call", "params": { "name": "get_current_context" } }),
    )
    .await;

    let result = response.result.unwrap();
    assert_eq!(result["content"][0]["type"], "text");
    assert_eq!(result["content"][0]["text"], "Current context: kind-local");
    assert_eq!(result["isError"], false);
}

#[tokio::test]
async fn failing_tool_sets_is_error() {
    let (_dir, server) = server();
    let response = request(
        &server,
        json!({
            "jsonrpc": "2.0", "id": 4, "method": "tools/call",
            "params": { "name": "switch_context", "arguments": { "contextName": "missing" } }
        }),
    )
    .await;

    assert!(response.error.is_none());
    let result = response.result.unwrap();
    assert_eq!(result["isError"], true);
    assert!(result["content"][0]["text"].as_str().unwrap().contains("'missing' does not exist"));
}

#[tokio::test]
async fn protocol_errors_use_json_rpc_codes() {
    let (_dir, server) = server();

    let response = server.handle_line("{not json").await.unwrap();
    assert_eq!(response.error.unwrap().code, PARSE_ERROR);
    assert_eq!(response.id, None);

    let response = request(&server, json!({ "jsonrpc": "2.0", "id": 5, "method": "resources/list" })).await;
    assert_eq!(response.error.unwrap().code, METHOD_NOT_FOUND);

    let response = request(&server, json!({ "jsonrpc": "2.0", "id": 6, "method": "tools/call", "params": {} })).await;
    assert_eq!(response.error.unwrap().code, INVALID_PARAMS);

    let response = request(
        &server,
        json!({ "jsonrpc": "2.0", "id": 7, "method": "tools/call", "params": { "name": "drain_cluster" } }),
    )
    .await;
    assert_eq!(response.error.unwrap().code, INVALID_PARAMS);

    let response = request(&server, json!({ "jsonrpc": "2.0", "id": 8 })).await;
    let error = response.error.unwrap();
    assert_eq!(error.code, INVALID_REQUEST);
    assert_eq!(response.id, Some(json!(8)));
}

#[tokio::test]
async fn serve_answers_every_request_then_stops_at_eof() {
    let (_dir, server) = server();
    let input = [
        json!({ "jsonrpc": "2.0", "id": 1, "method": "initialize", "params": {} }).to_string(),
        json!({ "jsonrpc": "2.0", "method": "notifications/initialized" }).to_string(),
        String::new(),
        json!({ "jsonrpc": "2.0", "id": 2, "method": "tools/list" }).to_string(),
        json!({ "jsonrpc": "2.0", "id": 3, "method": "tools/call", "params": { "name": "list_contexts" } }).to_string(),
        "garbage".to_string(),
    ]
    .join("\n");

    let mut output = Vec::new();
    server.serve(input.as_bytes(), &mut output).await.unwrap();

    let responses: Vec<JsonRpcResponse> = String::from_utf8(output)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(responses.len(), 4);

    let by_id: HashMap<String, &JsonRpcResponse> =
        responses.iter().map(|r| (r.id.clone().unwrap_or(Value::Null).to_string(), r)).collect();
    assert!(by_id["1"].result.is_some());
    assert!(by_id["2"].result.is_some());
    let listing = by_id["3"].result.as_ref().unwrap()["content"][0]["text"].as_str().unwrap();
    assert!(listing.contains("* kind-local (cluster: local, user: admin)"));
    assert_eq!(by_id["null"].error.as_ref().unwrap().code, PARSE_ERROR);
}
