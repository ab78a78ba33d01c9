//! Integration tests for the MCP handlers and the stdio loop.
//!
//! Tests exercise `handlers::dispatch` directly with a recording launcher,
//! and drive `McpServer::serve` over in-memory buffers for the
//! initialization gate.

mod common;

use common::toolbox_with;
use mcp_toolbox_server::config::ServerConfig;
use mcp_toolbox_server::handlers;
use mcp_toolbox_server::protocol::{JsonRpcRequest, RpcId};
use mcp_toolbox_server::server::McpServer;
use mcp_toolbox_server::toolbox::Toolbox;
use serde_json::{json, Value};

fn request(id: i64, method: &str, params: Option<Value>) -> JsonRpcRequest {
    JsonRpcRequest {
        jsonrpc: "2.0".into(),
        id: Some(RpcId::Number(id)),
        method: method.into(),
        params,
    }
}

fn all_catalogs() -> Toolbox {
    let launcher = common::RecordingLauncher::new();
    Toolbox::with_launcher(ServerConfig::default(), launcher).unwrap()
}

/// Parse the outcome carried in a tools/call result.
fn outcome_of(result: &Value) -> Value {
    let text = result["content"][0]["text"].as_str().unwrap();
    serde_json::from_str(text).unwrap()
}

// ---------------------------------------------------------------------------
// initialize / ping
// ---------------------------------------------------------------------------

#[tokio::test]
async fn initialize_reports_server_info() {
    let toolbox = all_catalogs();
    let req = request(
        1,
        "initialize",
        Some(json!({
            "protocolVersion": "2024-11-05",
            "clientInfo": {"name": "test-client", "version": "0.1"}
        })),
    );

    let response = handlers::dispatch(&req, &toolbox).await.unwrap();
    let result = response.result.unwrap();
    assert_eq!(result["serverInfo"]["name"], "mcp-toolbox-server");
    assert!(result["capabilities"]["tools"].is_object());
}

#[tokio::test]
async fn ping_returns_empty_object() {
    let toolbox = all_catalogs();
    let response = handlers::dispatch(&request(2, "ping", None), &toolbox).await.unwrap();
    assert_eq!(response.result, Some(json!({})));
}

// ---------------------------------------------------------------------------
// tools/list
// ---------------------------------------------------------------------------

#[tokio::test]
async fn tools_list_is_sorted_and_includes_health() {
    let toolbox = all_catalogs();
    let response = handlers::dispatch(&request(3, "tools/list", None), &toolbox)
        .await
        .unwrap();
    let result = response.result.unwrap();
    let tools = result["tools"].as_array().unwrap();

    let names: Vec<&str> = tools.iter().map(|t| t["name"].as_str().unwrap()).collect();
    let mut sorted = names.clone();
    sorted.sort_unstable();
    assert_eq!(names, sorted, "tools must be listed in name order");
    assert!(names.contains(&"health"));
    assert!(names.contains(&"pci.list_devices"));
    assert!(names.contains(&"gitee.create_issue"));

    for tool in tools {
        assert!(tool["description"].as_str().is_some_and(|d| !d.is_empty()));
        assert_eq!(tool["inputSchema"]["type"], "object", "{}", tool["name"]);
        jsonschema::validator_for(&tool["inputSchema"])
            .unwrap_or_else(|e| panic!("{}: schema does not compile: {e}", tool["name"]));
    }
}

#[tokio::test]
async fn tools_list_honours_catalog_selection() {
    let (toolbox, _launcher) = toolbox_with(&["sysctl"], ServerConfig::default());
    let response = handlers::dispatch(&request(4, "tools/list", None), &toolbox)
        .await
        .unwrap();
    let result = response.result.unwrap();
    let names: Vec<&str> = result["tools"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["name"].as_str().unwrap())
        .collect();
    assert_eq!(
        names,
        vec!["health", "sysctl.get_param", "sysctl.list_params", "sysctl.set_param"]
    );
}

// ---------------------------------------------------------------------------
// tools/call
// ---------------------------------------------------------------------------

#[tokio::test]
async fn tools_call_wraps_outcome_as_text() {
    let (toolbox, launcher) = toolbox_with(&["sysctl"], ServerConfig::default());
    launcher.reply_process(0, "net.ipv4.ip_forward = 1\n", "");

    let req = request(
        5,
        "tools/call",
        Some(json!({"name": "sysctl.get_param", "arguments": {"param": "net.ipv4.ip_forward"}})),
    );
    let response = handlers::dispatch(&req, &toolbox).await.unwrap();
    let result = response.result.unwrap();

    assert_ne!(result["isError"], true);
    assert_eq!(result["content"][0]["type"], "text");
    let outcome = outcome_of(&result);
    assert_eq!(outcome["ok"], true);
    assert_eq!(launcher.process_calls()[0].command.program, "sysctl");
}

#[tokio::test]
async fn tools_call_unknown_tool_is_error_result() {
    let toolbox = all_catalogs();
    let req = request(6, "tools/call", Some(json!({"name": "nope"})));

    let response = handlers::dispatch(&req, &toolbox).await.unwrap();
    assert!(response.error.is_none(), "tool failures are results, not JSON-RPC errors");
    let result = response.result.unwrap();
    assert_eq!(result["isError"], true);

    let outcome = outcome_of(&result);
    assert_eq!(outcome["ok"], false);
    assert_eq!(outcome["error"]["kind"], "ValidationError");
    assert_eq!(outcome["error"]["message"], "Unknown tool: nope");
}

#[tokio::test]
async fn tools_call_without_params_is_invalid_params() {
    let toolbox = all_catalogs();
    let response = handlers::dispatch(&request(7, "tools/call", None), &toolbox)
        .await
        .unwrap();
    assert_eq!(response.error.unwrap().code, -32602);
}

#[tokio::test]
async fn tools_call_with_malformed_params_is_invalid_params() {
    let toolbox = all_catalogs();
    let req = request(8, "tools/call", Some(json!({"arguments": {}})));
    let response = handlers::dispatch(&req, &toolbox).await.unwrap();
    assert_eq!(response.error.unwrap().code, -32602);
}

// ---------------------------------------------------------------------------
// Unknown methods
// ---------------------------------------------------------------------------

#[tokio::test]
async fn unknown_method_is_method_not_found() {
    let toolbox = all_catalogs();
    let response = handlers::dispatch(&request(9, "resources/list", None), &toolbox)
        .await
        .unwrap();
    assert_eq!(response.error.unwrap().code, -32601);
}

#[tokio::test]
async fn unknown_notification_gets_no_response() {
    let toolbox = all_catalogs();
    let req = JsonRpcRequest {
        jsonrpc: "2.0".into(),
        id: None,
        method: "notifications/cancelled".into(),
        params: None,
    };
    assert!(handlers::dispatch(&req, &toolbox).await.is_none());
}

// ---------------------------------------------------------------------------
// stdio loop
// ---------------------------------------------------------------------------

async fn serve(input: &str) -> Vec<Value> {
    let mut server = McpServer::new(all_catalogs());
    let mut output = Vec::new();
    server.serve(input.as_bytes(), &mut output).await.unwrap();
    String::from_utf8(output)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

#[tokio::test]
async fn requests_before_initialize_are_rejected() {
    let responses = serve(concat!(
        r#"{"jsonrpc":"2.0","id":1,"method":"tools/list"}"#,
        "\n",
        r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
        "\n",
        r#"{"jsonrpc":"2.0","id":2,"method":"initialize","params":{}}"#,
        "\n",
        r#"{"jsonrpc":"2.0","id":3,"method":"ping"}"#,
        "\n",
    ))
    .await;

    assert_eq!(responses.len(), 3);
    assert_eq!(responses[0]["id"], 1);
    assert_eq!(responses[0]["error"]["code"], -32600);
    assert_eq!(responses[1]["id"], 2);
    assert!(responses[1]["result"]["serverInfo"].is_object());
    assert_eq!(responses[2]["result"], json!({}));
}

#[tokio::test]
async fn malformed_lines_get_parse_errors_and_serving_continues() {
    let responses = serve(concat!(
        "{not json\n",
        "\n",
        r#"{"jsonrpc":"1.0","id":1,"method":"initialize"}"#,
        "\n",
        r#"{"jsonrpc":"2.0","id":2,"method":"initialize"}"#,
        "\n",
    ))
    .await;

    assert_eq!(responses.len(), 3);
    assert_eq!(responses[0]["error"]["code"], -32700);
    assert!(responses[0]["id"].is_null());
    assert_eq!(responses[1]["error"]["code"], -32600);
    assert!(responses[2]["result"].is_object());
}
