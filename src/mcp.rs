//! Line-delimited JSON-RPC 2.0 server exposing the tool registry over stdio.
//!
//! Handles `initialize`, `ping`, `tools/list` and `tools/call`. Messages
//! without an `id` are notifications and never get a reply.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use crate::tools::{ToolCallResult, ToolRegistry};

pub const PROTOCOL_VERSION: &str = "2024-11-05";

const PARSE_ERROR: i64 = -32700;
const INVALID_REQUEST: i64 = -32600;
const METHOD_NOT_FOUND: i64 = -32601;
const INVALID_PARAMS: i64 = -32602;

#[derive(Debug, Deserialize)]
struct JsonRpcRequest {
    #[serde(default)]
    jsonrpc: Option<String>,
    #[serde(default)]
    id: Option<Value>,
    method: String,
    #[serde(default)]
    params: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: &'static str,
    pub id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JsonRpcError {
    pub code: i64,
    pub message: String,
}

impl JsonRpcResponse {
    fn result(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: Some(result),
            error: None,
        }
    }

    fn error(id: Value, code: i64, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: None,
            error: Some(JsonRpcError {
                code,
                message: message.into(),
            }),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ToolCallParams {
    name: String,
    #[serde(default)]
    arguments: Value,
}

/// Handle one raw input line.
pub async fn handle_line(registry: &ToolRegistry, line: &str) -> Option<JsonRpcResponse> {
    match serde_json::from_str::<Value>(line) {
        Ok(message) => handle_message(registry, message).await,
        Err(e) => Some(JsonRpcResponse::error(
            Value::Null,
            PARSE_ERROR,
            format!("parse error: {}", e),
        )),
    }
}

/// Handle one decoded message. Returns `None` for notifications.
pub async fn handle_message(registry: &ToolRegistry, message: Value) -> Option<JsonRpcResponse> {
    let fallback_id = message.get("id").cloned().unwrap_or(Value::Null);
    let request: JsonRpcRequest = match serde_json::from_value(message) {
        Ok(request) => request,
        Err(e) => {
            return Some(JsonRpcResponse::error(
                fallback_id,
                INVALID_REQUEST,
                format!("invalid request: {}", e),
            ))
        }
    };

    let Some(id) = request.id else {
        tracing::debug!("Notification: {}", request.method);
        return None;
    };
    if request.jsonrpc.as_deref() != Some("2.0") {
        return Some(JsonRpcResponse::error(
            id,
            INVALID_REQUEST,
            "invalid json-rpc version",
        ));
    }

    let response = match request.method.as_str() {
        "initialize" => JsonRpcResponse::result(
            id,
            json!({
                "protocolVersion": PROTOCOL_VERSION,
                "capabilities": { "tools": {} },
                "serverInfo": {
                    "name": env!("CARGO_PKG_NAME"),
                    "version": env!("CARGO_PKG_VERSION"),
                },
            }),
        ),
        "ping" => JsonRpcResponse::result(id, json!({})),
        "tools/list" => {
            let tools: Vec<Value> = registry
                .list()
                .iter()
                .map(|d| {
                    json!({
                        "name": d.name,
                        "description": d.description,
                        "inputSchema": d.input_schema(),
                    })
                })
                .collect();
            JsonRpcResponse::result(id, json!({ "tools": tools }))
        }
        "tools/call" => {
            let params = request.params.unwrap_or(Value::Null);
            match serde_json::from_value::<ToolCallParams>(params) {
                Ok(call) => {
                    let result = registry.call_tool(&call.name, &call.arguments).await;
                    JsonRpcResponse::result(id, tool_call_content(&result))
                }
                Err(e) => JsonRpcResponse::error(
                    id,
                    INVALID_PARAMS,
                    format!("invalid tools/call params: {}", e),
                ),
            }
        }
        other => JsonRpcResponse::error(id, METHOD_NOT_FOUND, format!("method not found: {}", other)),
    };
    Some(response)
}

fn tool_call_content(result: &ToolCallResult) -> Value {
    let (text, is_error) = match result {
        ToolCallResult::Success { payload } => (
            serde_json::to_string_pretty(payload).unwrap_or_else(|_| payload.to_string()),
            false,
        ),
        ToolCallResult::Failure { message } => (message.clone(), true),
    };
    json!({
        "content": [{ "type": "text", "text": text }],
        "isError": is_error,
    })
}

/// Serve requests from stdin until EOF, one JSON message per line.
pub async fn run_stdio(registry: &ToolRegistry) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        if let Some(response) = handle_line(registry, &line).await {
            let mut encoded = serde_json::to_string(&response)?;
            encoded.push('\n');
            stdout.write_all(encoded.as_bytes()).await?;
            stdout.flush().await?;
        }
    }
    tracing::info!("stdin closed, shutting down");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::testing::RecordingBackend;

    fn registry() -> (ToolRegistry, Arc<RecordingBackend>) {
        let backend = RecordingBackend::ok(json!({"reservations": {"id": 1}}));
        (ToolRegistry::new(backend.clone()), backend)
    }

    #[tokio::test]
    async fn initialize_reports_tool_capability() {
        let (registry, _) = registry();
        let response = handle_message(
            &registry,
            json!({"jsonrpc": "2.0", "id": 1, "method": "initialize", "params": {}}),
        )
        .await
        .unwrap();
        let result = response.result.unwrap();
        assert_eq!(result["protocolVersion"], PROTOCOL_VERSION);
        assert!(result["capabilities"]["tools"].is_object());
    }

    #[tokio::test]
    async fn tools_list_includes_schemas() {
        let (registry, _) = registry();
        let response = handle_message(
            &registry,
            json!({"jsonrpc": "2.0", "id": "a", "method": "tools/list"}),
        )
        .await
        .unwrap();
        assert_eq!(response.id, json!("a"));
        let tools = response.result.unwrap()["tools"].as_array().unwrap().clone();
        assert_eq!(tools.len(), 6);
        let reservation = tools.iter().find(|t| t["name"] == "get_reservation").unwrap();
        assert_eq!(reservation["inputSchema"]["type"], "object");
    }

    #[tokio::test]
    async fn tools_call_runs_through_registry() {
        let (registry, backend) = registry();
        let response = handle_message(
            &registry,
            json!({
                "jsonrpc": "2.0",
                "id": 7,
                "method": "tools/call",
                "params": {"name": "get_reservation", "arguments": {"hotel_id": "SYDH3", "reservation_id": "218290"}}
            }),
        )
        .await
        .unwrap();
        let result = response.result.unwrap();
        assert_eq!(result["isError"], false);
        assert!(result["content"][0]["text"].as_str().unwrap().contains("218290"));
        assert_eq!(backend.calls(), 1);
    }

    #[tokio::test]
    async fn tool_failure_is_reported_in_band() {
        let (registry, backend) = registry();
        let response = handle_message(
            &registry,
            json!({
                "jsonrpc": "2.0",
                "id": 8,
                "method": "tools/call",
                "params": {"name": "get_reservation", "arguments": {"reservation_id": "218290"}}
            }),
        )
        .await
        .unwrap();
        assert!(response.error.is_none());
        assert_eq!(response.result.unwrap()["isError"], true);
        assert_eq!(backend.calls(), 0);
    }

    #[tokio::test]
    async fn unknown_method_and_notifications() {
        let (registry, _) = registry();
        let response = handle_message(
            &registry,
            json!({"jsonrpc": "2.0", "id": 2, "method": "resources/list"}),
        )
        .await
        .unwrap();
        assert_eq!(response.error.unwrap().code, METHOD_NOT_FOUND);

        let none = handle_message(
            &registry,
            json!({"jsonrpc": "2.0", "method": "notifications/initialized"}),
        )
        .await;
        assert!(none.is_none());
    }

    #[tokio::test]
    async fn malformed_line_is_parse_error() {
        let (registry, _) = registry();
        let response = handle_line(&registry, "{not json").await.unwrap();
        assert_eq!(response.id, Value::Null);
        assert_eq!(response.error.unwrap().code, PARSE_ERROR);
    }
}
