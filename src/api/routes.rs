//! HTTP route handlers.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde_json::Value;
use uuid::Uuid;

use super::types::{
    ChatRequest, ChatResponse, HealthResponse, ToolDescriptor, ToolListResponse, WelcomeResponse,
};
use super::AppState;
use crate::tools::ToolCallResult;

pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        tools: state.agent.tools().list().len(),
        sessions: state.sessions.len().await,
    })
}

pub async fn welcome(State(state): State<Arc<AppState>>) -> Json<WelcomeResponse> {
    Json(WelcomeResponse {
        message: state.agent.welcome_message(),
    })
}

pub async fn list_tools(State(state): State<Arc<AppState>>) -> Json<ToolListResponse> {
    let tools = state
        .agent
        .tools()
        .list()
        .iter()
        .map(ToolDescriptor::from)
        .collect();
    Json(ToolListResponse { tools })
}

/// Invoke one tool directly, bypassing the decision step.
///
/// An empty body means no arguments; anything else must be valid JSON.
pub async fn call_tool(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    body: Bytes,
) -> Result<Json<ToolCallResult>, (StatusCode, String)> {
    let registry = state.agent.tools();
    if registry.definition(&name).is_none() {
        return Err((StatusCode::NOT_FOUND, format!("Unknown tool: {}", name)));
    }
    let arguments = parse_arguments(&body)
        .map_err(|e| (StatusCode::BAD_REQUEST, format!("Invalid arguments: {}", e)))?;
    Ok(Json(registry.call_tool(&name, &arguments).await))
}

fn parse_arguments(body: &[u8]) -> Result<Value, serde_json::Error> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Null);
    }
    serde_json::from_slice(body)
}

pub async fn chat(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, (StatusCode, String)> {
    if req.message.trim().is_empty() {
        return Err((StatusCode::BAD_REQUEST, "message is required".to_string()));
    }

    let session_id = req.session_id.unwrap_or_else(Uuid::new_v4);
    let session = state
        .sessions
        .checkout(session_id, || state.agent.new_history())
        .await;

    // one exchange at a time per session keeps the history ordered
    let mut history = session.lock().await;
    let reply = state.agent.handle(req.message.trim(), &mut history).await;

    Ok(Json(ChatResponse { session_id, reply }))
}

pub async fn delete_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> StatusCode {
    if state.sessions.remove(&id).await {
        tracing::info!("Session {} cleared", id);
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    }
}
