//! Tool registry and the backend operations exposed as tools.
//!
//! `list()` and `invoke()` form the tool protocol boundary: the agent loop,
//! the HTTP API, and the stdio server all go through them. `invoke` never
//! returns an error; every failure becomes a [`ToolCallResult::Failure`] so a
//! caller running several tools can keep going after one fails.

mod connection;
mod patient;
mod protocol;
mod reservation;

pub use connection::{TestApiConnection, TestOAuthToken};
pub use patient::{GetPatientClaims, SearchPatient, SubmitClaim};
pub use protocol::{
    arguments_from_json, ArgValue, ParamKind, ParamSpec, ToolArguments, ToolCallRequest,
    ToolCallResult, ToolDefinition,
};
pub use reservation::GetReservation;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};
use thiserror::Error;

use crate::gateway::{BackendApi, GatewayError};

#[derive(Debug, Clone, Error)]
pub enum ToolError {
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Missing required argument(s): {}", .0.join(", "))]
    MissingArgument(Vec<String>),

    #[error("Invalid value for '{name}': {reason}")]
    InvalidArgument { name: String, reason: String },

    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

/// A backend operation callable by name.
#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    fn params(&self) -> Vec<ParamSpec>;

    /// How to summarize a successful payload for a person, if at all.
    fn summary_brief(&self) -> Option<&str> {
        None
    }

    /// Run with arguments already validated against `params()`.
    async fn execute(&self, args: &ToolArguments, backend: &dyn BackendApi)
        -> Result<Value, ToolError>;
}

/// Static catalog of tools bound to one backend.
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
    index: HashMap<String, usize>,
    backend: Arc<dyn BackendApi>,
}

impl ToolRegistry {
    /// Registry with the full built-in catalog.
    pub fn new(backend: Arc<dyn BackendApi>) -> Self {
        let mut registry = Self::empty(backend);
        registry.register(Arc::new(TestOAuthToken));
        registry.register(Arc::new(TestApiConnection));
        registry.register(Arc::new(SearchPatient));
        registry.register(Arc::new(GetPatientClaims));
        registry.register(Arc::new(SubmitClaim));
        registry.register(Arc::new(GetReservation));
        registry
    }

    pub fn empty(backend: Arc<dyn BackendApi>) -> Self {
        Self {
            tools: Vec::new(),
            index: HashMap::new(),
            backend,
        }
    }

    /// Add a tool. A later registration under the same name replaces the
    /// earlier one in place.
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        let name = tool.name().to_string();
        match self.index.get(&name) {
            Some(&slot) => self.tools[slot] = tool,
            None => {
                self.index.insert(name, self.tools.len());
                self.tools.push(tool);
            }
        }
    }

    /// Definitions in registration order.
    pub fn list(&self) -> Vec<ToolDefinition> {
        self.tools.iter().map(|t| definition_of(t.as_ref())).collect()
    }

    pub fn definition(&self, name: &str) -> Option<ToolDefinition> {
        self.find(name).map(definition_of)
    }

    fn find(&self, name: &str) -> Option<&dyn Tool> {
        self.index.get(name).map(|&i| self.tools[i].as_ref())
    }

    /// Validate and run one tool call.
    pub async fn invoke(&self, request: &ToolCallRequest) -> ToolCallResult {
        match self.try_invoke(request).await {
            Ok(payload) => ToolCallResult::Success { payload },
            Err(e) => {
                tracing::warn!("Tool {} failed: {}", request.tool_name, e);
                ToolCallResult::Failure {
                    message: e.to_string(),
                }
            }
        }
    }

    /// Protocol-level entry point: name plus raw JSON arguments.
    pub async fn call_tool(&self, name: &str, arguments: &Value) -> ToolCallResult {
        let arguments = match arguments {
            Value::Null => ToolArguments::new(),
            Value::Object(object) => match arguments_from_json(object) {
                Ok(args) => args,
                Err(e) => {
                    return ToolCallResult::Failure {
                        message: format!("Invalid arguments: {}", e),
                    }
                }
            },
            _ => {
                return ToolCallResult::Failure {
                    message: "Invalid arguments: expected an object".to_string(),
                }
            }
        };
        self.invoke(&ToolCallRequest {
            tool_name: name.to_string(),
            arguments,
        })
        .await
    }

    async fn try_invoke(&self, request: &ToolCallRequest) -> Result<Value, ToolError> {
        let tool = self
            .find(&request.tool_name)
            .ok_or_else(|| ToolError::UnknownTool(request.tool_name.clone()))?;
        let args = definition_of(tool).validate(&request.arguments)?;
        tracing::info!("Calling tool: {} with args: {:?}", request.tool_name, args);
        tool.execute(&args, self.backend.as_ref()).await
    }
}

fn definition_of(tool: &dyn Tool) -> ToolDefinition {
    ToolDefinition {
        name: tool.name().to_string(),
        description: tool.description().to_string(),
        params: tool.params(),
        summary_brief: tool.summary_brief().map(str::to_string),
    }
}

/// Standard `{status, message, data}` envelope for tool payloads.
pub(crate) fn envelope(message: impl Into<String>, data: Value) -> Value {
    json!({
        "status": "success",
        "message": message.into(),
        "data": data,
    })
}

/// Text form of a validated argument, if present.
pub(crate) fn arg_text(args: &ToolArguments, name: &str) -> Option<String> {
    args.get(name).map(ArgValue::as_text)
}

/// Text form of a validated required argument.
pub(crate) fn required_text(args: &ToolArguments, name: &str) -> Result<String, ToolError> {
    arg_text(args, name)
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| ToolError::MissingArgument(vec![name.to_string()]))
}
