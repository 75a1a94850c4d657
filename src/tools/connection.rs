//! Connectivity diagnostics: token issuance and API reachability.

use async_trait::async_trait;
use serde_json::{json, Value};

use super::{envelope, ParamSpec, Tool, ToolArguments, ToolError};
use crate::gateway::BackendApi;

/// Obtain a token and report on it.
pub struct TestOAuthToken;

#[async_trait]
impl Tool for TestOAuthToken {
    fn name(&self) -> &str {
        "test_oauth_token"
    }

    fn description(&self) -> &str {
        "Test OAuth token endpoint and authentication"
    }

    fn params(&self) -> Vec<ParamSpec> {
        Vec::new()
    }

    async fn execute(
        &self,
        _args: &ToolArguments,
        backend: &dyn BackendApi,
    ) -> Result<Value, ToolError> {
        tracing::info!("Testing OAuth token endpoint");
        let info = backend.token_info().await?;
        Ok(envelope(
            "OAuth token obtained successfully",
            json!({
                "token_preview": info.token_preview,
                "token_length": info.token_length,
                "expires_at": info.expires_at.to_rfc3339(),
            }),
        ))
    }
}

/// Token test plus backend coordinates.
pub struct TestApiConnection;

#[async_trait]
impl Tool for TestApiConnection {
    fn name(&self) -> &str {
        "test_api_connection"
    }

    fn description(&self) -> &str {
        "Test full API connection including OAuth authentication"
    }

    fn params(&self) -> Vec<ParamSpec> {
        Vec::new()
    }

    async fn execute(
        &self,
        args: &ToolArguments,
        backend: &dyn BackendApi,
    ) -> Result<Value, ToolError> {
        tracing::info!("Testing API connection");
        let oauth = TestOAuthToken.execute(args, backend).await?;
        Ok(envelope(
            "API connection test successful",
            json!({
                "oauth_test": oauth,
                "base_url": backend.base_url(),
                "enterprise_id": backend.enterprise_id(),
            }),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::testing::RecordingBackend;
    use crate::tools::{ToolCallRequest, ToolCallResult, ToolRegistry};

    #[tokio::test]
    async fn connection_test_reports_backend() {
        let backend = RecordingBackend::ok(json!({}));
        let registry = ToolRegistry::new(backend.clone());

        let result = registry
            .invoke(&ToolCallRequest::new("test_api_connection"))
            .await;
        let ToolCallResult::Success { payload } = result else {
            panic!("expected success");
        };
        assert_eq!(payload["data"]["base_url"], "https://ohip.example.com");
        assert_eq!(payload["data"]["enterprise_id"], "PSALES");
        assert_eq!(payload["data"]["oauth_test"]["data"]["token_length"], 812);
    }
}
