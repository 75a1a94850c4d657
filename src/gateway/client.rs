//! Signed HTTP client for the OAuth-protected backend.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::StatusCode;
use serde_json::Value;

use super::{BackendApi, BackendRequest, GatewayError, HttpMethod};
use crate::auth::{AccessToken, TokenCache, TokenInfo};

/// Authenticated gateway. Owns the token cache shared by every session.
pub struct Gateway {
    http: reqwest::Client,
    tokens: Arc<TokenCache>,
    retry_on_unauthorized: bool,
}

impl Gateway {
    pub fn new(tokens: Arc<TokenCache>, timeout: Duration) -> Result<Self, GatewayError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GatewayError::Transport(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self {
            http,
            tokens,
            retry_on_unauthorized: false,
        })
    }

    /// Retry a call once with a freshly issued token after a 401.
    pub fn with_retry_on_unauthorized(mut self, enabled: bool) -> Self {
        self.retry_on_unauthorized = enabled;
        self
    }

    pub fn tokens(&self) -> &Arc<TokenCache> {
        &self.tokens
    }

    /// String-verb entry point. Unsupported verbs fail before any I/O.
    pub async fn call_raw(
        &self,
        method: &str,
        path: &str,
        body: Option<Value>,
        query: &[(String, String)],
    ) -> Result<Value, GatewayError> {
        let mut request = BackendRequest::parse(method, path)?;
        request.body = body;
        request.query = query.to_vec();
        self.call(request).await
    }

    fn url_for(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.tokens.credential().host(),
            path.trim_start_matches('/')
        )
    }

    async fn send_once(
        &self,
        request: &BackendRequest,
        token: &AccessToken,
    ) -> Result<Value, GatewayError> {
        let credential = self.tokens.credential();
        let url = self.url_for(&request.path);
        tracing::info!("{} {}", request.method, url);

        let mut builder = match request.method {
            HttpMethod::Get => self.http.get(&url),
            HttpMethod::Post => self.http.post(&url),
            HttpMethod::Put => self.http.put(&url),
            HttpMethod::Delete => self.http.delete(&url),
        }
        .header(AUTHORIZATION, token.authorization_header())
        .header(CONTENT_TYPE, "application/json")
        .header(ACCEPT, "application/json")
        .header("x-app-key", credential.app_key())
        .header("enterpriseId", credential.enterprise_id())
        .header("HashedAppKey", credential.hashed_app_key());

        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|e| {
            tracing::error!("Request error: {}", e);
            GatewayError::Transport(e.to_string())
        })?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!("Received 401 from {}, dropping rejected token", url);
            self.tokens.invalidate(token).await;
            return Err(GatewayError::AuthorizationExpired(body));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!("HTTP error {}: {}", status.as_u16(), body);
            return Err(GatewayError::Backend {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Value::Null);
        }
        serde_json::from_slice(&bytes).map_err(|e| GatewayError::Backend {
            status: status.as_u16(),
            body: format!("invalid JSON response: {}", e),
        })
    }
}

#[async_trait]
impl BackendApi for Gateway {
    async fn call(&self, request: BackendRequest) -> Result<Value, GatewayError> {
        if let Err(e) = request.validate() {
            tracing::warn!("Rejected {} {}: {}", request.method, request.path, e);
            return Err(e);
        }
        let token = self.tokens.get_token(false).await?;
        match self.send_once(&request, &token).await {
            Err(GatewayError::AuthorizationExpired(_)) if self.retry_on_unauthorized => {
                tracing::info!("Retrying {} {} with a fresh token", request.method, request.path);
                let token = self.tokens.get_token(true).await?;
                self.send_once(&request, &token).await
            }
            other => other,
        }
    }

    async fn token_info(&self) -> Result<TokenInfo, GatewayError> {
        Ok(self.tokens.get_token(false).await?.info())
    }

    fn base_url(&self) -> &str {
        self.tokens.credential().host()
    }

    fn enterprise_id(&self) -> &str {
        self.tokens.credential().enterprise_id()
    }
}
