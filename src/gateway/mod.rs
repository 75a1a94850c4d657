//! Authenticated request gateway.
//!
//! Every outbound backend call goes through [`BackendApi`]. The production
//! implementation is [`Gateway`], which signs requests with a cached bearer
//! token and the tenant headers; tests swap in their own implementation.

mod client;

pub use client::Gateway;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::auth::{AuthError, TokenInfo};

#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    #[error("Unsupported HTTP method: {0}")]
    InvalidMethod(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Backend answered 401. The cached token has been dropped; re-issuing the
    /// request will obtain a fresh one.
    #[error("API error: 401 - authorization expired: {0}")]
    AuthorizationExpired(String),

    #[error("API error: {status} - {body}")]
    Backend { status: u16, body: String },

    #[error("Failed to make request to API: {0}")]
    Transport(String),

    #[error(transparent)]
    TokenIssuance(#[from] AuthError),
}

/// HTTP verbs the backend accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }
}

impl std::str::FromStr for HttpMethod {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "GET" => Ok(Self::Get),
            "POST" => Ok(Self::Post),
            "PUT" => Ok(Self::Put),
            "DELETE" => Ok(Self::Delete),
            _ => Err(GatewayError::InvalidMethod(s.to_string())),
        }
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One backend call: verb, path relative to the host, optional JSON body,
/// query pairs, and any call-specific headers (routing keys).
#[derive(Debug, Clone, PartialEq)]
pub struct BackendRequest {
    pub method: HttpMethod,
    pub path: String,
    pub body: Option<Value>,
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
}

impl BackendRequest {
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
            query: Vec::new(),
            headers: Vec::new(),
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Post, path)
    }

    /// Parse a verb string; anything but GET/POST/PUT/DELETE is rejected
    /// before any I/O happens.
    pub fn parse(method: &str, path: impl Into<String>) -> Result<Self, GatewayError> {
        Ok(Self::new(method.parse()?, path))
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Reject shapes the backend cannot receive: a GET never carries a body.
    pub fn validate(&self) -> Result<(), GatewayError> {
        if self.method == HttpMethod::Get && self.body.is_some() {
            return Err(GatewayError::InvalidRequest(format!(
                "GET {} cannot carry a body",
                self.path
            )));
        }
        Ok(())
    }

    /// Attach a routing key such as `x-hotelid`.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

/// Seam between tools and the backend.
#[async_trait]
pub trait BackendApi: Send + Sync {
    async fn call(&self, request: BackendRequest) -> Result<Value, GatewayError>;

    /// Obtain (or reuse) a token and describe it without exposing its value.
    async fn token_info(&self) -> Result<TokenInfo, GatewayError>;

    /// Base URL of the backend.
    fn base_url(&self) -> &str;

    /// Tenant id sent with every request.
    fn enterprise_id(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_supported_methods_case_insensitively() {
        assert_eq!("get".parse::<HttpMethod>().unwrap(), HttpMethod::Get);
        assert_eq!("Delete".parse::<HttpMethod>().unwrap(), HttpMethod::Delete);
    }

    #[test]
    fn get_with_body_is_rejected() {
        let request = BackendRequest::get("/patients/search").with_body(serde_json::json!({"a": 1}));
        assert!(matches!(request.validate(), Err(GatewayError::InvalidRequest(_))));
        assert!(BackendRequest::post("/claims")
            .with_body(serde_json::json!({"a": 1}))
            .validate()
            .is_ok());
    }

    #[test]
    fn rejects_other_methods() {
        match BackendRequest::parse("PATCH", "/claims") {
            Err(GatewayError::InvalidMethod(m)) => assert_eq!(m, "PATCH"),
            other => panic!("unexpected: {:?}", other),
        }
    }
}
