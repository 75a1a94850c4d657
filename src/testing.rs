//! Shared test doubles for the completion service and the backend.
//!
//! Gated behind the `test-support` cargo feature so production builds are
//! unaffected. The integration tests enable it through the self
//! dev-dependency in `Cargo.toml`.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;

use crate::auth::TokenInfo;
use crate::gateway::{BackendApi, BackendRequest, GatewayError};
use crate::llm::{LlmClient, LlmError};

/// Completion double replaying scripted answers in order and recording prompts.
/// Answers [`LlmError::EmptyResponse`] once the script runs out.
pub struct ScriptedLlm {
    replies: Mutex<VecDeque<Result<String, LlmError>>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedLlm {
    pub fn new(replies: Vec<Result<String, LlmError>>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub fn replying(replies: &[&str]) -> Arc<Self> {
        Self::new(replies.iter().map(|r| Ok(r.to_string())).collect())
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts
            .lock()
            .map(|prompts| prompts.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl LlmClient for ScriptedLlm {
    async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.to_string());
        }
        self.replies
            .lock()
            .ok()
            .and_then(|mut replies| replies.pop_front())
            .unwrap_or(Err(LlmError::EmptyResponse))
    }
}

type Responder = Box<dyn Fn(&BackendRequest) -> Result<Value, GatewayError> + Send + Sync>;

/// Backend double: counts calls, records requests, answers from a closure.
pub struct RecordingBackend {
    calls: AtomicUsize,
    requests: Mutex<Vec<BackendRequest>>,
    responder: Responder,
}

impl RecordingBackend {
    pub fn new<F>(responder: F) -> Arc<Self>
    where
        F: Fn(&BackendRequest) -> Result<Value, GatewayError> + Send + Sync + 'static,
    {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
            responder: Box::new(responder),
        })
    }

    pub fn ok(value: Value) -> Arc<Self> {
        Self::new(move |_| Ok(value.clone()))
    }

    /// Backend calls plus token lookups.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<BackendRequest> {
        self.requests
            .lock()
            .map(|requests| requests.clone())
            .unwrap_or_default()
    }

    pub fn last_request(&self) -> Option<BackendRequest> {
        self.requests().pop()
    }
}

#[async_trait]
impl BackendApi for RecordingBackend {
    async fn call(&self, request: BackendRequest) -> Result<Value, GatewayError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let result = (self.responder)(&request);
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request);
        }
        result
    }

    async fn token_info(&self) -> Result<TokenInfo, GatewayError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(TokenInfo {
            token_preview: "eyJhbGciOiJSUzI1NiIs...".to_string(),
            token_length: 812,
            token_type: "Bearer".to_string(),
            expires_at: Utc::now(),
        })
    }

    fn base_url(&self) -> &str {
        "https://ohip.example.com"
    }

    fn enterprise_id(&self) -> &str {
        "PSALES"
    }
}
