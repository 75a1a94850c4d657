//! Text-completion service.
//!
//! The agent treats the model as `generate(prompt) -> text`; all prompt
//! formatting and response parsing happens on the caller's side.

mod gemini;

pub use gemini::GeminiClient;

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum LlmError {
    #[error("completion request failed: {0}")]
    Transport(String),

    #[error("completion service returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("completion service returned no text")]
    EmptyResponse,

    #[error("could not decode completion response: {0}")]
    Decode(String),
}

/// A black-box text-completion service.
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, LlmError>;
}
