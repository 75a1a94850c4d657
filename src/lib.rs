//! # OHIP Agent
//!
//! A conversational operations agent for hospitality backend APIs.
//!
//! This library provides:
//! - OAuth client-credentials token issuance with a single-flight cache
//! - An authenticated request gateway for the backend
//! - A tool registry exposing backend operations by name
//! - A dispatch loop that lets a completion service pick tools per utterance
//! - An HTTP API and a stdio JSON-RPC server over the same tools
//!
//! ## Architecture
//!
//! Each utterance is handled in one pass:
//! 1. Build a prompt from the tool catalog and recent conversation
//! 2. Ask the completion service to call tools or reply directly
//! 3. Run the chosen tools in order, each failure isolated
//! 4. Summarize the results into a single reply
//!
//! ## Example
//!
//! ```rust,ignore
//! use ohip_agent::{build_agent, config::Config};
//!
//! let config = Config::from_env()?;
//! let agent = build_agent(&config)?;
//! let mut history = agent.new_history();
//! let reply = agent.handle("Test the OAuth connection", &mut history).await;
//! ```

pub mod agent;
pub mod api;
pub mod auth;
pub mod config;
pub mod gateway;
pub mod llm;
pub mod mcp;
pub mod tools;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use config::Config;

use std::sync::Arc;

use agent::Agent;
use auth::{HttpTokenIssuer, TokenCache};
use gateway::Gateway;
use llm::GeminiClient;
use tools::ToolRegistry;

/// Wire credential, token cache and gateway into a tool registry.
pub fn build_registry(config: &Config) -> anyhow::Result<Arc<ToolRegistry>> {
    let backend = &config.backend;
    let issuer = HttpTokenIssuer::new(backend.scope.clone(), backend.request_timeout)?;
    let tokens = Arc::new(TokenCache::new(
        Arc::new(backend.credential()),
        Arc::new(issuer),
        backend.token_skew,
    ));
    let gateway = Gateway::new(tokens, backend.request_timeout)?
        .with_retry_on_unauthorized(backend.retry_on_unauthorized);
    Ok(Arc::new(ToolRegistry::new(Arc::new(gateway))))
}

/// Build the full agent: tool registry plus completion client.
pub fn build_agent(config: &Config) -> anyhow::Result<Agent> {
    let registry = build_registry(config)?;
    let llm = GeminiClient::new(&config.llm)?;
    tracing::info!("Completion model: {}", config.llm.model);
    Ok(Agent::new(Arc::new(llm), registry, config.history))
}
