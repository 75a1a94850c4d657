//! Shared setup for the integration tests.

#![allow(dead_code)]

use std::sync::Arc;

pub use ohip_agent::testing::{RecordingBackend, ScriptedLlm};

use ohip_agent::agent::Agent;
use ohip_agent::config::HistoryConfig;
use ohip_agent::tools::ToolRegistry;

pub fn agent(llm: Arc<ScriptedLlm>, backend: Arc<RecordingBackend>) -> Agent {
    Agent::new(
        llm,
        Arc::new(ToolRegistry::new(backend)),
        HistoryConfig::default(),
    )
}
