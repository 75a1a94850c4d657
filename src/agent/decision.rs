//! Decision engine: turns an utterance into a typed decision.
//!
//! Model output is untrusted. It must be exactly one of the two JSON shapes
//! described in the prompt; anything else is a [`DecisionError::Parse`].

use std::sync::Arc;

use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;

use super::history::ConversationTurn;
use super::prompt::build_decision_prompt;
use crate::llm::{LlmClient, LlmError};
use crate::tools::{arguments_from_json, ToolCallRequest, ToolDefinition};

#[derive(Debug, Clone, Error)]
pub enum DecisionError {
    #[error(transparent)]
    Completion(#[from] LlmError),

    #[error("could not parse decision: {0}")]
    Parse(String),
}

/// What to do with an utterance.
#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    CallTools {
        calls: Vec<ToolCallRequest>,
        rationale: String,
    },
    RespondDirectly {
        text: String,
    },
}

#[derive(Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
enum RawDecision {
    CallTools {
        tools_to_call: Vec<RawToolCall>,
        #[serde(default)]
        explanation: Option<String>,
    },
    RespondDirectly {
        response: String,
    },
}

#[derive(Deserialize)]
struct RawToolCall {
    tool_name: String,
    #[serde(default)]
    parameters: Option<Map<String, Value>>,
}

/// Remove a surrounding Markdown code fence (with or without a language tag).
pub fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // drop the info string (e.g. `json`) up to the first newline
    let body = match rest.find('\n') {
        Some(idx) => &rest[idx + 1..],
        None => rest.trim_start_matches(|c: char| c.is_ascii_alphabetic()),
    };
    body.trim_end()
        .strip_suffix("```")
        .unwrap_or(body)
        .trim()
}

/// Parse raw model text into a [`Decision`].
pub fn parse_decision(raw: &str) -> Result<Decision, DecisionError> {
    let cleaned = strip_code_fences(raw);
    let parsed: RawDecision =
        serde_json::from_str(cleaned).map_err(|e| DecisionError::Parse(e.to_string()))?;

    match parsed {
        RawDecision::RespondDirectly { response } => {
            Ok(Decision::RespondDirectly { text: response })
        }
        RawDecision::CallTools {
            tools_to_call,
            explanation,
        } => {
            if tools_to_call.is_empty() {
                return Err(DecisionError::Parse(
                    "call_tools without any tools".to_string(),
                ));
            }
            let calls = tools_to_call
                .into_iter()
                .map(|call| -> Result<ToolCallRequest, DecisionError> {
                    let arguments = match call.parameters {
                        Some(object) => arguments_from_json(&object).map_err(|e| {
                            DecisionError::Parse(format!("{}: {}", call.tool_name, e))
                        })?,
                        None => Default::default(),
                    };
                    Ok(ToolCallRequest {
                        tool_name: call.tool_name,
                        arguments,
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Decision::CallTools {
                calls,
                rationale: explanation.unwrap_or_default(),
            })
        }
    }
}

/// Wraps the completion service with prompt construction and parsing.
pub struct DecisionEngine {
    llm: Arc<dyn LlmClient>,
    turn_chars: usize,
}

impl DecisionEngine {
    pub fn new(llm: Arc<dyn LlmClient>, turn_chars: usize) -> Self {
        Self { llm, turn_chars }
    }

    pub async fn decide(
        &self,
        utterance: &str,
        tools: &[ToolDefinition],
        recent: &[ConversationTurn],
    ) -> Result<Decision, DecisionError> {
        let prompt = build_decision_prompt(utterance, tools, recent, self.turn_chars);
        tracing::debug!(
            "Decision prompt: {} chars, {} context turn(s)",
            prompt.len(),
            recent.len()
        );
        let raw = self.llm.generate(&prompt).await?;
        tracing::info!("Model decision: {}", raw);
        parse_decision(&raw)
    }
}
