//! Dispatch loop: one utterance in, exactly one reply out.

use std::sync::Arc;

use serde::Serialize;

use super::decision::{Decision, DecisionEngine, DecisionError};
use super::history::ConversationHistory;
use super::prompt::{build_summary_prompt, truncate_chars};
use crate::config::HistoryConfig;
use crate::llm::LlmClient;
use crate::tools::{ToolCallRequest, ToolCallResult, ToolDefinition, ToolRegistry};

/// Reply used when the model output is not a valid decision.
pub const CLARIFICATION_MESSAGE: &str =
    "I had trouble understanding how to help you. Could you please rephrase your request?";

/// Characters of raw payload kept when summarizing fails.
const FALLBACK_CHARS: usize = 500;

/// Characters of pretty JSON kept for tools without a summary brief.
const RAW_RENDER_CHARS: usize = 2000;

/// Result of running one tool, as reported back to the caller.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolReport {
    pub tool_name: String,
    pub result: ToolCallResult,
    /// Text contributed to the reply for this tool.
    pub rendered: String,
}

/// How the exchange was resolved.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Outcome {
    Direct,
    Tools { reports: Vec<ToolReport> },
    Unparsed,
    Failed,
}

/// A finished exchange.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Exchange {
    pub reply: String,
    pub outcome: Outcome,
}

enum Stage {
    Start,
    DecisionRequested,
    DecisionParsed(Decision),
    DecisionParseFailed,
    ToolsExecuting {
        calls: Vec<ToolCallRequest>,
        rationale: String,
    },
    DirectReply(String),
    ResultsFormatted {
        rationale: String,
        reports: Vec<ToolReport>,
    },
    Done(Exchange),
}

/// The orchestrator tying the decision engine to the tool registry.
pub struct Agent {
    engine: DecisionEngine,
    llm: Arc<dyn LlmClient>,
    tools: Arc<ToolRegistry>,
    catalog: Vec<ToolDefinition>,
    history: HistoryConfig,
}

impl Agent {
    pub fn new(llm: Arc<dyn LlmClient>, tools: Arc<ToolRegistry>, history: HistoryConfig) -> Self {
        let catalog = tools.list();
        tracing::info!("Agent initialized with {} tools", catalog.len());
        for tool in &catalog {
            tracing::debug!("  - {}: {}", tool.name, tool.description);
        }
        Self {
            engine: DecisionEngine::new(llm.clone(), history.turn_chars),
            llm,
            tools,
            catalog,
            history,
        }
    }

    pub fn tools(&self) -> &Arc<ToolRegistry> {
        &self.tools
    }

    pub fn history_config(&self) -> HistoryConfig {
        self.history
    }

    /// A fresh, empty session history with the configured bound.
    pub fn new_history(&self) -> ConversationHistory {
        ConversationHistory::new(self.history.max_turns)
    }

    /// Greeting listing the available tools.
    pub fn welcome_message(&self) -> String {
        let tools = self
            .catalog
            .iter()
            .map(|t| format!("- **{}** - {}", t.name, t.description))
            .collect::<Vec<_>>()
            .join("\n");
        format!(
            "Welcome to the hotel operations assistant!\n\nAvailable tools:\n{}\n\nTry asking:\n- \"Test the OAuth connection\"\n- \"Get reservation details for hotel SYDH3 and reservation 218290\"\n\nHow can I help you today?",
            tools
        )
    }

    /// Answer `utterance` and record the exchange in `history`.
    pub async fn handle(&self, utterance: &str, history: &mut ConversationHistory) -> String {
        let exchange = self.respond(utterance, history).await;
        history.record_exchange(utterance, &exchange.reply);
        tracing::info!("Conversation history: {} turn(s)", history.len());
        exchange.reply
    }

    /// Run the dispatch state machine. Never fails: every error ends as text.
    pub async fn respond(&self, utterance: &str, history: &ConversationHistory) -> Exchange {
        let mut stage = Stage::Start;
        loop {
            stage = match stage {
                Stage::Start => {
                    tracing::info!("Processing request: {}", utterance);
                    Stage::DecisionRequested
                }
                Stage::DecisionRequested => {
                    let recent = history.recent(self.history.context_turns);
                    match self.engine.decide(utterance, &self.catalog, &recent).await {
                        Ok(decision) => Stage::DecisionParsed(decision),
                        Err(DecisionError::Parse(e)) => {
                            tracing::error!("Failed to parse model decision: {}", e);
                            Stage::DecisionParseFailed
                        }
                        Err(DecisionError::Completion(e)) => {
                            tracing::error!("Completion service failed: {}", e);
                            Stage::Done(Exchange {
                                reply: format!(
                                    "I encountered an error while processing your request: {}",
                                    e
                                ),
                                outcome: Outcome::Failed,
                            })
                        }
                    }
                }
                Stage::DecisionParsed(Decision::CallTools { calls, rationale }) => {
                    Stage::ToolsExecuting { calls, rationale }
                }
                Stage::DecisionParsed(Decision::RespondDirectly { text }) => Stage::DirectReply(text),
                Stage::DecisionParseFailed => Stage::Done(Exchange {
                    reply: CLARIFICATION_MESSAGE.to_string(),
                    outcome: Outcome::Unparsed,
                }),
                Stage::DirectReply(text) => Stage::Done(Exchange {
                    reply: text,
                    outcome: Outcome::Direct,
                }),
                Stage::ToolsExecuting { calls, rationale } => {
                    let mut reports = Vec::with_capacity(calls.len());
                    // in order, one at a time: later calls may depend on earlier side effects
                    for call in &calls {
                        let result = self.tools.invoke(call).await;
                        let rendered = self.render(call, &result).await;
                        reports.push(ToolReport {
                            tool_name: call.tool_name.clone(),
                            result,
                            rendered,
                        });
                    }
                    Stage::ResultsFormatted { rationale, reports }
                }
                Stage::ResultsFormatted { rationale, reports } => {
                    let mut parts = Vec::with_capacity(reports.len() + 1);
                    if !rationale.trim().is_empty() {
                        parts.push(format!("**AI Decision**: {}", rationale.trim()));
                    }
                    parts.extend(reports.iter().map(|r| r.rendered.clone()));
                    Stage::Done(Exchange {
                        reply: parts.join("\n\n"),
                        outcome: Outcome::Tools { reports },
                    })
                }
                Stage::Done(exchange) => return exchange,
            };
        }
    }

    /// Text for one tool's contribution to the reply.
    async fn render(&self, call: &ToolCallRequest, result: &ToolCallResult) -> String {
        let name = &call.tool_name;
        match result {
            ToolCallResult::Failure { message } => format!("**{}**: Error - {}", name, message),
            ToolCallResult::Success { payload } => {
                let raw = serde_json::to_string_pretty(payload).unwrap_or_else(|_| payload.to_string());
                let brief = self
                    .catalog
                    .iter()
                    .find(|d| &d.name == name)
                    .and_then(|d| d.summary_brief.as_deref());
                match brief {
                    Some(brief) => {
                        let summary = self.summarize(brief, &raw).await;
                        format!("**{}**:\n\n{}", name, summary)
                    }
                    None => format!(
                        "**{}**:\n```json\n{}\n```",
                        name,
                        clip(&raw, RAW_RENDER_CHARS)
                    ),
                }
            }
        }
    }

    async fn summarize(&self, brief: &str, raw: &str) -> String {
        match self.llm.generate(&build_summary_prompt(brief, raw)).await {
            Ok(text) => text,
            Err(e) => {
                tracing::error!("Error formatting tool response: {}", e);
                format!(
                    "Here's the raw data (formatting error occurred):\n\n{}",
                    clip(raw, FALLBACK_CHARS)
                )
            }
        }
    }
}

fn clip(s: &str, max_chars: usize) -> String {
    let cut = truncate_chars(s, max_chars);
    if cut.len() < s.len() {
        format!("{}...", cut)
    } else {
        cut.to_string()
    }
}
