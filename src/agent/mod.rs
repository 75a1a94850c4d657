//! Agent module - the conversational dispatch loop.
//!
//! Each utterance goes through one pass:
//! 1. Build a decision prompt from the tool catalog and recent history
//! 2. Ask the completion service whether to call tools or reply directly
//! 3. Run the chosen tools in order, isolating failures
//! 4. Summarize the results into a single reply

mod agent_loop;
mod decision;
mod history;
mod prompt;

pub use agent_loop::{Agent, Exchange, Outcome, ToolReport, CLARIFICATION_MESSAGE};
pub use decision::{parse_decision, strip_code_fences, Decision, DecisionEngine, DecisionError};
pub use history::{ConversationHistory, ConversationTurn, Role};
pub use prompt::{build_decision_prompt, build_summary_prompt, MISSING_ARGUMENTS_RULE};
