//! Prompt templates for the decision and formatting steps.

use super::history::ConversationTurn;
use crate::tools::ToolDefinition;

/// Instruction that keeps the model from calling tools with partial arguments.
pub const MISSING_ARGUMENTS_RULE: &str = "IMPORTANT: If the user asks for an operation but does not provide every required parameter (marked with *), and the missing values cannot be recovered from the conversation context, respond with \"respond_directly\" and ask for the missing information instead of calling the tool with incomplete parameters.";

/// Render the tool catalog: one line per tool with its signature.
pub fn format_tool_catalog(tools: &[ToolDefinition]) -> String {
    if tools.is_empty() {
        return "No tools available".to_string();
    }
    tools
        .iter()
        .map(|t| format!("- {}: {}", t.signature(), t.description))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Render recent turns, each cut to `turn_chars` characters.
pub fn format_history(turns: &[ConversationTurn], turn_chars: usize) -> String {
    turns
        .iter()
        .map(|t| format!("{}: {}", t.role.label(), truncate_chars(&t.content, turn_chars)))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Build the prompt asking the model to choose between calling tools and
/// replying directly.
pub fn build_decision_prompt(
    utterance: &str,
    tools: &[ToolDefinition],
    recent: &[ConversationTurn],
    turn_chars: usize,
) -> String {
    let tool_catalog = format_tool_catalog(tools);
    let context = if recent.is_empty() {
        String::new()
    } else {
        format!(
            "\n\nRecent conversation context:\n{}",
            format_history(recent, turn_chars)
        )
    };

    format!(
        r#"You are an intelligent hotel operations agent that fulfils requests by calling backend tools.

Available tools (parameters marked with * are required):
{tool_catalog}

Your job is to:
1. Understand what the user wants to do (considering conversation context)
2. Decide which tools to call (if any)
3. Call the tools in the right order

User Request: "{utterance}"{context}

CONTEXT AWARENESS:
- If the user refers to "it", "that", "the reservation", etc., check the conversation context for what they are referring to
- If they provide missing information (like a hotel ID after you asked for it), combine it with the previous request
- Remember what you have already told them to avoid repetition

If you need to call tools, respond with a JSON object in this format:
{{
    "action": "call_tools",
    "tools_to_call": [
        {{
            "tool_name": "tool_name",
            "parameters": {{"param1": "value1", "param2": "value2"}}
        }}
    ],
    "explanation": "Why you're calling these tools"
}}

If you don't need to call any tools, respond with:
{{
    "action": "respond_directly",
    "response": "Your direct response to the user"
}}

Be intelligent about tool selection:
- For "test oauth" or "check connection" use test_oauth_token or test_api_connection
- For "get reservation" or "reservation details" use get_reservation (needs hotel_id and reservation_id)
- For general questions respond_directly

{rule}

Respond with the JSON object only."#,
        tool_catalog = tool_catalog,
        utterance = utterance,
        context = context,
        rule = MISSING_ARGUMENTS_RULE,
    )
}

/// Build the prompt that rewrites a raw payload into prose.
pub fn build_summary_prompt(brief: &str, raw_payload: &str) -> String {
    format!(
        r#"{brief}

API Response:
{raw_payload}

Format your response as a natural, friendly summary. Don't include technical JSON details - just the human-readable information that matters."#,
        brief = brief,
        raw_payload = raw_payload
    )
}

/// Cut to at most `max_chars` characters on a char boundary.
pub fn truncate_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::{ParamKind, ParamSpec};

    fn catalog() -> Vec<ToolDefinition> {
        vec![ToolDefinition {
            name: "get_reservation".to_string(),
            description: "Get hotel reservation details".to_string(),
            params: vec![
                ParamSpec::required("hotel_id", ParamKind::String, "Hotel ID"),
                ParamSpec::required("reservation_id", ParamKind::String, "Reservation ID"),
            ],
            summary_brief: None,
        }]
    }

    #[test]
    fn decision_prompt_contains_catalog_utterance_and_rule() {
        let prompt = build_decision_prompt("Get reservation 1", &catalog(), &[], 200);
        assert!(prompt.contains("- get_reservation(hotel_id*, reservation_id*): Get hotel reservation details"));
        assert!(prompt.contains("User Request: \"Get reservation 1\""));
        assert!(prompt.contains(MISSING_ARGUMENTS_RULE));
        assert!(!prompt.contains("Recent conversation context"));
    }

    #[test]
    fn history_turns_are_truncated() {
        let long = "x".repeat(500);
        let turns = vec![
            ConversationTurn::user(long.clone()),
            ConversationTurn::assistant("Which hotel?"),
        ];
        let prompt = build_decision_prompt("SYDH3", &catalog(), &turns, 200);
        assert!(prompt.contains(&format!("User: {}\n", "x".repeat(200))));
        assert!(!prompt.contains(&"x".repeat(201)));
        assert!(prompt.contains("Assistant: Which hotel?"));
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("abc", 10), "abc");
    }

    #[test]
    fn empty_catalog_is_explicit() {
        assert_eq!(format_tool_catalog(&[]), "No tools available");
    }
}
