//! End-to-end dispatch scenarios with a scripted completion service.

mod common;

use serde_json::json;

use common::{agent, RecordingBackend, ScriptedLlm};
use ohip_agent::agent::{Outcome, CLARIFICATION_MESSAGE, MISSING_ARGUMENTS_RULE};
use ohip_agent::gateway::GatewayError;
use ohip_agent::tools::ToolCallResult;

const RESERVATION_DECISION: &str = r#"```json
{
    "action": "call_tools",
    "tools_to_call": [
        {"tool_name": "get_reservation", "parameters": {"hotel_id": "SYDH3", "reservation_id": "218290"}}
    ],
    "explanation": "Fetching reservation 218290 at SYDH3"
}
```"#;

const RESERVATION_SUMMARY: &str =
    "Jane Doe checks in on 12 March and leaves on 15 March. Deluxe King, 2 adults. Status: Reserved.";

#[tokio::test]
async fn complete_request_calls_reservation_tool_and_summarizes() {
    let llm = ScriptedLlm::replying(&[RESERVATION_DECISION, RESERVATION_SUMMARY]);
    let backend = RecordingBackend::ok(json!({
        "reservations": {
            "reservation": [{"reservationGuests": [{"profileInfo": {"givenName": "Jane"}}]}]
        }
    }));
    let agent = agent(llm.clone(), backend.clone());
    let mut history = agent.new_history();

    let reply = agent
        .handle(
            "Get reservation details for hotel SYDH3 and reservation 218290",
            &mut history,
        )
        .await;

    assert_eq!(backend.calls(), 1);
    let sent = &backend.requests()[0];
    assert_eq!(sent.path, "/rsv/v1/hotels/SYDH3/reservations/218290");
    assert!(sent
        .headers
        .contains(&("x-hotelid".to_string(), "SYDH3".to_string())));

    assert!(reply.contains("**AI Decision**: Fetching reservation 218290 at SYDH3"));
    assert!(reply.contains(RESERVATION_SUMMARY));
    assert!(!reply.contains("reservationGuests"));

    // the summary prompt carries the raw payload, the reply does not
    let prompts = llm.prompts();
    assert_eq!(prompts.len(), 2);
    assert!(prompts[1].contains("reservationGuests"));
    assert_eq!(history.len(), 2);
}

#[tokio::test]
async fn missing_hotel_id_asks_instead_of_calling() {
    let llm = ScriptedLlm::replying(&[r#"{
        "action": "respond_directly",
        "response": "I can look up reservation 218290. Which hotel ID is it for?"
    }"#]);
    let backend = RecordingBackend::ok(json!({}));
    let agent = agent(llm.clone(), backend.clone());

    let exchange = agent
        .respond("Get reservation details for 218290", &agent.new_history())
        .await;

    assert_eq!(exchange.outcome, Outcome::Direct);
    assert!(exchange.reply.contains("Which hotel ID"));
    assert_eq!(backend.calls(), 0);

    let prompt = &llm.prompts()[0];
    assert!(prompt.contains(MISSING_ARGUMENTS_RULE));
    assert!(prompt.contains("get_reservation(hotel_id*, reservation_id*, fetch_instructions)"));
}

#[tokio::test]
async fn follow_up_sees_previous_turns() {
    let llm = ScriptedLlm::replying(&[
        r#"{"action": "respond_directly", "response": "Which hotel ID is reservation 218290 at?"}"#,
        RESERVATION_DECISION,
        RESERVATION_SUMMARY,
    ]);
    let backend = RecordingBackend::ok(json!({"reservations": {}}));
    let agent = agent(llm.clone(), backend.clone());
    let mut history = agent.new_history();

    agent
        .handle("Get reservation details for 218290", &mut history)
        .await;
    let reply = agent.handle("It's SYDH3", &mut history).await;

    assert!(reply.contains(RESERVATION_SUMMARY));
    assert_eq!(backend.calls(), 1);
    let second = &llm.prompts()[1];
    assert!(second.contains("User: Get reservation details for 218290"));
    assert!(second.contains("Assistant: Which hotel ID is reservation 218290 at?"));
    assert_eq!(history.len(), 4);
}

#[tokio::test]
async fn failing_first_tool_does_not_block_second() {
    let llm = ScriptedLlm::replying(&[r#"{
        "action": "call_tools",
        "tools_to_call": [
            {"tool_name": "ohip_search_patient", "parameters": {"last_name": "Nobody"}},
            {"tool_name": "test_oauth_token", "parameters": {}}
        ],
        "explanation": "Search then check auth"
    }"#]);
    let backend = RecordingBackend::new(|_| {
        Err(GatewayError::Backend {
            status: 500,
            body: "search index offline".to_string(),
        })
    });
    let agent = agent(llm, backend.clone());

    let exchange = agent.respond("find Nobody", &agent.new_history()).await;

    let Outcome::Tools { reports } = &exchange.outcome else {
        panic!("expected tools outcome, got {:?}", exchange.outcome);
    };
    assert_eq!(reports.len(), 2);
    assert!(matches!(reports[0].result, ToolCallResult::Failure { .. }));
    assert!(reports[1].result.is_success());
    assert!(exchange
        .reply
        .contains("**ohip_search_patient**: Error - API error: 500 - search index offline"));
    assert!(exchange.reply.contains("**test_oauth_token**"));
    assert_eq!(backend.calls(), 2);
}

#[tokio::test]
async fn prose_decision_gets_clarification() {
    let llm = ScriptedLlm::replying(&["Sure, I'll check that reservation for you!"]);
    let backend = RecordingBackend::ok(json!({}));
    let agent = agent(llm, backend.clone());
    let mut history = agent.new_history();

    let reply = agent.handle("reservation please", &mut history).await;

    assert_eq!(reply, CLARIFICATION_MESSAGE);
    assert_eq!(backend.calls(), 0);
    assert_eq!(history.len(), 2);
}

#[tokio::test]
async fn unknown_tool_in_decision_is_reported_not_fatal() {
    let llm = ScriptedLlm::replying(&[r#"{
        "action": "call_tools",
        "tools_to_call": [{"tool_name": "cancel_reservation", "parameters": {"reservation_id": "1"}}]
    }"#]);
    let backend = RecordingBackend::ok(json!({}));
    let agent = agent(llm, backend.clone());

    let exchange = agent.respond("cancel 1", &agent.new_history()).await;

    assert_eq!(
        exchange.reply,
        "**cancel_reservation**: Error - Unknown tool: cancel_reservation"
    );
    assert_eq!(backend.calls(), 0);
}
