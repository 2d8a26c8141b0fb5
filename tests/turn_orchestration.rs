//! Turn orchestration against a scripted provider: text turns, tool
//! turns, history accumulation, and the state-log invariants.


use std::sync::Arc;

use test_helpers::{ScriptedProvider, RecordingStore, dead_search_client, session_with};
use vantage::chat::orchestrator::Persona;
use vantage::chat::projection::ui_state_from_ai_state;
use vantage::chat::render::{Display, PurchaseStatus};
use vantage::chat::types::{AiState, ContentPart, MessageContent, Role};

/// Every tool-result's call id must appear as a tool-call no later in
/// the log than the result itself.
fn assert_pairing_law(state: &AiState) {
    let mut seen_calls: Vec<&str> = Vec::new();
    for message in &state.messages {
        let MessageContent::Parts(parts) = &message.content else {
            continue;
        };
        for part in parts {
            match part {
                ContentPart::ToolCall { tool_call_id, .. } => {
                    seen_calls.push(tool_call_id);
                }
                ContentPart::ToolResult { tool_call_id, .. } => {
                    assert!(
                        seen_calls.contains(&tool_call_id.as_str()),
                        "tool-result {} has no preceding tool-call",
                        tool_call_id
                    );
                }
            }
        }
    }
}

#[tokio::test]
async fn text_turn_appends_assistant_message_and_persists() {
    let provider = ScriptedProvider::new(vec![ScriptedProvider::text_turn("Happy to help.")]);
    let store = Arc::new(RecordingStore::default());
    let session = session_with(
        provider.clone(),
        dead_search_client(),
        store.clone(),
        Some("user-1"),
    );

    let handle = session
        .submit_user_message("hello there", Persona::Trading)
        .unwrap();
    let display = handle.finish().await.unwrap();

    assert_eq!(
        display,
        Display::BotMessage {
            text: "Happy to help.".into()
        }
    );

    let state = session.state().get();
    assert_eq!(state.messages.len(), 2);
    assert_eq!(state.messages[0].role, Role::User);
    assert_eq!(state.messages[1].role, Role::Assistant);
    assert_eq!(
        state.messages[1].content.as_text(),
        Some("Happy to help.")
    );

    // Finalization persisted the chat with the first message as title
    assert_eq!(store.save_count(), 1);
    assert_eq!(store.saved.lock().unwrap()[0].title, "hello there");
}

#[tokio::test]
async fn text_deltas_accumulate_in_arrival_order() {
    use vantage::chat::provider::StreamEvent;

    let script = vec![
        StreamEvent::TextDelta("One".into()),
        StreamEvent::TextDelta(", two".into()),
        StreamEvent::TextDelta(", three.".into()),
        StreamEvent::Done,
    ];
    let provider = ScriptedProvider::new(vec![script]);
    let store = Arc::new(RecordingStore::default());
    let session = session_with(provider, dead_search_client(), store, Some("user-1"));

    let handle = session
        .submit_user_message("count", Persona::Trading)
        .unwrap();
    let display = handle.finish().await.unwrap();

    assert_eq!(
        display,
        Display::BotMessage {
            text: "One, two, three.".into()
        }
    );
}

#[tokio::test]
async fn list_stocks_turn_appends_pair_and_renders_card() {
    let args = r#"{"stocks":[{"symbol":"AAPL","price":187.5,"delta":1.2},{"symbol":"NVDA","price":950.0,"delta":-3.1}]}"#;
    let provider = ScriptedProvider::new(vec![ScriptedProvider::tool_turn("listStocks", args)]);
    let store = Arc::new(RecordingStore::default());
    let session = session_with(
        provider,
        dead_search_client(),
        store.clone(),
        Some("user-1"),
    );

    let handle = session
        .submit_user_message("what's trending?", Persona::Trading)
        .unwrap();
    let display = handle.finish().await.unwrap();

    let Display::Stocks { stocks } = display else {
        panic!("expected stocks card, got {:?}", display);
    };
    assert_eq!(stocks.len(), 2);
    assert_eq!(stocks[0].symbol, "AAPL");

    let state = session.state().get();
    // user + tool-call + tool-result
    assert_eq!(state.messages.len(), 3);
    assert_eq!(state.messages[1].role, Role::Assistant);
    assert_eq!(state.messages[2].role, Role::Tool);
    assert_pairing_law(&state);

    // The pair landed in one finalized snapshot
    assert_eq!(store.save_count(), 1);
}

#[tokio::test]
async fn projection_grows_by_one_per_non_system_append() {
    let args = r#"{"symbol":"AAPL","price":187.5,"delta":1.2}"#;
    let provider =
        ScriptedProvider::new(vec![ScriptedProvider::tool_turn("showStockPrice", args)]);
    let store = Arc::new(RecordingStore::default());
    let session = session_with(provider, dead_search_client(), store, Some("user-1"));

    let before = ui_state_from_ai_state(&session.state().get()).len();
    assert_eq!(before, 0);

    let handle = session
        .submit_user_message("price of AAPL?", Persona::Trading)
        .unwrap();
    handle.finish().await.unwrap();

    // user + tool-call + tool-result, all non-system
    let ui = ui_state_from_ai_state(&session.state().get());
    assert_eq!(ui.len(), 3);
    assert_eq!(
        ui[2].display,
        Some(Display::StockPrice {
            symbol: "AAPL".into(),
            price: 187.5,
            delta: 1.2,
        })
    );
}

#[tokio::test]
async fn purchase_within_bounds_requires_action() {
    for shares in ["1", "1000"] {
        let args = format!(
            r#"{{"symbol":"AAPL","price":187.5,"numberOfShares":{}}}"#,
            shares
        );
        let provider =
            ScriptedProvider::new(vec![ScriptedProvider::tool_turn("showStockPurchase", &args)]);
        let store = Arc::new(RecordingStore::default());
        let session = session_with(provider, dead_search_client(), store, Some("user-1"));

        let handle = session
            .submit_user_message("buy AAPL", Persona::Trading)
            .unwrap();
        let display = handle.finish().await.unwrap();

        let Display::StockPurchase { status, .. } = display else {
            panic!("expected purchase card for {} shares", shares);
        };
        assert_eq!(status, PurchaseStatus::RequiresAction);

        let state = session.state().get();
        let MessageContent::Parts(parts) = &state.messages[2].content else {
            panic!("expected tool-result parts");
        };
        let ContentPart::ToolResult { result, .. } = &parts[0] else {
            panic!("expected tool-result");
        };
        assert_eq!(result["status"], "requires_action");
        // No trailing system message on the happy path
        assert_eq!(state.messages.len(), 3);
    }
}

#[tokio::test]
async fn purchase_out_of_bounds_expires_with_invalid_amount() {
    for shares in ["0", "1001", "-5"] {
        let args = format!(
            r#"{{"symbol":"AAPL","price":187.5,"numberOfShares":{}}}"#,
            shares
        );
        let provider =
            ScriptedProvider::new(vec![ScriptedProvider::tool_turn("showStockPurchase", &args)]);
        let store = Arc::new(RecordingStore::default());
        let session = session_with(provider, dead_search_client(), store, Some("user-1"));

        let handle = session
            .submit_user_message("buy AAPL", Persona::Trading)
            .unwrap();
        let display = handle.finish().await.unwrap();

        assert_eq!(
            display,
            Display::BotMessage {
                text: "Invalid amount".into()
            },
            "shares = {}",
            shares
        );

        let state = session.state().get();
        // user + tool-call + tool-result + system note
        assert_eq!(state.messages.len(), 4);
        let MessageContent::Parts(parts) = &state.messages[2].content else {
            panic!("expected tool-result parts");
        };
        let ContentPart::ToolResult { result, .. } = &parts[0] else {
            panic!("expected tool-result");
        };
        assert_eq!(result["status"], "expired");

        assert_eq!(state.messages[3].role, Role::System);
        assert_eq!(
            state.messages[3].content.as_text(),
            Some("[User has selected an invalid amount]")
        );

        // The system note must not add a UI entry
        let ui = ui_state_from_ai_state(&state);
        assert_eq!(ui.len(), 3);
        assert_pairing_law(&state);
    }
}

#[tokio::test]
async fn purchase_defaults_to_one_hundred_shares() {
    let args = r#"{"symbol":"DOGE","price":0.2}"#;
    let provider =
        ScriptedProvider::new(vec![ScriptedProvider::tool_turn("showStockPurchase", args)]);
    let store = Arc::new(RecordingStore::default());
    let session = session_with(provider, dead_search_client(), store, Some("user-1"));

    let handle = session
        .submit_user_message("buy some DOGE", Persona::Trading)
        .unwrap();
    let display = handle.finish().await.unwrap();

    let Display::StockPurchase {
        number_of_shares, ..
    } = display
    else {
        panic!("expected purchase card");
    };
    assert_eq!(number_of_shares, 100.0);
}

#[tokio::test]
async fn get_events_turn_renders_events_card() {
    let args = r#"{"events":[{"date":"2024-05-01","headline":"Short squeeze","description":"Everyone piled in."}]}"#;
    let provider = ScriptedProvider::new(vec![ScriptedProvider::tool_turn("getEvents", args)]);
    let store = Arc::new(RecordingStore::default());
    let session = session_with(provider, dead_search_client(), store, Some("user-1"));

    let handle = session
        .submit_user_message("any events?", Persona::Trading)
        .unwrap();
    let display = handle.finish().await.unwrap();

    let Display::Events { events } = display else {
        panic!("expected events card");
    };
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].headline, "Short squeeze");
}

#[tokio::test]
async fn second_turn_carries_full_history() {
    let provider = ScriptedProvider::new(vec![
        ScriptedProvider::text_turn("First answer."),
        ScriptedProvider::text_turn("Second answer."),
    ]);
    let store = Arc::new(RecordingStore::default());
    let session = session_with(
        provider.clone(),
        dead_search_client(),
        store,
        Some("user-1"),
    );

    session
        .submit_user_message("first question", Persona::Trading)
        .unwrap()
        .finish()
        .await
        .unwrap();
    session
        .submit_user_message("second question", Persona::Trading)
        .unwrap()
        .finish()
        .await
        .unwrap();

    let requests = provider.requests.lock().unwrap();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].messages.len(), 1);

    // The second request sees the whole first turn plus the new message
    let contents: Vec<&str> = requests[1]
        .messages
        .iter()
        .map(|m| m.content.as_str())
        .collect();
    assert_eq!(
        contents,
        vec!["first question", "First answer.", "second question"]
    );
}

#[tokio::test]
async fn missing_model_fails_fast_without_touching_state() {
    use vantage::chat::orchestrator::ChatSession;
    use vantage::chat::state::StateHandle;
    use vantage::config::MissingModel;
    use vantage::chat::types::AiState;
    use test_helpers::StaticSession;

    let provider = ScriptedProvider::new(vec![]);
    let store = Arc::new(RecordingStore::default());
    let state = StateHandle::new(
        AiState::with_chat_id("chat-test"),
        store.clone(),
        Arc::new(StaticSession(Some("user-1".into()))),
    );
    let session = ChatSession::new(
        state,
        provider.clone(),
        dead_search_client(),
        None,
        test_helpers::fast_pacing(),
    );

    let err = session
        .submit_user_message("hello", Persona::Analyst)
        .unwrap_err();
    assert_eq!(err, MissingModel);

    // No turn started: nothing appended, no model call, nothing saved
    assert!(session.state().get().messages.is_empty());
    assert_eq!(session.state().version(), 0);
    assert_eq!(provider.request_count(), 0);
    assert_eq!(store.save_count(), 0);
}

#[tokio::test]
async fn unauthenticated_turn_never_persists() {
    let provider = ScriptedProvider::new(vec![ScriptedProvider::text_turn("ok")]);
    let store = Arc::new(RecordingStore::default());
    let session = session_with(provider, dead_search_client(), store.clone(), None);

    session
        .submit_user_message("hello", Persona::Trading)
        .unwrap()
        .finish()
        .await
        .unwrap();

    // The log advanced but nothing was saved
    assert_eq!(session.state().get().messages.len(), 2);
    assert_eq!(store.save_count(), 0);
}
