//! UI state projection: derive the renderable list from the durable log.
//!
//! Pure and idempotent - re-running on the same state always yields the
//! same UI state. Never persisted; recomputed on each read.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::render::{Display, PurchaseStatus, Reference, StockEvent, StockQuote};
use super::types::{AiState, ContentPart, Message, MessageContent, Role};

/// One renderable slot derived from a log entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UiEntry {
    pub id: String,
    /// `None` when the entry projects to nothing (unknown tool, odd shape).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display: Option<Display>,
}

/// Project conversation state to UI state: one entry per non-system
/// message, ids derived from the chat id and position.
pub fn ui_state_from_ai_state(state: &AiState) -> Vec<UiEntry> {
    state
        .messages
        .iter()
        .filter(|message| message.role != Role::System)
        .enumerate()
        .map(|(index, message)| UiEntry {
            id: format!("{}-{}", state.chat_id, index),
            display: project_message(message),
        })
        .collect()
}

fn project_message(message: &Message) -> Option<Display> {
    match (message.role, &message.content) {
        (Role::User, MessageContent::Text(text)) => Some(Display::UserMessage { text: text.clone() }),
        (Role::Assistant, MessageContent::Text(text)) => {
            Some(Display::BotMessage { text: text.clone() })
        }
        (Role::Tool, MessageContent::Parts(parts)) => {
            let mut cards: Vec<Display> = parts.iter().filter_map(project_part).collect();
            match cards.len() {
                0 => None,
                1 => cards.pop(),
                _ => Some(Display::Stack { items: cards }),
            }
        }
        _ => None,
    }
}

/// Map one tool-result to its card. Unrecognized tool names project to
/// nothing, as do results that fail to decode.
fn project_part(part: &ContentPart) -> Option<Display> {
    let ContentPart::ToolResult {
        tool_name, result, ..
    } = part
    else {
        return None;
    };

    match tool_name.as_str() {
        "listStocks" => {
            let stocks: Vec<StockQuote> = decode(result)?;
            Some(Display::Stocks { stocks })
        }
        "showStockPrice" => {
            let quote: StockQuote = decode(result)?;
            Some(Display::StockPrice {
                symbol: quote.symbol,
                price: quote.price,
                delta: quote.delta,
            })
        }
        "showStockPurchase" => {
            let purchase: PurchaseResult = decode(result)?;
            Some(Display::StockPurchase {
                symbol: purchase.symbol,
                price: purchase.price,
                number_of_shares: purchase.number_of_shares,
                status: purchase.status,
            })
        }
        "getEvents" => {
            let events: Vec<StockEvent> = decode(result)?;
            Some(Display::Events { events })
        }
        "search" => {
            let search: SearchResultEntry = decode(result)?;
            Some(Display::SearchSummary {
                summary: search.summary,
                references: search.references,
            })
        }
        _ => None,
    }
}

fn decode<T: serde::de::DeserializeOwned>(value: &Value) -> Option<T> {
    serde_json::from_value(value.clone()).ok()
}

#[derive(Debug, Deserialize)]
struct PurchaseResult {
    symbol: String,
    price: f64,
    #[serde(rename = "numberOfShares")]
    number_of_shares: f64,
    #[serde(default = "default_purchase_status")]
    status: PurchaseStatus,
}

fn default_purchase_status() -> PurchaseStatus {
    PurchaseStatus::RequiresAction
}

#[derive(Debug, Deserialize)]
struct SearchResultEntry {
    summary: String,
    references: Vec<Reference>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::types::new_id;
    use serde_json::json;

    fn state_with(messages: Vec<Message>) -> AiState {
        AiState {
            chat_id: "chat-1".into(),
            messages,
        }
    }

    #[test]
    fn test_one_entry_per_non_system_message() {
        let mut state = state_with(vec![Message::user("hi")]);
        let before = ui_state_from_ai_state(&state).len();

        state.messages.push(Message::assistant_text("hello"));
        assert_eq!(ui_state_from_ai_state(&state).len(), before + 1);

        state.messages.push(Message::system("[internal note]"));
        assert_eq!(ui_state_from_ai_state(&state).len(), before + 1);
    }

    #[test]
    fn test_entry_ids_follow_position() {
        let state = state_with(vec![
            Message::user("hi"),
            Message::system("skipped"),
            Message::assistant_text("hello"),
        ]);

        let ui = ui_state_from_ai_state(&state);
        assert_eq!(ui[0].id, "chat-1-0");
        assert_eq!(ui[1].id, "chat-1-1");
    }

    #[test]
    fn test_tool_results_project_to_cards() {
        let (call, result) = Message::tool_exchange(
            "showStockPrice",
            json!({"symbol": "AAPL", "price": 187.5, "delta": 1.2}),
            json!({"symbol": "AAPL", "price": 187.5, "delta": 1.2}),
        );
        let state = state_with(vec![Message::user("price of AAPL?"), call, result]);

        let ui = ui_state_from_ai_state(&state);
        assert_eq!(ui.len(), 3);
        // The tool-call message itself renders nothing
        assert_eq!(ui[1].display, None);
        assert_eq!(
            ui[2].display,
            Some(Display::StockPrice {
                symbol: "AAPL".into(),
                price: 187.5,
                delta: 1.2,
            })
        );
    }

    #[test]
    fn test_unknown_tool_projects_to_nothing() {
        let result = Message {
            id: new_id(),
            role: Role::Tool,
            content: MessageContent::Parts(vec![ContentPart::ToolResult {
                tool_name: "mystery".into(),
                tool_call_id: new_id(),
                result: json!({"anything": true}),
            }]),
            name: None,
        };
        let state = state_with(vec![result]);

        let ui = ui_state_from_ai_state(&state);
        assert_eq!(ui.len(), 1);
        assert_eq!(ui[0].display, None);
    }

    #[test]
    fn test_purchase_result_without_status_defaults() {
        let (_, result) = Message::tool_exchange(
            "showStockPurchase",
            json!({}),
            json!({"symbol": "DOGE", "price": 0.2, "numberOfShares": 10}),
        );
        let state = state_with(vec![result]);

        let ui = ui_state_from_ai_state(&state);
        assert_eq!(
            ui[0].display,
            Some(Display::StockPurchase {
                symbol: "DOGE".into(),
                price: 0.2,
                number_of_shares: 10.0,
                status: PurchaseStatus::RequiresAction,
            })
        );
    }

    #[test]
    fn test_projection_is_idempotent() {
        let (call, result) = Message::tool_exchange(
            "getEvents",
            json!({"events": []}),
            json!([{"date": "2024-05-01", "headline": "H", "description": "D"}]),
        );
        let state = state_with(vec![Message::user("events?"), call, result]);

        let first = ui_state_from_ai_state(&state);
        let second = ui_state_from_ai_state(&state);
        assert_eq!(first, second);
    }
}
