//! Tool dispatch: schema-validated invocations over a closed tool set.
//!
//! The model requests tools by name with JSON arguments; parsing
//! validates them into the `ToolInvocation` tagged union, and dispatch is
//! a total match over that union. Each handler emits interim display
//! fragments, appends the paired tool-call/tool-result log entries, and
//! finalizes the turn's state.

mod search;
mod stocks;

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;

use super::orchestrator::UiSender;
use super::provider::{Provider, ToolDefinition};
use super::render::{StockEvent, StockQuote};
use super::state::StateHandle;
use super::types::Message;
use crate::search::SearchClient;

#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("unknown tool: {0}")]
    Unknown(String),
    #[error("invalid arguments for {tool}: {source}")]
    InvalidArgs {
        tool: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SearchArgs {
    pub query: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ListStocksArgs {
    pub stocks: Vec<StockQuote>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StockPriceArgs {
    pub symbol: String,
    pub price: f64,
    pub delta: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StockPurchaseArgs {
    pub symbol: String,
    pub price: f64,
    #[serde(rename = "numberOfShares", default = "default_shares")]
    pub number_of_shares: f64,
}

/// Share count used when the user did not specify one.
fn default_shares() -> f64 {
    100.0
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GetEventsArgs {
    pub events: Vec<StockEvent>,
}

/// Validated tool invocation. Dispatch is a total match, not a lookup.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolInvocation {
    Search(SearchArgs),
    ListStocks(ListStocksArgs),
    ShowStockPrice(StockPriceArgs),
    ShowStockPurchase(StockPurchaseArgs),
    GetEvents(GetEventsArgs),
}

impl ToolInvocation {
    /// Validate raw model-supplied arguments against the tool's schema.
    pub fn parse(name: &str, args: Value) -> Result<Self, ToolError> {
        fn validated<T: DeserializeOwned>(tool: &'static str, value: Value) -> Result<T, ToolError> {
            serde_json::from_value(value).map_err(|source| ToolError::InvalidArgs { tool, source })
        }

        match name {
            "search" => Ok(Self::Search(validated("search", args)?)),
            "listStocks" => Ok(Self::ListStocks(validated("listStocks", args)?)),
            "showStockPrice" => Ok(Self::ShowStockPrice(validated("showStockPrice", args)?)),
            "showStockPurchase" => {
                Ok(Self::ShowStockPurchase(validated("showStockPurchase", args)?))
            }
            "getEvents" => Ok(Self::GetEvents(validated("getEvents", args)?)),
            other => Err(ToolError::Unknown(other.to_string())),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ToolInvocation::Search(_) => "search",
            ToolInvocation::ListStocks(_) => "listStocks",
            ToolInvocation::ShowStockPrice(_) => "showStockPrice",
            ToolInvocation::ShowStockPurchase(_) => "showStockPurchase",
            ToolInvocation::GetEvents(_) => "getEvents",
        }
    }
}

/// Handler-side delays; injected so tests can shrink them.
#[derive(Debug, Clone, Copy)]
pub struct Pacing {
    /// Simulated latency before a demo card resolves.
    pub card_delay: Duration,
    /// Interval between summary progress emissions.
    pub progress_interval: Duration,
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            card_delay: Duration::from_millis(1000),
            progress_interval: Duration::from_millis(1000),
        }
    }
}

/// Everything a handler needs for one invocation.
pub struct ToolContext {
    pub ui: UiSender,
    pub state: StateHandle,
    pub search: Arc<SearchClient>,
    pub provider: Arc<dyn Provider>,
    pub model: String,
    pub pacing: Pacing,
}

impl ToolContext {
    /// Run the invocation to completion. The handler owns the turn's
    /// visible output from here on.
    pub async fn execute(&self, invocation: ToolInvocation) -> anyhow::Result<()> {
        match invocation {
            ToolInvocation::Search(args) => search::run(self, args).await,
            ToolInvocation::ListStocks(args) => stocks::list_stocks(self, args).await,
            ToolInvocation::ShowStockPrice(args) => stocks::show_stock_price(self, args).await,
            ToolInvocation::ShowStockPurchase(args) => {
                stocks::show_stock_purchase(self, args).await
            }
            ToolInvocation::GetEvents(args) => stocks::get_events(self, args).await,
        }
    }

    /// Append the tool-call/tool-result pair (plus an optional trailing
    /// message) back-to-back within one `done`, finalizing the turn.
    pub(crate) async fn finish_with_exchange(
        &self,
        tool_name: &str,
        args: Value,
        result: Value,
        extra: Option<Message>,
    ) {
        let (call, result) = Message::tool_exchange(tool_name, args, result);
        let mut state = self.state.get();
        state.messages.push(call);
        state.messages.push(result);
        if let Some(extra) = extra {
            state.messages.push(extra);
        }
        self.state.done(state).await;
    }
}

/// Tool definitions for the business-analysis persona.
pub fn analyst_tools() -> Vec<ToolDefinition> {
    vec![ToolDefinition {
        name: "search".into(),
        description: "Search for business cases relevant to the user's query.".into(),
        parameters: json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "Search query for business cases"
                }
            },
            "required": ["query"]
        }),
    }]
}

/// Tool definitions for the demo stock-trading persona.
pub fn trading_tools() -> Vec<ToolDefinition> {
    vec![
        ToolDefinition {
            name: "listStocks".into(),
            description: "List three imaginary stocks that are trending.".into(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "stocks": {
                        "type": "array",
                        "items": {
                            "type": "object",
                            "properties": {
                                "symbol": {"type": "string", "description": "The symbol of the stock"},
                                "price": {"type": "number", "description": "The price of the stock"},
                                "delta": {"type": "number", "description": "The change in price of the stock"}
                            },
                            "required": ["symbol", "price", "delta"]
                        }
                    }
                },
                "required": ["stocks"]
            }),
        },
        ToolDefinition {
            name: "showStockPrice".into(),
            description: "Get the current stock price of a given stock or currency. Use this to show the price to the user.".into(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "symbol": {
                        "type": "string",
                        "description": "The name or symbol of the stock or currency. e.g. DOGE/AAPL/USD."
                    },
                    "price": {"type": "number", "description": "The price of the stock."},
                    "delta": {"type": "number", "description": "The change in price of the stock"}
                },
                "required": ["symbol", "price", "delta"]
            }),
        },
        ToolDefinition {
            name: "showStockPurchase".into(),
            description: "Show price and the UI to purchase a stock or currency. Use this if the user wants to purchase a stock or currency.".into(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "symbol": {
                        "type": "string",
                        "description": "The name or symbol of the stock or currency. e.g. DOGE/AAPL/USD."
                    },
                    "price": {"type": "number", "description": "The price of the stock."},
                    "numberOfShares": {
                        "type": "number",
                        "description": "The **number of shares** for a stock or currency to purchase. Can be optional if the user did not specify it."
                    }
                },
                "required": ["symbol", "price"]
            }),
        },
        ToolDefinition {
            name: "getEvents".into(),
            description: "List funny imaginary events between user highlighted dates that describe stock activity.".into(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "events": {
                        "type": "array",
                        "items": {
                            "type": "object",
                            "properties": {
                                "date": {"type": "string", "description": "The date of the event, in ISO-8601 format"},
                                "headline": {"type": "string", "description": "The headline of the event"},
                                "description": {"type": "string", "description": "The description of the event"}
                            },
                            "required": ["date", "headline", "description"]
                        }
                    }
                },
                "required": ["events"]
            }),
        },
    ]
}
