//! Render components: structured records to display fragments.
//!
//! Pure formatting only. The display tree is serialized to the client,
//! which owns the actual visuals; nothing here performs I/O.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::search::SearchResult;

/// One tradable quote shown in stock cards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockQuote {
    pub symbol: String,
    pub price: f64,
    pub delta: f64,
}

/// One imaginary market event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockEvent {
    /// ISO-8601 date of the event
    pub date: String,
    pub headline: String,
    pub description: String,
}

/// Lifecycle of a purchase widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PurchaseStatus {
    RequiresAction,
    Expired,
}

/// A numbered search reference shown under the summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reference {
    pub index: usize,
    pub title: String,
    pub url: String,
    pub summary: String,
    pub favicon: String,
}

/// Serializable renderable sent to the client, one per UI slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Display {
    /// Initial placeholder while the turn spins up.
    Spinner,
    UserMessage {
        text: String,
    },
    BotMessage {
        text: String,
    },
    Stocks {
        stocks: Vec<StockQuote>,
    },
    StocksSkeleton,
    StockPrice {
        symbol: String,
        price: f64,
        delta: f64,
    },
    StockSkeleton,
    StockPurchase {
        symbol: String,
        price: f64,
        number_of_shares: f64,
        status: PurchaseStatus,
    },
    Events {
        events: Vec<StockEvent>,
    },
    EventsSkeleton,
    /// Placeholder card shown while a search stage runs.
    SearchPending {
        headline: String,
        caption: String,
    },
    /// Summary-in-progress: partial text plus a percentage.
    SearchProgress {
        summary: String,
        progress: u8,
    },
    SearchSummary {
        summary: String,
        references: Vec<Reference>,
    },
    /// Several fragments rendered in order within one slot.
    Stack {
        items: Vec<Display>,
    },
}

impl Display {
    /// Placeholder while the search API call is in flight.
    pub fn searching() -> Self {
        Display::SearchPending {
            headline: "Exploring the ocean of opportunities...".to_string(),
            caption: "Every search is an expedition - surfacing the hidden gems for you".to_string(),
        }
    }

    /// Placeholder while the summary stream spins up.
    pub fn summarizing() -> Self {
        Display::SearchPending {
            headline: "Distilling the business insight...".to_string(),
            caption: "Trimming the noise down to the sharpest takeaways".to_string(),
        }
    }
}

/// Favicon for a reference, derived from the result URL's host.
pub fn favicon_url(result_url: &str) -> String {
    let host = Url::parse(result_url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
        .unwrap_or_default();
    format!("https://www.google.com/s2/favicons?domain={}", host)
}

/// Number search results 1-based and attach favicons.
pub fn build_references(results: &[SearchResult]) -> Vec<Reference> {
    results
        .iter()
        .enumerate()
        .map(|(i, result)| Reference {
            index: i + 1,
            title: result.title.clone(),
            url: result.url.clone(),
            summary: result.summary.clone(),
            favicon: favicon_url(&result.url),
        })
        .collect()
}
