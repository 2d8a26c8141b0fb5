//! Search-and-summarize: the analyst persona's only tool.
//!
//! Two external calls back to back: the case-search API, then a second
//! streamed completion that narrates the results. A broken search API is
//! not fatal - the handler substitutes an empty result set and the turn
//! continues. The summary stream is consumed by a spawned task while a
//! fixed-interval loop publishes partial text with a climbing progress
//! value.

use anyhow::Result;
use serde_json::json;
use std::sync::Arc;
use std::sync::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::time::sleep;
use tracing::{debug, warn};

use super::{SearchArgs, ToolContext};
use crate::chat::prompts::ANALYST_SYSTEM_PROMPT;
use crate::chat::provider::{ChatRequest, MessageRole, ProviderMessage, StreamEvent};
use crate::chat::render::{Display, build_references};
use crate::search::SearchPayload;

/// First progress value shown for the summary stream.
const PROGRESS_START: u8 = 66;
const PROGRESS_STEP: u8 = 5;
/// Progress never passes this until the stream reports completion.
const PROGRESS_CAP: u8 = 95;

pub(super) async fn run(ctx: &ToolContext, args: SearchArgs) -> Result<()> {
    ctx.ui.send(Display::searching());

    // Partial functionality over total failure: a broken search API
    // degrades to an empty result set.
    let payload = match ctx.search.search(&args.query).await {
        Ok(payload) => payload,
        Err(e) => {
            warn!(query = %args.query, error = %e, "search API failed, continuing with empty results");
            SearchPayload::empty(&args.query)
        }
    };
    debug!(query = %args.query, results = payload.results.len(), "search completed");

    let references = build_references(&payload.results);

    ctx.ui.send(Display::summarizing());

    // Secondary completion over the serialized payload. A spawned task
    // accumulates deltas into the shared buffer; the loop below reads it.
    let summary = Arc::new(RwLock::new(String::new()));
    let summary_done = Arc::new(AtomicBool::new(false));

    let request = ChatRequest::new(ctx.model.clone(), ANALYST_SYSTEM_PROMPT).with_messages(vec![
        ProviderMessage {
            role: MessageRole::User,
            content: serde_json::to_string(&payload)?,
            name: None,
        },
    ]);

    {
        let provider = ctx.provider.clone();
        let summary = summary.clone();
        let done = summary_done.clone();
        tokio::spawn(async move {
            match provider.create_stream(request).await {
                Ok(mut rx) => {
                    while let Some(event) = rx.recv().await {
                        match event {
                            StreamEvent::TextDelta(delta) => {
                                if let Ok(mut text) = summary.write() {
                                    text.push_str(&delta);
                                }
                            }
                            StreamEvent::Error(e) => {
                                warn!(error = %e, "summary stream error");
                                break;
                            }
                            StreamEvent::Done => break,
                            _ => {}
                        }
                    }
                }
                Err(e) => warn!(error = %e, "failed to open summary stream"),
            }
            done.store(true, Ordering::SeqCst);
        });
    }

    // Publish partial summaries until the stream completes. The value is
    // monotonically non-decreasing and capped below 100 so the bar never
    // looks finished early.
    let mut progress = PROGRESS_START;
    while !summary_done.load(Ordering::SeqCst) {
        let text = summary.read().map(|t| t.clone()).unwrap_or_default();
        ctx.ui.send(Display::SearchProgress {
            summary: text,
            progress,
        });
        sleep(ctx.pacing.progress_interval).await;
        progress = (progress + PROGRESS_STEP).min(PROGRESS_CAP);
    }

    let summary_text = summary.read().map(|t| t.clone()).unwrap_or_default();

    ctx.finish_with_exchange(
        "search",
        json!({ "query": &args.query }),
        json!({ "summary": &summary_text, "references": &references }),
        None,
    )
    .await;

    ctx.ui.send(Display::SearchSummary {
        summary: summary_text,
        references,
    });
    Ok(())
}
