//! Chat submission endpoints: SSE streaming and synchronous.

use axum::{
    extract::{Json as JsonBody, State},
    response::{
        Json,
        sse::{Event, KeepAlive, Sse},
    },
};
use futures::stream::Stream;
use serde::Deserialize;
use serde_json::{Value, json};
use std::convert::Infallible;

use super::AppState;
use super::error::{ApiError, ApiResult};
use crate::chat::orchestrator::Persona;
use crate::chat::render::Display;

/// Chat submission from the client.
#[derive(Debug, Deserialize)]
pub struct ChatSubmitRequest {
    pub message: String,
    /// Omitted for a fresh chat.
    #[serde(default)]
    pub chat_id: Option<String>,
    /// Defaults to the analyst persona.
    #[serde(default)]
    pub persona: Option<Persona>,
}

fn fragment_event(id: &str, display: &Display) -> Event {
    let payload = json!({ "id": id, "display": display });
    Event::default().event("fragment").data(payload.to_string())
}

/// SSE stream of display fragments for one turn.
///
/// The first event carries the initial fragment; every overwrite of the
/// display slot follows as its own event, then `done` closes the turn.
pub async fn chat_stream_handler(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<ChatSubmitRequest>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError> {
    let persona = request.persona.unwrap_or(Persona::Analyst);
    let session = state.sessions.get_or_create(request.chat_id.as_deref()).await;
    let chat_id = session.state().chat_id();

    let handle = session
        .submit_user_message(&request.message, persona)
        .map_err(|e| ApiError::internal(e.to_string()))?;

    let id = handle.id;
    let mut display = handle.display;
    let task = handle.task;

    let stream = async_stream::stream! {
        yield Ok::<Event, Infallible>(Event::default().event("chat").data(chat_id));

        let fragment = display.borrow_and_update().clone();
        yield Ok(fragment_event(&id, &fragment));

        // The sender drops when the turn task ends, closing this loop.
        while display.changed().await.is_ok() {
            let fragment = display.borrow_and_update().clone();
            yield Ok(fragment_event(&id, &fragment));
        }

        match task.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                yield Ok(Event::default().event("error").data(e.to_string()));
            }
            Err(e) => {
                yield Ok(Event::default().event("error").data(e.to_string()));
            }
        }

        yield Ok(Event::default().event("done").data(""));
    };

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}

/// Synchronous submission: runs the turn to completion and returns the
/// final fragment.
pub async fn chat_sync_handler(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<ChatSubmitRequest>,
) -> ApiResult<Json<Value>> {
    let persona = request.persona.unwrap_or(Persona::Analyst);
    let session = state.sessions.get_or_create(request.chat_id.as_deref()).await;
    let chat_id = session.state().chat_id();

    let handle = session
        .submit_user_message(&request.message, persona)
        .map_err(|e| ApiError::internal(e.to_string()))?;

    let id = handle.id.clone();
    let display = handle
        .finish()
        .await
        .map_err(|e| ApiError::internal(format!("turn failed: {e}")))?;

    Ok(Json(json!({
        "id": id,
        "chat_id": chat_id,
        "display": display,
    })))
}
