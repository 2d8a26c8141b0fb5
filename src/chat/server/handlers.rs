//! HTTP handlers for status and UI-state reads.

use axum::{
    extract::{Path, State},
    response::Json,
};
use serde_json::{Value, json};

use super::AppState;
use super::error::{ApiError, ApiResult};
use crate::chat::projection::{UiEntry, ui_state_from_ai_state};

/// Health check and status endpoint
pub async fn status_handler(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "model": state.sessions.model(),
    }))
}

/// UI state for one chat: the projection of its current message log.
///
/// Unauthenticated access silently yields no UI state rather than an
/// error; an unknown chat id is a 404.
pub async fn chat_ui_handler(
    State(state): State<AppState>,
    Path(chat_id): Path<String>,
) -> ApiResult<Json<Vec<UiEntry>>> {
    if state.auth.auth().await.is_none() {
        return Ok(Json(Vec::new()));
    }

    let Some(session) = state.sessions.get(&chat_id).await else {
        return Err(ApiError::not_found(format!("unknown chat: {chat_id}")));
    };

    Ok(Json(ui_state_from_ai_state(&session.state().get())))
}
