//! HTTP server over the orchestrator:
//! - GET  /api/status          - health check
//! - POST /api/chat/stream     - SSE streaming chat
//! - POST /api/chat            - synchronous chat (final fragment)
//! - GET  /api/chats/{chat_id} - UI-state projection (auth-gated)

pub mod error;
mod handlers;
mod stream;

use anyhow::Result;
use axum::{
    Router,
    http::{Method, header},
    routing::{get, post},
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

pub use error::{ApiError, ApiResult};

use crate::chat::orchestrator::Sessions;
use crate::chat::provider::OpenAiProvider;
use crate::chat::tools::Pacing;
use crate::config::VantageConfig;
use crate::persist::{EnvSessionProvider, MemoryChatStore, SessionProvider};
use crate::search::SearchClient;

// ============================================================================
// Server State
// ============================================================================

#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<Sessions>,
    pub auth: Arc<dyn SessionProvider>,
}

// ============================================================================
// Routes
// ============================================================================

/// Create the router with all endpoints
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    Router::new()
        .route("/api/status", get(handlers::status_handler))
        .route("/api/chat", post(stream::chat_sync_handler))
        .route("/api/chat/stream", post(stream::chat_stream_handler))
        .route("/api/chats/{chat_id}", get(handlers::chat_ui_handler))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Run the HTTP server with collaborators built from configuration.
pub async fn run(config: &VantageConfig, host: &str, port: u16) -> Result<()> {
    let provider = Arc::new(OpenAiProvider::new(
        &config.openai_api_base,
        config.openai_api_key.clone(),
    ));
    let search = Arc::new(SearchClient::new(
        &config.search_api_url,
        Duration::from_secs(config.search_timeout),
    ));
    let store = Arc::new(MemoryChatStore::new());
    let auth: Arc<dyn SessionProvider> =
        Arc::new(EnvSessionProvider::new(config.session_user.clone()));

    if config.openai_api_model.is_none() {
        warn!("OPENAI_API_MODEL is not set; chat submissions will fail fast");
    }

    let pacing = Pacing {
        card_delay: Duration::from_millis(config.tool_card_delay_ms),
        progress_interval: Duration::from_millis(config.search_progress_interval_ms),
    };

    let sessions = Arc::new(Sessions::new(
        provider,
        search,
        store,
        auth.clone(),
        config.openai_api_model.clone(),
        pacing,
    ));

    let app = create_router(AppState { sessions, auth });

    let bind_address = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    info!("Server listening on http://{}", bind_address);

    axum::serve(listener, app).await?;

    Ok(())
}
