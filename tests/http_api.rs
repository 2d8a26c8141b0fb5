//! Router-level tests driven through tower's oneshot, no sockets.


use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use std::sync::Arc;
use tower::util::ServiceExt;

use test_helpers::{RecordingStore, ScriptedProvider, StaticSession, dead_search_client};
use vantage::chat::orchestrator::Sessions;
use vantage::chat::server::{AppState, create_router};
use vantage::persist::SessionProvider;

fn app(
    provider: Arc<ScriptedProvider>,
    auth_user: Option<&str>,
    model: Option<&str>,
) -> axum::Router {
    let store = Arc::new(RecordingStore::default());
    let auth: Arc<dyn SessionProvider> =
        Arc::new(StaticSession(auth_user.map(str::to_string)));
    let sessions = Arc::new(Sessions::new(
        provider,
        dead_search_client(),
        store,
        auth.clone(),
        model.map(str::to_string),
        test_helpers::fast_pacing(),
    ));
    create_router(AppState { sessions, auth })
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn status_reports_ok_and_model() {
    let app = app(ScriptedProvider::new(vec![]), None, Some("test-model"));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/status")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["model"], "test-model");
}

#[tokio::test]
async fn malformed_chat_body_is_client_error() {
    let app = app(ScriptedProvider::new(vec![]), None, Some("test-model"));

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/chat")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert!(response.status().is_client_error());
}

#[tokio::test]
async fn sync_chat_returns_final_fragment_and_chat_id() {
    let provider = ScriptedProvider::new(vec![ScriptedProvider::text_turn("All done.")]);
    let app = app(provider, Some("user-1"), Some("test-model"));

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/chat")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    r#"{"message": "hi", "persona": "trading"}"#,
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["display"]["type"], "bot_message");
    assert_eq!(json["display"]["text"], "All done.");
    assert!(json["chat_id"].is_string());
    assert!(json["id"].is_string());
}

#[tokio::test]
async fn chat_without_model_is_server_error() {
    let app = app(ScriptedProvider::new(vec![]), Some("user-1"), None);

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/chat")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"message": "hi"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = body_json(response).await;
    assert!(
        json["message"]
            .as_str()
            .unwrap()
            .contains("OPENAI_API_MODEL")
    );
}

#[tokio::test]
async fn unauthenticated_ui_state_is_empty() {
    let app = app(ScriptedProvider::new(vec![]), None, Some("test-model"));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/chats/whatever")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    // Silently no UI state, not an error
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, serde_json::json!([]));
}

#[tokio::test]
async fn authenticated_ui_state_projects_the_log() {
    let provider = ScriptedProvider::new(vec![ScriptedProvider::text_turn("Sure thing.")]);
    let app = app(provider, Some("user-1"), Some("test-model"));

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/chat")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"message": "hi", "persona": "trading"}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    let chat_id = body_json(response).await["chat_id"]
        .as_str()
        .unwrap()
        .to_string();

    let response = app
        .oneshot(
            Request::builder()
                .uri(format!("/api/chats/{}", chat_id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let ui = body_json(response).await;
    let entries = ui.as_array().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["display"]["type"], "user_message");
    assert_eq!(entries[1]["display"]["type"], "bot_message");
    assert_eq!(entries[0]["id"], format!("{}-0", chat_id));
}

#[tokio::test]
async fn unknown_chat_is_not_found_when_authenticated() {
    let app = app(ScriptedProvider::new(vec![]), Some("user-1"), Some("test-model"));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/chats/nope")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
