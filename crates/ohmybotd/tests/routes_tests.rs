//! HTTP surface tests, driven through the router with `oneshot`.

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use ohmybot_shared::clock::SystemClock;
use ohmybot_shared::rpc::{HealthResponse, MessageReplies, OutboxResponse};
use ohmybot_shared::{BotResult, InMemoryFeedbackStore};
use ohmybotd::config::Config;
use ohmybotd::connector::Outbox;
use ohmybotd::recognizer::RegexRecognizer;
use ohmybotd::server::router;
use ohmybotd::state::{AppState, Parts};
use ohmybotd::translator::TextTransform;
use serde::de::DeserializeOwned;
use tower::ServiceExt;

struct EchoTranslator;

#[async_trait]
impl TextTransform for EchoTranslator {
    async fn translate(&self, text: &str, _from: &str, _to: &str) -> BotResult<String> {
        Ok(text.to_string())
    }
}

fn app_state(with_outbox: bool) -> Arc<AppState> {
    let outbox = Arc::new(Outbox::new());
    Arc::new(AppState::with_parts(
        Config::default(),
        Parts {
            store: Box::new(InMemoryFeedbackStore::new()),
            transport: outbox.clone(),
            outbox: with_outbox.then_some(outbox),
            recognizer: Arc::new(RegexRecognizer),
            transform: Arc::new(EchoTranslator),
            clock: Arc::new(SystemClock),
        },
    ))
}

async fn body_json<T: DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn post_activity(json: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/messages")
        .header("content-type", "application/json")
        .body(Body::from(json.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_post_message_returns_reply() {
    let app = router(app_state(true));
    let response = app
        .oneshot(post_activity(
            r#"{"type":"message","text":"Great day #worklife","from":{"id":"u1"},"conversation":{"id":"c1"},"channelId":"console","serviceUrl":""}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: MessageReplies = body_json(response).await;
    assert_eq!(body.replies, vec!["Thanks bud!"]);
}

#[tokio::test]
async fn test_non_message_activity_is_ignored() {
    let state = app_state(true);
    let app = router(state.clone());
    let response = app
        .oneshot(post_activity(
            r##"{"type":"conversationUpdate","text":"#x","from":{"id":"u1"},"conversation":{"id":"c1"}}"##,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: MessageReplies = body_json(response).await;
    assert!(body.replies.is_empty());
    assert_eq!(state.store.read().await.len(), 0);
}

#[tokio::test]
async fn test_malformed_activity_is_rejected() {
    let app = router(app_state(true));
    let response = app.oneshot(post_activity("{not json")).await.unwrap();
    assert!(response.status().is_client_error());
}

#[tokio::test]
async fn test_outbox_route() {
    let state = app_state(true);
    let outbox = state.outbox.clone().unwrap();
    {
        use ohmybotd::connector::Transport;
        outbox
            .send_text(&ohmybot_shared::Address::console("alice"), "ping")
            .await
            .unwrap();
    }

    let response = router(state)
        .oneshot(
            Request::builder()
                .uri("/api/outbox/alice")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: OutboxResponse = body_json(response).await;
    assert_eq!(body.user_id, "alice");
    assert_eq!(body.messages, vec!["ping"]);
}

#[tokio::test]
async fn test_outbox_route_without_console_transport() {
    let response = router(app_state(false))
        .oneshot(
            Request::builder()
                .uri("/api/outbox/alice")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_health() {
    let response = router(app_state(true))
        .oneshot(
            Request::builder()
                .uri("/v1/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: HealthResponse = body_json(response).await;
    assert_eq!(body.status, "healthy");
    assert_eq!(body.feedback_count, 0);
    assert_eq!(body.pending_clarifications, 0);
}
