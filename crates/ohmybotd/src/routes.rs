//! API routes for ohmybotd

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use ohmybot_shared::rpc::{HealthResponse, MessageReplies, OutboxResponse};
use ohmybot_shared::{Activity, VERSION};
use std::sync::Arc;
use tracing::{debug, error};

use crate::dispatch;
use crate::state::AppState;

type AppStateArc = Arc<AppState>;

// ============================================================================
// Bot Routes
// ============================================================================

pub fn message_routes() -> Router<AppStateArc> {
    Router::new()
        .route("/api/messages", post(receive_activity))
        .route("/api/outbox/:user_id", get(drain_outbox))
}

async fn receive_activity(
    State(state): State<AppStateArc>,
    Json(activity): Json<Activity>,
) -> Json<MessageReplies> {
    if !activity.is_message() {
        debug!("Ignoring {} activity", activity.kind);
        return Json(MessageReplies::default());
    }

    let reply = dispatch::handle_message(&state, &activity).await.render();

    if !state.transport.replies_inline() {
        let sender = activity.sender_address();
        if let Err(e) = state.transport.send_text(&sender, &reply).await {
            error!("Reply to {} not delivered: {}", sender.user_id, e);
        }
    }

    Json(MessageReplies {
        replies: vec![reply],
    })
}

async fn drain_outbox(
    State(state): State<AppStateArc>,
    Path(user_id): Path<String>,
) -> Result<Json<OutboxResponse>, (StatusCode, String)> {
    let outbox = state.outbox.as_ref().ok_or_else(|| {
        (
            StatusCode::NOT_FOUND,
            "Outbox is only available with the console transport".to_string(),
        )
    })?;
    let messages = outbox.drain(&user_id).await;
    Ok(Json(OutboxResponse { user_id, messages }))
}

// ============================================================================
// Health Routes
// ============================================================================

pub fn health_routes() -> Router<AppStateArc> {
    Router::new().route("/v1/health", get(health_check))
}

async fn health_check(State(state): State<AppStateArc>) -> Json<HealthResponse> {
    let feedback_count = state.store.read().await.len();
    let pending_clarifications = state.pending.lock().await.len();

    Json(HealthResponse {
        status: "healthy".to_string(),
        version: VERSION.to_string(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        feedback_count,
        pending_clarifications,
    })
}
