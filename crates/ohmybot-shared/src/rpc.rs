//! Daemon HTTP API payloads shared by ohmybotd and ohmybotctl.

use serde::{Deserialize, Serialize};

/// Body returned by `POST /api/messages`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageReplies {
    #[serde(default)]
    pub replies: Vec<String>,
}

/// Body returned by `GET /api/outbox/{user_id}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboxResponse {
    pub user_id: String,
    #[serde(default)]
    pub messages: Vec<String>,
}

/// Body returned by `GET /v1/health`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub feedback_count: usize,
    pub pending_clarifications: usize,
}
