//! HTTP client for communicating with ohmybotd.

use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use ohmybot_shared::address::{ChannelAccount, ConversationAccount, ACTIVITY_MESSAGE};
use ohmybot_shared::rpc::{HealthResponse, MessageReplies, OutboxResponse};
use ohmybot_shared::Activity;
use serde::de::DeserializeOwned;

pub const DEFAULT_URL: &str = "http://127.0.0.1:3978";

/// Client for communicating with ohmybotd
pub struct BotClient {
    http: reqwest::Client,
    base: String,
}

impl BotClient {
    pub fn new(base: &str) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            http,
            base: base.trim_end_matches('/').to_string(),
        })
    }

    /// Post a message as `user` and return the bot's replies
    pub async fn send(&self, text: &str, user: &str, name: Option<String>) -> Result<Vec<String>> {
        let activity = console_activity(text, user, name);
        let response = self
            .http
            .post(format!("{}/api/messages", self.base))
            .json(&activity)
            .send()
            .await
            .map_err(|e| self.unreachable(e))?;
        let replies: MessageReplies = Self::decode(response).await?;
        Ok(replies.replies)
    }

    pub async fn outbox(&self, user: &str) -> Result<Vec<String>> {
        let response = self
            .http
            .get(format!("{}/api/outbox/{}", self.base, user))
            .send()
            .await
            .map_err(|e| self.unreachable(e))?;
        let outbox: OutboxResponse = Self::decode(response).await?;
        Ok(outbox.messages)
    }

    pub async fn health(&self) -> Result<HealthResponse> {
        let response = self
            .http
            .get(format!("{}/v1/health", self.base))
            .send()
            .await
            .map_err(|e| self.unreachable(e))?;
        Self::decode(response).await
    }

    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("Daemon returned HTTP {}: {}", status.as_u16(), body));
        }
        response.json().await.context("Unexpected response from daemon")
    }

    fn unreachable(&self, e: reqwest::Error) -> anyhow::Error {
        anyhow!(
            "Cannot reach OhMyBot daemon at {}: {}\n\n\
             Start it with the console transport:\n\
             OHMYBOT_TRANSPORT=console ohmybotd",
            self.base,
            e
        )
    }
}

/// Message activity as the console channel would deliver it
pub fn console_activity(text: &str, user: &str, name: Option<String>) -> Activity {
    Activity {
        kind: ACTIVITY_MESSAGE.to_string(),
        id: Some(uuid::Uuid::new_v4().to_string()),
        text: Some(text.to_string()),
        from: ChannelAccount {
            id: user.to_string(),
            name,
        },
        recipient: Some(ChannelAccount {
            id: "ohmybot".to_string(),
            name: Some("OhMyBot".to_string()),
        }),
        conversation: ConversationAccount {
            id: format!("console-{}", user),
            name: None,
        },
        channel_id: "console".to_string(),
        service_url: String::new(),
        timestamp: Some(Utc::now()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_console_activity() {
        let activity = console_activity("hi #x", "sam", None);
        assert!(activity.is_message());
        let addr = activity.sender_address();
        assert_eq!(addr.user_id, "sam");
        assert_eq!(addr.conversation_id, "console-sam");
        assert_eq!(addr.bot_id.as_deref(), Some("ohmybot"));
    }

    #[test]
    fn test_base_url_trailing_slash() {
        let client = BotClient::new("http://localhost:3978/").unwrap();
        assert_eq!(client.base, "http://localhost:3978");
    }
}
