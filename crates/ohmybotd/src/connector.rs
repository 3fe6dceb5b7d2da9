//! Outbound transports.
//!
//! `ConnectorClient` posts activities to the Bot Framework connector of the
//! conversation's service URL. `Outbox` keeps messages in memory per user so
//! ohmybotctl can read them.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ohmybot_shared::{Activity, Address, BotError, BotResult};
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::{debug, info};
use url::Url;

use crate::config::TransportConfig;

/// Refresh tokens this long before they expire.
const TOKEN_SLACK_SECS: i64 = 60;

/// Never trust a token for longer than a day, whatever the endpoint says.
const TOKEN_MAX_SECS: i64 = 86_400;

#[async_trait]
pub trait Transport: Send + Sync {
    async fn send_text(&self, to: &Address, text: &str) -> BotResult<()>;

    async fn send_typing(&self, to: &Address) -> BotResult<()>;

    /// Whether direct replies travel back in the HTTP response instead.
    fn replies_inline(&self) -> bool {
        false
    }
}

// ============================================================================
// Bot Framework connector
// ============================================================================

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: i64,
}

#[derive(Debug, Clone)]
struct CachedToken {
    value: String,
    expires_at: DateTime<Utc>,
}

pub struct ConnectorClient {
    http: reqwest::Client,
    app_id: String,
    app_password: String,
    token_url: String,
    token_scope: String,
    token: Mutex<Option<CachedToken>>,
}

impl ConnectorClient {
    pub fn new(config: &TransportConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            http,
            app_id: config.app_id.clone(),
            app_password: config.app_password.clone(),
            token_url: config.token_url.clone(),
            token_scope: config.token_scope.clone(),
            token: Mutex::new(None),
        })
    }

    /// Bearer token for the connector, or `None` when running unauthenticated.
    async fn bearer(&self) -> BotResult<Option<String>> {
        if self.app_id.is_empty() {
            return Ok(None);
        }

        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref() {
            if token.expires_at > Utc::now() {
                return Ok(Some(token.value.clone()));
            }
        }

        let params = [
            ("grant_type", "client_credentials"),
            ("client_id", self.app_id.as_str()),
            ("client_secret", self.app_password.as_str()),
            ("scope", self.token_scope.as_str()),
        ];
        let token: TokenResponse = self
            .http
            .post(&self.token_url)
            .form(&params)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| BotError::Transport(format!("token request failed: {}", e)))?
            .json()
            .await
            .map_err(|e| BotError::Transport(format!("bad token response: {}", e)))?;

        let lifetime = token_lifetime(token.expires_in);
        info!("Fetched connector token, valid for {}s", lifetime.num_seconds());
        *cached = Some(CachedToken {
            value: token.access_token.clone(),
            expires_at: Utc::now() + lifetime,
        });
        Ok(Some(token.access_token))
    }

    async fn post_activity(&self, to: &Address, activity: &Activity) -> BotResult<()> {
        let url = activities_url(&to.service_url, &to.conversation_id)?;
        let mut request = self.http.post(url).json(activity);
        if let Some(token) = self.bearer().await? {
            request = request.bearer_auth(token);
        }
        request
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| BotError::Transport(e.to_string()))?;
        debug!("Sent {} to conversation {}", activity.kind, to.conversation_id);
        Ok(())
    }
}

/// How long to cache a token the endpoint says lives `expires_in` seconds.
fn token_lifetime(expires_in: i64) -> chrono::Duration {
    let secs = expires_in
        .min(TOKEN_MAX_SECS)
        .saturating_sub(TOKEN_SLACK_SECS)
        .max(0);
    chrono::Duration::try_seconds(secs).unwrap_or_default()
}

/// `{serviceUrl}/v3/conversations/{conversationId}/activities`, path-escaped.
pub fn activities_url(service_url: &str, conversation_id: &str) -> BotResult<Url> {
    let mut url = Url::parse(service_url)
        .map_err(|e| BotError::Transport(format!("bad service url {:?}: {}", service_url, e)))?;
    url.path_segments_mut()
        .map_err(|_| BotError::Transport(format!("service url {:?} cannot be a base", service_url)))?
        .pop_if_empty()
        .extend(["v3", "conversations", conversation_id, "activities"]);
    Ok(url)
}

#[async_trait]
impl Transport for ConnectorClient {
    async fn send_text(&self, to: &Address, text: &str) -> BotResult<()> {
        self.post_activity(to, &Activity::message_to(to, text)).await
    }

    async fn send_typing(&self, to: &Address) -> BotResult<()> {
        self.post_activity(to, &Activity::typing_to(to)).await
    }
}

// ============================================================================
// Console outbox
// ============================================================================

/// Per-user message queues.
#[derive(Debug, Default)]
pub struct Outbox {
    queues: Mutex<HashMap<String, Vec<String>>>,
}

impl Outbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove and return everything queued for `user_id`.
    pub async fn drain(&self, user_id: &str) -> Vec<String> {
        self.queues.lock().await.remove(user_id).unwrap_or_default()
    }

    pub async fn peek(&self, user_id: &str) -> Vec<String> {
        self.queues
            .lock()
            .await
            .get(user_id)
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl Transport for Outbox {
    async fn send_text(&self, to: &Address, text: &str) -> BotResult<()> {
        self.queues
            .lock()
            .await
            .entry(to.user_id.clone())
            .or_default()
            .push(text.to_string());
        Ok(())
    }

    async fn send_typing(&self, to: &Address) -> BotResult<()> {
        debug!("{} is typing...", to.user_id);
        Ok(())
    }

    fn replies_inline(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_activities_url() {
        let url = activities_url("https://smba.trafficmanager.net/emea/", "19:abc@thread.v2").unwrap();
        assert_eq!(
            url.as_str(),
            "https://smba.trafficmanager.net/emea/v3/conversations/19:abc@thread.v2/activities"
        );

        let url = activities_url("http://localhost:3979", "a b").unwrap();
        assert_eq!(url.as_str(), "http://localhost:3979/v3/conversations/a%20b/activities");
    }

    #[test]
    fn test_activities_url_rejects_garbage() {
        assert!(matches!(
            activities_url("", "c"),
            Err(BotError::Transport(_))
        ));
    }

    #[test]
    fn test_token_lifetime() {
        assert_eq!(token_lifetime(3600), chrono::Duration::seconds(3540));
        assert_eq!(token_lifetime(30), chrono::Duration::zero());
        assert_eq!(token_lifetime(-5), chrono::Duration::zero());
        assert_eq!(token_lifetime(i64::MIN), chrono::Duration::zero());
        assert_eq!(
            token_lifetime(i64::MAX),
            chrono::Duration::seconds(TOKEN_MAX_SECS - TOKEN_SLACK_SECS)
        );
    }

    #[test]
    fn test_huge_expires_in_deserializes() {
        let token: TokenResponse = serde_json::from_str(
            r#"{"access_token":"t","expires_in":9223372036854775807}"#,
        )
        .unwrap();
        assert_eq!(
            token_lifetime(token.expires_in),
            chrono::Duration::seconds(TOKEN_MAX_SECS - TOKEN_SLACK_SECS)
        );
    }

    #[tokio::test]
    async fn test_outbox_drain() {
        let outbox = Outbox::new();
        let alice = Address::console("alice");
        outbox.send_text(&alice, "one").await.unwrap();
        outbox.send_text(&alice, "two").await.unwrap();
        outbox.send_typing(&alice).await.unwrap();

        assert_eq!(outbox.peek("alice").await, vec!["one", "two"]);
        assert_eq!(outbox.drain("alice").await, vec!["one", "two"]);
        assert!(outbox.drain("alice").await.is_empty());
        assert!(outbox.replies_inline());
    }

    #[tokio::test]
    async fn test_no_app_id_means_no_token() {
        let client = ConnectorClient::new(&TransportConfig::default()).unwrap();
        assert_eq!(client.bearer().await.unwrap(), None);
    }
}
