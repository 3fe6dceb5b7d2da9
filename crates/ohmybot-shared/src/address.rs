//! Conversation addresses and Bot Framework activities.
//!
//! An `Address` is everything needed to send a message back to one user:
//! the connector service URL, the conversation and the user's id on that
//! channel. Activities are (de)serialized in camelCase to match the
//! connector REST API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const ACTIVITY_MESSAGE: &str = "message";
pub const ACTIVITY_TYPING: &str = "typing";

/// Reference to a user's conversation on a channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub channel_id: String,
    pub service_url: String,
    pub conversation_id: String,
    pub user_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bot_id: Option<String>,
}

impl Address {
    /// Console address used by the CLI and tests.
    pub fn console(user_id: impl Into<String>) -> Self {
        let user_id = user_id.into();
        Self {
            channel_id: "console".to_string(),
            service_url: String::new(),
            conversation_id: format!("console-{}", user_id),
            user_id,
            user_name: None,
            bot_id: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelAccount {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationAccount {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Inbound or outbound connector activity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default)]
    pub from: ChannelAccount,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipient: Option<ChannelAccount>,
    #[serde(default)]
    pub conversation: ConversationAccount,
    #[serde(default)]
    pub channel_id: String,
    #[serde(default)]
    pub service_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

impl Activity {
    pub fn is_message(&self) -> bool {
        self.kind == ACTIVITY_MESSAGE
    }

    /// Address of the sender, for replies and later follow-ups.
    pub fn sender_address(&self) -> Address {
        Address {
            channel_id: self.channel_id.clone(),
            service_url: self.service_url.clone(),
            conversation_id: self.conversation.id.clone(),
            user_id: self.from.id.clone(),
            user_name: self.from.name.clone(),
            bot_id: self.recipient.as_ref().map(|r| r.id.clone()),
        }
    }

    /// Outbound message activity addressed to `to`.
    pub fn message_to(to: &Address, text: impl Into<String>) -> Self {
        Self::outbound(to, ACTIVITY_MESSAGE, Some(text.into()))
    }

    /// Outbound typing indicator addressed to `to`.
    pub fn typing_to(to: &Address) -> Self {
        Self::outbound(to, ACTIVITY_TYPING, None)
    }

    fn outbound(to: &Address, kind: &str, text: Option<String>) -> Self {
        Self {
            kind: kind.to_string(),
            id: None,
            text,
            from: ChannelAccount {
                id: to.bot_id.clone().unwrap_or_default(),
                name: None,
            },
            recipient: Some(ChannelAccount {
                id: to.user_id.clone(),
                name: to.user_name.clone(),
            }),
            conversation: ConversationAccount {
                id: to.conversation_id.clone(),
                name: None,
            },
            channel_id: to.channel_id.clone(),
            service_url: to.service_url.clone(),
            timestamp: None,
        }
    }
}
