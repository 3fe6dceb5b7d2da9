//! Intent recognizers.
//!
//! Turn message text into a `Command`. The regex recognizer runs the local
//! rule table; the LUIS recognizer asks a prediction endpoint for the intent
//! label and falls back to the rules when the call fails.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use ohmybot_shared::command::{self, Command, CommandKind};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::RecognizerConfig;

#[async_trait]
pub trait IntentRecognizer: Send + Sync {
    /// `None` means the text was not understood.
    async fn recognize(&self, text: &str) -> Option<Command>;

    fn name(&self) -> &'static str;
}

/// Local ordered pattern rules.
#[derive(Debug, Default, Clone, Copy)]
pub struct RegexRecognizer;

#[async_trait]
impl IntentRecognizer for RegexRecognizer {
    async fn recognize(&self, text: &str) -> Option<Command> {
        let (rule, cmd) = command::parse_with_rule(text)?;
        debug!("Matched rule {}", rule);
        Some(cmd)
    }

    fn name(&self) -> &'static str {
        "regex"
    }
}

/// LUIS prediction response (v2 shape).
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LuisPrediction {
    #[serde(default)]
    pub query: String,
    pub top_scoring_intent: Option<LuisIntent>,
}

#[derive(Debug, Deserialize)]
pub struct LuisIntent {
    pub intent: String,
    #[serde(default)]
    pub score: f64,
}

/// Map a LUIS intent label to a command kind.
pub fn kind_for_intent(label: &str) -> Option<CommandKind> {
    match label.to_lowercase().as_str() {
        "rant" | "feedback" | "submit" => Some(CommandKind::Submit),
        "retro" | "retrieve" | "query" => Some(CommandKind::Retrieve),
        "greeting" | "hello" => Some(CommandKind::Greeting),
        "clarify" | "clarification" => Some(CommandKind::Clarify),
        _ => None,
    }
}

pub struct LuisRecognizer {
    http: reqwest::Client,
    endpoint: String,
    min_score: f64,
    fallback: RegexRecognizer,
}

impl LuisRecognizer {
    pub fn new(config: &RecognizerConfig) -> Result<Self> {
        anyhow::ensure!(!config.endpoint.is_empty(), "LUIS endpoint is not configured");
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            http,
            endpoint: config.endpoint.clone(),
            min_score: config.min_score,
            fallback: RegexRecognizer,
        })
    }

    async fn predict(&self, text: &str) -> Result<LuisPrediction> {
        let response = self
            .http
            .get(&self.endpoint)
            .query(&[("q", text)])
            .send()
            .await
            .context("LUIS request failed")?
            .error_for_status()
            .context("LUIS returned an error status")?;
        response
            .json::<LuisPrediction>()
            .await
            .context("LUIS response was not a prediction")
    }

    /// Command for a prediction, using the local parsers for entities.
    pub fn command_for(&self, prediction: &LuisPrediction, text: &str) -> Option<Command> {
        let intent = prediction.top_scoring_intent.as_ref()?;
        if intent.score < self.min_score {
            debug!("LUIS intent {} below threshold ({:.2})", intent.intent, intent.score);
            return None;
        }
        command::from_kind(kind_for_intent(&intent.intent)?, text)
    }
}

#[async_trait]
impl IntentRecognizer for LuisRecognizer {
    async fn recognize(&self, text: &str) -> Option<Command> {
        match self.predict(text).await {
            Ok(prediction) => self.command_for(&prediction, text),
            Err(e) => {
                warn!("LUIS unavailable, using local rules: {:#}", e);
                self.fallback.recognize(text).await
            }
        }
    }

    fn name(&self) -> &'static str {
        "luis"
    }
}
