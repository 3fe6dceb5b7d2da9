//! Machine translation client.
//!
//! Wraps the Microsoft Translator v3 REST API behind the `TextTransform`
//! trait so the anonymizer can be exercised with a fake.

use std::time::Duration;

use async_trait::async_trait;
use ohmybot_shared::{BotError, BotResult};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::TranslatorConfig;

const API_VERSION: &str = "3.0";

/// Something that can rewrite text from one locale to another.
#[async_trait]
pub trait TextTransform: Send + Sync {
    async fn translate(&self, text: &str, from: &str, to: &str) -> BotResult<String>;
}

#[derive(Debug, Serialize)]
struct TranslateItem<'a> {
    #[serde(rename = "Text")]
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct TranslateResult {
    #[serde(default)]
    translations: Vec<Translation>,
}

#[derive(Debug, Deserialize)]
struct Translation {
    text: String,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(default)]
    code: i64,
    message: String,
}

/// Client for `POST {endpoint}/translate`.
pub struct TranslatorClient {
    http: reqwest::Client,
    endpoint: String,
    key: String,
    region: Option<String>,
}

impl TranslatorClient {
    pub fn new(config: &TranslatorConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            http,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            key: config.key.clone(),
            region: config.region.clone(),
        })
    }

    fn url(&self) -> String {
        format!("{}/translate", self.endpoint)
    }
}

#[async_trait]
impl TextTransform for TranslatorClient {
    async fn translate(&self, text: &str, from: &str, to: &str) -> BotResult<String> {
        if self.key.is_empty() {
            return Err(BotError::ExternalTransformFailure(
                "translator key is not configured".to_string(),
            ));
        }

        let mut request = self
            .http
            .post(self.url())
            .query(&[("api-version", API_VERSION), ("from", from), ("to", to)])
            .header("Ocp-Apim-Subscription-Key", &self.key)
            .json(&[TranslateItem { text }]);
        if let Some(region) = &self.region {
            request = request.header("Ocp-Apim-Subscription-Region", region);
        }

        let response = request
            .send()
            .await
            .map_err(|e| BotError::ExternalTransformFailure(e.to_string()))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| BotError::ExternalTransformFailure(e.to_string()))?;
        debug!("Translator {} -> {}: HTTP {}", from, to, status);

        if !status.is_success() {
            return Err(BotError::ExternalTransformFailure(error_message(status, &body)));
        }
        parse_translation(&body)
    }
}

/// Pull the first translation out of a translate response body.
pub fn parse_translation(body: &str) -> BotResult<String> {
    let results: Vec<TranslateResult> = serde_json::from_str(body)
        .map_err(|e| BotError::ExternalTransformFailure(format!("bad translator response: {}", e)))?;
    results
        .into_iter()
        .next()
        .and_then(|r| r.translations.into_iter().next())
        .map(|t| t.text)
        .ok_or_else(|| BotError::ExternalTransformFailure("empty translation".to_string()))
}

fn error_message(status: reqwest::StatusCode, body: &str) -> String {
    match serde_json::from_str::<ApiErrorBody>(body) {
        Ok(err) => format!("{} (code {})", err.error.message, err.error.code),
        Err(_) => format!("translator returned HTTP {}", status.as_u16()),
    }
}
