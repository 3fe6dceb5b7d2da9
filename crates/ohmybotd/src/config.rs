//! Configuration management for ohmybotd.
//!
//! Loads settings from /etc/ohmybot/config.toml or uses defaults, then lets
//! the environment (and a `.env` file) override secrets and the port.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

/// Config file path
pub const CONFIG_PATH: &str = "/etc/ohmybot/config.toml";

/// Default config file path for fallback
pub const DEFAULT_CONFIG_PATH: &str = "/var/lib/ohmybot/config.toml";

/// Environment variable naming an explicit config file
pub const CONFIG_ENV: &str = "OHMYBOT_CONFIG";

/// HTTP listener configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_bind() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3978
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            port: default_port(),
        }
    }
}

impl ServerConfig {
    pub fn addr(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }
}

/// How replies and follow-ups leave the bot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportKind {
    /// Bot Framework connector REST API
    #[default]
    Connector,
    /// In-memory outbox drained over HTTP (ohmybotctl)
    Console,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransportConfig {
    #[serde(default)]
    pub kind: TransportKind,

    /// Bot Framework app id; empty disables outbound auth (emulator)
    #[serde(default)]
    pub app_id: String,

    #[serde(default)]
    pub app_password: String,

    #[serde(default = "default_token_url")]
    pub token_url: String,

    #[serde(default = "default_token_scope")]
    pub token_scope: String,

    #[serde(default = "default_http_timeout")]
    pub timeout_secs: u64,
}

fn default_token_url() -> String {
    "https://login.microsoftonline.com/botframework.com/oauth2/v2.0/token".to_string()
}

fn default_token_scope() -> String {
    "https://api.botframework.com/.default".to_string()
}

fn default_http_timeout() -> u64 {
    10
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            kind: TransportKind::default(),
            app_id: String::new(),
            app_password: String::new(),
            token_url: default_token_url(),
            token_scope: default_token_scope(),
            timeout_secs: default_http_timeout(),
        }
    }
}

/// Text translation service used for anonymization
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslatorConfig {
    #[serde(default = "default_translator_endpoint")]
    pub endpoint: String,

    #[serde(default)]
    pub key: String,

    /// Azure region, required for regional resources
    #[serde(default)]
    pub region: Option<String>,

    /// Language feedback is written in
    #[serde(default = "default_source_locale")]
    pub source_locale: String,

    /// Language the text is bounced through
    #[serde(default = "default_pivot_locale")]
    pub pivot_locale: String,

    #[serde(default = "default_http_timeout")]
    pub timeout_secs: u64,
}

fn default_translator_endpoint() -> String {
    "https://api.cognitive.microsofttranslator.com".to_string()
}

fn default_source_locale() -> String {
    "en".to_string()
}

fn default_pivot_locale() -> String {
    "ja".to_string()
}

impl Default for TranslatorConfig {
    fn default() -> Self {
        Self {
            endpoint: default_translator_endpoint(),
            key: String::new(),
            region: None,
            source_locale: default_source_locale(),
            pivot_locale: default_pivot_locale(),
            timeout_secs: default_http_timeout(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecognizerKind {
    /// Local ordered pattern rules
    #[default]
    Regex,
    /// LUIS prediction endpoint, regex fallback
    Luis,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecognizerConfig {
    #[serde(default)]
    pub kind: RecognizerKind,

    /// Full prediction URL including app id and key; the query is appended as `q`
    #[serde(default)]
    pub endpoint: String,

    /// Intents scoring below this are treated as unrecognized
    #[serde(default = "default_min_score")]
    pub min_score: f64,

    #[serde(default = "default_http_timeout")]
    pub timeout_secs: u64,
}

fn default_min_score() -> f64 {
    0.5
}

impl Default for RecognizerConfig {
    fn default() -> Self {
        Self {
            kind: RecognizerKind::default(),
            endpoint: String::new(),
            min_score: default_min_score(),
            timeout_secs: default_http_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// How far back a retrieval looks, in seconds; 0 means no limit
    #[serde(default = "default_lookback")]
    pub lookback_secs: u64,
}

fn default_lookback() -> u64 {
    86_400
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            lookback_secs: default_lookback(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClarifyConfig {
    /// Delay before the author is messaged
    #[serde(default = "default_clarify_delay")]
    pub delay_ms: u64,

    /// How long an unanswered request stays open, in seconds; 0 means forever
    #[serde(default = "default_clarify_ttl")]
    pub ttl_secs: u64,
}

fn default_clarify_delay() -> u64 {
    500
}

fn default_clarify_ttl() -> u64 {
    86_400
}

impl Default for ClarifyConfig {
    fn default() -> Self {
        Self {
            delay_ms: default_clarify_delay(),
            ttl_secs: default_clarify_ttl(),
        }
    }
}

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub transport: TransportConfig,

    #[serde(default)]
    pub translator: TranslatorConfig,

    #[serde(default)]
    pub recognizer: RecognizerConfig,

    #[serde(default)]
    pub retrieval: RetrievalConfig,

    #[serde(default)]
    pub clarify: ClarifyConfig,
}

impl Config {
    /// Load config from file (or defaults), then apply environment overrides
    pub fn load() -> Self {
        let mut config = match std::env::var(CONFIG_ENV) {
            Ok(path) => Self::load_from_path(&path).unwrap_or_else(|e| {
                warn!("Could not load {}: {}, using defaults", path, e);
                Config::default()
            }),
            Err(_) => Self::load_from_path(CONFIG_PATH)
                .or_else(|_| Self::load_from_path(DEFAULT_CONFIG_PATH))
                .unwrap_or_else(|e| {
                    warn!("Config not found, using defaults: {}", e);
                    Config::default()
                }),
        };
        config.apply_env(|key| std::env::var(key).ok());
        config
    }

    /// Load config from specific path
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Override settings from environment variables looked up through `var`
    pub fn apply_env<F>(&mut self, var: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(port) = var("PORT").and_then(|p| p.parse().ok()) {
            self.server.port = port;
        }
        if let Some(id) = var("MICROSOFT_APP_ID") {
            self.transport.app_id = id;
        }
        if let Some(password) = var("MICROSOFT_APP_PASSWORD") {
            self.transport.app_password = password;
        }
        match var("OHMYBOT_TRANSPORT").as_deref() {
            Some("console") => self.transport.kind = TransportKind::Console,
            Some("connector") => self.transport.kind = TransportKind::Connector,
            Some(other) => warn!("Ignoring unknown OHMYBOT_TRANSPORT={}", other),
            None => {}
        }
        if let Some(key) = var("TRANSLATOR_KEY") {
            self.translator.key = key;
        }
        if let Some(region) = var("TRANSLATOR_REGION") {
            self.translator.region = Some(region);
        }
        if let Some(endpoint) = var("LUIS_ENDPOINT") {
            self.recognizer.endpoint = endpoint;
            self.recognizer.kind = RecognizerKind::Luis;
        }
    }

    /// Lookback window for retrievals, `None` when unbounded
    pub fn lookback(&self) -> Option<chrono::Duration> {
        seconds_limit(self.retrieval.lookback_secs)
    }

    /// Lifetime of a pending clarification, `None` when they never expire
    pub fn clarify_ttl(&self) -> Option<chrono::Duration> {
        seconds_limit(self.clarify.ttl_secs)
    }
}

/// 0, or anything too large to represent, means no limit.
fn seconds_limit(secs: u64) -> Option<chrono::Duration> {
    match secs {
        0 => None,
        secs => i64::try_from(secs)
            .ok()
            .and_then(chrono::Duration::try_seconds),
    }
}
