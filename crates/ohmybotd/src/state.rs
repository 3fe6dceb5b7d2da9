//! Daemon state shared across request handlers.

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use ohmybot_shared::clarify::PendingClarifications;
use ohmybot_shared::clock::{Clock, SystemClock};
use ohmybot_shared::{FeedbackStore, InMemoryFeedbackStore};
use tokio::sync::{Mutex, RwLock};
use tracing::info;

use crate::anonymizer::Anonymizer;
use crate::config::{Config, RecognizerKind, TransportKind};
use crate::connector::{ConnectorClient, Outbox, Transport};
use crate::recognizer::{IntentRecognizer, LuisRecognizer, RegexRecognizer};
use crate::scheduler::{self, FollowUpQueue};
use crate::session::SessionStore;
use crate::translator::{TextTransform, TranslatorClient};

pub type SharedStore = Arc<RwLock<Box<dyn FeedbackStore>>>;

/// Application state shared across handlers
pub struct AppState {
    pub config: Config,
    pub store: SharedStore,
    pub sessions: Arc<RwLock<SessionStore>>,
    pub pending: Arc<Mutex<PendingClarifications>>,
    pub transport: Arc<dyn Transport>,
    /// Set when the console transport is active
    pub outbox: Option<Arc<Outbox>>,
    pub recognizer: Arc<dyn IntentRecognizer>,
    pub anonymizer: Anonymizer,
    pub followups: FollowUpQueue,
    /// Time source for dialog expiry; the store carries its own
    pub clock: Arc<dyn Clock>,
    pub start_time: Instant,
}

/// Collaborators an `AppState` is assembled from.
pub struct Parts {
    pub store: Box<dyn FeedbackStore>,
    pub transport: Arc<dyn Transport>,
    pub outbox: Option<Arc<Outbox>>,
    pub recognizer: Arc<dyn IntentRecognizer>,
    pub transform: Arc<dyn TextTransform>,
    pub clock: Arc<dyn Clock>,
}

impl AppState {
    /// Build the production state from config. Must run inside a tokio runtime.
    pub fn from_config(config: Config) -> Result<Self> {
        let (transport, outbox) = match config.transport.kind {
            TransportKind::Connector => {
                let client: Arc<dyn Transport> = Arc::new(ConnectorClient::new(&config.transport)?);
                (client, None)
            }
            TransportKind::Console => {
                let outbox = Arc::new(Outbox::new());
                let transport: Arc<dyn Transport> = outbox.clone();
                (transport, Some(outbox))
            }
        };

        let recognizer: Arc<dyn IntentRecognizer> = match config.recognizer.kind {
            RecognizerKind::Regex => Arc::new(RegexRecognizer),
            RecognizerKind::Luis => Arc::new(LuisRecognizer::new(&config.recognizer)?),
        };

        let transform = Arc::new(TranslatorClient::new(&config.translator)?);
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);

        info!(
            "Transport: {:?}, recognizer: {}",
            config.transport.kind,
            recognizer.name()
        );

        Ok(Self::with_parts(
            config,
            Parts {
                store: Box::new(InMemoryFeedbackStore::with_clock(Arc::clone(&clock))),
                transport,
                outbox,
                recognizer,
                transform,
                clock,
            },
        ))
    }

    /// Assemble state from explicit collaborators and start the follow-up scheduler.
    pub fn with_parts(config: Config, parts: Parts) -> Self {
        let pending = Arc::new(Mutex::new(PendingClarifications::new()));
        let (followups, _handle) = scheduler::spawn(
            Arc::clone(&parts.transport),
            Arc::clone(&pending),
            Duration::from_millis(config.clarify.delay_ms),
        );
        let anonymizer = Anonymizer::new(
            parts.transform,
            config.translator.source_locale.clone(),
            config.translator.pivot_locale.clone(),
        );

        Self {
            config,
            store: Arc::new(RwLock::new(parts.store)),
            sessions: Arc::new(RwLock::new(SessionStore::new())),
            pending,
            transport: parts.transport,
            outbox: parts.outbox,
            recognizer: parts.recognizer,
            anonymizer,
            followups,
            clock: parts.clock,
            start_time: Instant::now(),
        }
    }
}
