//! Command handlers.
//!
//! Each handler works on the shared state and returns the reply for the
//! sender, or a `BotError` that dispatch turns into a user-facing message.
//! Locks are released before any call leaves the process.

use std::collections::BTreeSet;

use ohmybot_shared::clarify::{self, ClarifyDialog, CLARIFY_ANSWERED, CLARIFY_SCHEDULED, CLARIFY_THANKS};
use ohmybot_shared::render::GREETING;
use ohmybot_shared::{Address, Args, BotError, BotResult, Reply};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::scheduler::FollowUp;
use crate::state::AppState;

/// Store a piece of feedback from `sender`.
pub async fn handle_submit(
    state: &AppState,
    text: &str,
    hashtags: &BTreeSet<String>,
    args: &Args,
    sender: &Address,
) -> BotResult<Reply> {
    let submitter = if args.flag("noreply") {
        None
    } else {
        Some(sender.clone())
    };
    let id = state.store.write().await.submit(text, hashtags, submitter)?;
    info!("Stored feedback {} under {} tag(s)", id, hashtags.len());
    Ok(Reply::Ack)
}

/// Look up feedback for `hashtags`, anonymizing unless `bypass` is set.
///
/// A successful retrieval becomes the sender's last view.
pub async fn handle_retrieve(
    state: &AppState,
    hashtags: &BTreeSet<String>,
    args: &Args,
    sender: &Address,
) -> BotResult<Reply> {
    if hashtags.is_empty() {
        return Err(BotError::NoHashtagFound);
    }

    if let Err(e) = state.transport.send_typing(sender).await {
        debug!("Typing indicator failed: {}", e);
    }

    let lookback = lookback_for(args, &state.config);
    let records = state.store.read().await.query(hashtags, lookback);
    let records = if args.flag("bypass") {
        records
    } else {
        state.anonymizer.anonymize(records).await?
    };
    info!("Retrieved {} feedback item(s) for {} tag(s)", records.len(), hashtags.len());

    state
        .sessions
        .write()
        .await
        .set_last_view(&sender.user_id, records.clone());
    Ok(Reply::Records(records))
}

/// Start a clarification dialog with the author of item `position`.
pub async fn handle_clarify(state: &AppState, position: usize, sender: &Address) -> BotResult<Reply> {
    let view = state.sessions.read().await.last_view(&sender.user_id);
    let target = clarify::resolve_target(&view, position)?;

    // The view may hold anonymized text; the author gets their own words back.
    let original = state
        .store
        .read()
        .await
        .get(target.id)
        .map(|r| r.text)
        .unwrap_or_else(|| target.text.clone());

    let dialog = ClarifyDialog::open(target, Some(sender.clone()), state.clock.now())?;
    info!("Scheduling clarification of feedback {}", dialog.record_id);
    state.followups.schedule(FollowUp {
        dialog,
        prompt: clarify::prompt_text(&original),
    })?;
    Ok(Reply::text(CLARIFY_SCHEDULED))
}

/// Record an author's answer to a pending dialog.
pub async fn handle_clarify_reply(
    state: &AppState,
    mut dialog: ClarifyDialog,
    text: &str,
) -> BotResult<Reply> {
    {
        let mut store = state.store.write().await;
        dialog.complete(text, &mut **store)?;
    }
    info!("Feedback {} clarified", dialog.record_id);

    if let Some(requester) = &dialog.requester {
        if let Err(e) = state.transport.send_text(requester, CLARIFY_ANSWERED).await {
            warn!("Could not notify requester of feedback {}: {}", dialog.record_id, e);
        }
    }
    Ok(Reply::text(CLARIFY_THANKS))
}

pub fn handle_greeting() -> Reply {
    Reply::text(GREETING)
}

/// Lookback for a retrieval: `;;window=` wins over config.
fn lookback_for(args: &Args, config: &Config) -> Option<chrono::Duration> {
    match args.get("window").map(str::trim) {
        None | Some("") => config.lookback(),
        Some("0") | Some("all") => None,
        Some(raw) => raw
            .parse::<i64>()
            .ok()
            .filter(|secs| *secs > 0)
            .and_then(chrono::Duration::try_seconds)
            .or_else(|| {
                warn!("Ignoring bad window argument {:?}", raw);
                config.lookback()
            }),
    }
}
