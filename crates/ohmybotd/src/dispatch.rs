//! Message dispatch.
//!
//! A message from a user with a pending clarification is that user's answer,
//! unless the request has expired.
//! Anything else goes through the intent recognizer and on to the handler
//! for the recognised command.

use ohmybot_shared::{Activity, Address, BotError, BotResult, Command, Reply};
use tracing::{debug, info};

use crate::handlers;
use crate::state::AppState;

/// Handle one inbound message activity and produce the sender's reply.
pub async fn handle_message(state: &AppState, activity: &Activity) -> Reply {
    let text = activity.text.as_deref().unwrap_or_default();
    let sender = activity.sender_address();

    let result = match take_pending(state, &sender, text).await {
        Some(dialog) => handlers::handle_clarify_reply(state, dialog, text).await,
        None => match state.recognizer.recognize(text).await {
            Some(command) => run(state, command, &sender).await,
            None => Err(BotError::UnrecognizedCommand),
        },
    };

    match result {
        Ok(reply) => reply,
        Err(e) => {
            info!("Request from {} failed: {}", sender.user_id, e);
            Reply::Text(e.user_message())
        }
    }
}

async fn take_pending(
    state: &AppState,
    sender: &Address,
    text: &str,
) -> Option<ohmybot_shared::clarify::ClarifyDialog> {
    if text.trim().is_empty() {
        return None;
    }
    let mut pending = state.pending.lock().await;
    for dialog in pending.expire(state.clock.now(), state.config.clarify_ttl()) {
        info!(
            "Clarification of feedback {} expired unanswered",
            dialog.record_id
        );
    }
    pending.take_for(&sender.user_id)
}

async fn run(state: &AppState, command: Command, sender: &Address) -> BotResult<Reply> {
    debug!("Dispatching {} for {}", command.kind(), sender.user_id);
    match command {
        Command::Submit {
            text,
            hashtags,
            args,
        } => handlers::handle_submit(state, &text, &hashtags, &args, sender).await,
        Command::Retrieve { hashtags, args } => {
            handlers::handle_retrieve(state, &hashtags, &args, sender).await
        }
        Command::Clarify { position } => handlers::handle_clarify(state, position, sender).await,
        Command::Greeting => Ok(handlers::handle_greeting()),
    }
}
