//! Deferred delivery of clarification prompts.
//!
//! Handlers enqueue a `FollowUp` and return right away; the scheduler task
//! waits out the configured delay, registers the dialog as pending and sends
//! the prompt to the author's conversation.

use std::sync::Arc;
use std::time::Duration;

use ohmybot_shared::clarify::{ClarifyDialog, PendingClarifications};
use ohmybot_shared::{BotError, BotResult};
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::connector::Transport;

/// A prompt to deliver to a feedback author.
#[derive(Debug, Clone)]
pub struct FollowUp {
    pub dialog: ClarifyDialog,
    pub prompt: String,
}

/// Handle used by request handlers to schedule follow-ups.
#[derive(Debug, Clone)]
pub struct FollowUpQueue {
    tx: mpsc::UnboundedSender<FollowUp>,
}

impl FollowUpQueue {
    pub fn schedule(&self, followup: FollowUp) -> BotResult<()> {
        self.tx
            .send(followup)
            .map_err(|_| BotError::Transport("follow-up scheduler is not running".to_string()))
    }
}

/// Start the scheduler task.
pub fn spawn(
    transport: Arc<dyn Transport>,
    pending: Arc<Mutex<PendingClarifications>>,
    delay: Duration,
) -> (FollowUpQueue, JoinHandle<()>) {
    let (tx, mut rx) = mpsc::unbounded_channel::<FollowUp>();
    let handle = tokio::spawn(async move {
        while let Some(followup) = rx.recv().await {
            let transport = Arc::clone(&transport);
            let pending = Arc::clone(&pending);
            tokio::spawn(async move {
                let record_id = followup.dialog.record_id;
                if let Err(e) = deliver(followup, transport.as_ref(), &pending, delay).await {
                    error!("Clarification for feedback {} not delivered: {}", record_id, e);
                }
            });
        }
        info!("Follow-up scheduler stopped");
    });
    (FollowUpQueue { tx }, handle)
}

/// Deliver one follow-up after `delay`.
///
/// The dialog is pending before the prompt goes out and is cancelled again
/// if sending fails.
pub async fn deliver(
    followup: FollowUp,
    transport: &dyn Transport,
    pending: &Mutex<PendingClarifications>,
    delay: Duration,
) -> BotResult<()> {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }

    let target = followup.dialog.target.clone();
    let record_id = followup.dialog.record_id;
    pending.lock().await.register(followup.dialog);

    if let Err(e) = transport.send_text(&target, &followup.prompt).await {
        pending.lock().await.cancel(&target.user_id, record_id);
        return Err(e);
    }
    info!("Asked author of feedback {} to clarify", record_id);
    Ok(())
}
