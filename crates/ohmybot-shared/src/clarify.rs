//! Clarification sub-dialog.
//!
//! A user who retrieved feedback can ask the author of item N to elaborate.
//! The author is messaged in their own conversation and the dialog waits in
//! `AwaitingTargetText` until that author's next message, which is appended to
//! the record's responses and moves the dialog to `Complete`. Requests the
//! author never answers expire, so a much later message is not mistaken for
//! an answer.

use std::collections::{HashMap, VecDeque};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::address::Address;
use crate::error::{BotError, BotResult};
use crate::feedback::{FeedbackId, FeedbackRecord, FeedbackStore};

/// Reply to the author once their clarification is recorded.
pub const CLARIFY_THANKS: &str = "Thanks for clarifying!";

/// Reply to the requester when the follow-up has been scheduled.
pub const CLARIFY_SCHEDULED: &str = "I've asked them to clarify. Check back later!";

/// Note to the requester once the author answered.
pub const CLARIFY_ANSWERED: &str =
    "Someone answered your clarification request. Ask for that hashtag again to read it.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DialogState {
    AwaitingTargetText,
    Complete,
}

/// Resolve a 1-based `position` in a user's last retrieval.
///
/// Fails when the position is out of range or the record has no author address.
pub fn resolve_target(view: &[FeedbackRecord], position: usize) -> BotResult<&FeedbackRecord> {
    let record = position
        .checked_sub(1)
        .and_then(|idx| view.get(idx))
        .ok_or_else(|| {
            BotError::InvalidClarificationTarget(format!(
                "position {} not in last retrieval of {}",
                position,
                view.len()
            ))
        })?;
    if record.submitter.is_none() {
        return Err(BotError::InvalidClarificationTarget(format!(
            "feedback {} has no known author",
            record.id
        )));
    }
    Ok(record)
}

/// Question sent to the author.
pub fn prompt_text(original: &str) -> String {
    format!(
        "Someone wants to know more about something you said:\n> {}\nCould you clarify? Your next message will be added as a reply.",
        original.trim()
    )
}

/// One clarification request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClarifyDialog {
    pub record_id: FeedbackId,
    /// The author being asked.
    pub target: Address,
    /// Who asked, notified when the answer arrives.
    pub requester: Option<Address>,
    pub state: DialogState,
    pub opened_at: DateTime<Utc>,
}

impl ClarifyDialog {
    pub fn open(
        record: &FeedbackRecord,
        requester: Option<Address>,
        opened_at: DateTime<Utc>,
    ) -> BotResult<Self> {
        let target = record.submitter.clone().ok_or_else(|| {
            BotError::InvalidClarificationTarget(format!(
                "feedback {} has no known author",
                record.id
            ))
        })?;
        Ok(Self {
            record_id: record.id,
            target,
            requester,
            state: DialogState::AwaitingTargetText,
            opened_at,
        })
    }

    /// Whether the dialog has outlived `ttl` at `now`. `None` never expires.
    pub fn is_expired(&self, now: DateTime<Utc>, ttl: Option<Duration>) -> bool {
        match ttl {
            Some(ttl) => now.signed_duration_since(self.opened_at) > ttl,
            None => false,
        }
    }

    /// Record the author's `reply` and finish the dialog.
    pub fn complete(&mut self, reply: &str, store: &mut dyn FeedbackStore) -> BotResult<()> {
        if self.state == DialogState::Complete {
            return Ok(());
        }
        store.append_response(self.record_id, reply)?;
        self.state = DialogState::Complete;
        Ok(())
    }
}

/// Dialogs waiting on an author's reply, keyed by the author's user id.
#[derive(Debug, Default)]
pub struct PendingClarifications {
    by_user: HashMap<String, VecDeque<ClarifyDialog>>,
}

impl PendingClarifications {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, dialog: ClarifyDialog) {
        self.by_user
            .entry(dialog.target.user_id.clone())
            .or_default()
            .push_back(dialog);
    }

    /// Oldest dialog waiting on `user_id`, removed from the queue.
    pub fn take_for(&mut self, user_id: &str) -> Option<ClarifyDialog> {
        let queue = self.by_user.get_mut(user_id)?;
        let dialog = queue.pop_front();
        if queue.is_empty() {
            self.by_user.remove(user_id);
        }
        dialog
    }

    /// Remove every dialog older than `ttl`, returning what was dropped.
    pub fn expire(&mut self, now: DateTime<Utc>, ttl: Option<Duration>) -> Vec<ClarifyDialog> {
        if ttl.is_none() {
            return Vec::new();
        }
        let mut expired = Vec::new();
        self.by_user.retain(|_, queue| {
            let (stale, live): (VecDeque<_>, VecDeque<_>) =
                queue.drain(..).partition(|d| d.is_expired(now, ttl));
            expired.extend(stale);
            *queue = live;
            !queue.is_empty()
        });
        expired
    }

    /// Drop the dialog for `record_id` waiting on `user_id`, if any.
    pub fn cancel(&mut self, user_id: &str, record_id: FeedbackId) -> Option<ClarifyDialog> {
        let queue = self.by_user.get_mut(user_id)?;
        let idx = queue.iter().position(|d| d.record_id == record_id)?;
        let dialog = queue.remove(idx);
        if queue.is_empty() {
            self.by_user.remove(user_id);
        }
        dialog
    }

    pub fn is_awaiting(&self, user_id: &str) -> bool {
        self.by_user.contains_key(user_id)
    }

    pub fn pending_for(&self, user_id: &str) -> usize {
        self.by_user.get(user_id).map_or(0, VecDeque::len)
    }

    pub fn len(&self) -> usize {
        self.by_user.values().map(VecDeque::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_user.is_empty()
    }
}
