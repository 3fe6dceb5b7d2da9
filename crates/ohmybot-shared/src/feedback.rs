//! Feedback store.
//!
//! Records are append-only: ids are assigned in insertion order and never
//! change, and a record's response list only grows. Retrieval never removes
//! anything.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::address::Address;
use crate::clock::{Clock, SystemClock};
use crate::error::{BotError, BotResult};
use crate::hashtags;

pub type FeedbackId = u64;

/// One piece of anonymous feedback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackRecord {
    pub id: FeedbackId,
    /// Text with hashtag tokens removed.
    pub text: String,
    /// Lowercased tags, with leading `#`.
    pub hashtags: BTreeSet<String>,
    /// Where to reach the author for a clarification, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submitter: Option<Address>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub responses: Vec<String>,
}

impl FeedbackRecord {
    pub fn matches_any(&self, tags: &BTreeSet<String>) -> bool {
        !self.hashtags.is_disjoint(tags)
    }
}

/// Storage seam for feedback. Handlers only see this trait.
pub trait FeedbackStore: Send + Sync {
    /// Store `text` under `hashtags`. Fails with `NoHashtagFound` when the set
    /// is empty, in which case nothing is written.
    fn submit(
        &mut self,
        text: &str,
        hashtags: &BTreeSet<String>,
        submitter: Option<Address>,
    ) -> BotResult<FeedbackId>;

    /// Records sharing a tag with `hashtags` and no older than `lookback`
    /// (`None` = unbounded), oldest first.
    fn query(&self, hashtags: &BTreeSet<String>, lookback: Option<Duration>) -> Vec<FeedbackRecord>;

    fn append_response(&mut self, id: FeedbackId, text: &str) -> BotResult<()>;

    fn get(&self, id: FeedbackId) -> Option<FeedbackRecord>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Process-local store backed by a `Vec`.
pub struct InMemoryFeedbackStore {
    records: Vec<FeedbackRecord>,
    next_id: FeedbackId,
    clock: Arc<dyn Clock>,
}

impl InMemoryFeedbackStore {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            records: Vec::new(),
            next_id: 1,
            clock,
        }
    }

    pub fn records(&self) -> &[FeedbackRecord] {
        &self.records
    }
}

impl Default for InMemoryFeedbackStore {
    fn default() -> Self {
        Self::new()
    }
}

impl FeedbackStore for InMemoryFeedbackStore {
    fn submit(
        &mut self,
        text: &str,
        tags: &BTreeSet<String>,
        submitter: Option<Address>,
    ) -> BotResult<FeedbackId> {
        let tags: BTreeSet<String> = tags
            .iter()
            .map(|t| hashtags::normalize(t))
            .filter(|t| t.len() > 1)
            .collect();
        if tags.is_empty() {
            return Err(BotError::NoHashtagFound);
        }

        let id = self.next_id;
        self.next_id += 1;
        self.records.push(FeedbackRecord {
            id,
            text: hashtags::strip(text),
            hashtags: tags,
            submitter,
            created_at: self.clock.now(),
            responses: Vec::new(),
        });
        Ok(id)
    }

    fn query(&self, tags: &BTreeSet<String>, lookback: Option<Duration>) -> Vec<FeedbackRecord> {
        let tags: BTreeSet<String> = tags.iter().map(|t| hashtags::normalize(t)).collect();
        let now = self.clock.now();
        let mut found: Vec<FeedbackRecord> = self
            .records
            .iter()
            .filter(|r| r.matches_any(&tags))
            .filter(|r| lookback.map_or(true, |window| now - r.created_at <= window))
            .cloned()
            .collect();
        found.sort_by_key(|r| (r.created_at, r.id));
        found
    }

    fn append_response(&mut self, id: FeedbackId, text: &str) -> BotResult<()> {
        let record = self
            .records
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or(BotError::UnknownFeedback(id))?;
        record.responses.push(text.to_string());
        Ok(())
    }

    fn get(&self, id: FeedbackId) -> Option<FeedbackRecord> {
        self.records.iter().find(|r| r.id == id).cloned()
    }

    fn len(&self) -> usize {
        self.records.len()
    }
}
