//! Per-user session state.
//!
//! Only holds each user's last retrieval, so "clarify N" can be resolved.

use std::collections::HashMap;

use ohmybot_shared::FeedbackRecord;

#[derive(Debug, Default)]
pub struct SessionStore {
    last_views: HashMap<String, Vec<FeedbackRecord>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace `user_id`'s last retrieval.
    pub fn set_last_view(&mut self, user_id: &str, records: Vec<FeedbackRecord>) {
        self.last_views.insert(user_id.to_string(), records);
    }

    /// `user_id`'s last retrieval, empty if they never retrieved anything.
    pub fn last_view(&self, user_id: &str) -> Vec<FeedbackRecord> {
        self.last_views.get(user_id).cloned().unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.last_views.len()
    }

    pub fn is_empty(&self) -> bool {
        self.last_views.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::collections::BTreeSet;

    fn record(id: u64) -> FeedbackRecord {
        FeedbackRecord {
            id,
            text: format!("item {}", id),
            hashtags: BTreeSet::new(),
            submitter: None,
            created_at: Utc::now(),
            responses: vec![],
        }
    }

    #[test]
    fn test_view_is_overwritten() {
        let mut sessions = SessionStore::new();
        sessions.set_last_view("bob", vec![record(1), record(2)]);
        sessions.set_last_view("bob", vec![record(5)]);
        let view = sessions.last_view("bob");
        assert_eq!(view.len(), 1);
        assert_eq!(view[0].id, 5);
        assert!(sessions.last_view("alice").is_empty());
    }
}
