//! Anonymizes retrieved feedback by bouncing its text through another language.
//!
//! Each record costs two transform calls (source -> pivot -> source). Any
//! failure aborts the whole batch; there is no partial result.

use std::sync::Arc;

use ohmybot_shared::{BotResult, FeedbackRecord};
use tracing::debug;

use crate::translator::TextTransform;

#[derive(Clone)]
pub struct Anonymizer {
    transform: Arc<dyn TextTransform>,
    source_locale: String,
    pivot_locale: String,
}

impl Anonymizer {
    pub fn new(
        transform: Arc<dyn TextTransform>,
        source_locale: impl Into<String>,
        pivot_locale: impl Into<String>,
    ) -> Self {
        Self {
            transform,
            source_locale: source_locale.into(),
            pivot_locale: pivot_locale.into(),
        }
    }

    /// Round-trip one piece of text.
    pub async fn obscure(&self, text: &str) -> BotResult<String> {
        let pivot = self
            .transform
            .translate(text, &self.source_locale, &self.pivot_locale)
            .await?;
        self.transform
            .translate(&pivot, &self.pivot_locale, &self.source_locale)
            .await
    }

    /// Rewrite the text of every record. Ids, tags and responses are kept.
    pub async fn anonymize(&self, records: Vec<FeedbackRecord>) -> BotResult<Vec<FeedbackRecord>> {
        let mut out = Vec::with_capacity(records.len());
        for mut record in records {
            record.text = self.obscure(&record.text).await?;
            debug!("Anonymized feedback {}", record.id);
            out.push(record);
        }
        Ok(out)
    }
}
