//! Reply rendering.

use crate::feedback::FeedbackRecord;

pub const THANKS: &str = "Thanks bud!";
pub const NOTHING_TO_REPORT: &str = "Nothing to report!";
pub const RECORDS_HEADER: &str = "Here's what some people said...";
pub const GREETING: &str = "Hi! I'm OhMyBot. Tell me how it's going and add a #hashtag, \
e.g. \"standup ran long again #meetings\". Type \\\\ #meetings to see what people said, \
and \"clarify 2\" to ask the author of item 2 to elaborate.";

/// What a handler hands back to the chat user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Acknowledgement of a stored submission.
    Ack,
    Text(String),
    Records(Vec<FeedbackRecord>),
}

impl Reply {
    pub fn text(text: impl Into<String>) -> Self {
        Reply::Text(text.into())
    }

    pub fn render(&self) -> String {
        match self {
            Reply::Ack => THANKS.to_string(),
            Reply::Text(text) => text.clone(),
            Reply::Records(records) => render_records(records),
        }
    }
}

/// Numbered list; responses are nested under their record.
pub fn render_records(records: &[FeedbackRecord]) -> String {
    if records.is_empty() {
        return NOTHING_TO_REPORT.to_string();
    }
    let mut lines = vec![RECORDS_HEADER.to_string()];
    for (i, record) in records.iter().enumerate() {
        lines.push(format!("{}. {}", i + 1, record.text));
        for response in &record.responses {
            lines.push(format!("    > {}", response));
        }
    }
    lines.join("\n")
}
