//! Error types for OhMyBot.

use thiserror::Error;

/// Reply sent when a clarification target cannot be resolved.
pub const NOT_A_REAL_MESSAGE: &str = "That's not a real message";

/// Reply sent when no command matched.
pub const DONT_UNDERSTAND: &str = "I don't know what you meant :(";

/// Prefix for failures coming back from an external service.
pub const APOLOGY_PREFIX: &str = "Sorry, something went wrong:";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BotError {
    #[error("no hashtags found")]
    NoHashtagFound,

    #[error("invalid clarification target: {0}")]
    InvalidClarificationTarget(String),

    #[error("transform failed: {0}")]
    ExternalTransformFailure(String),

    #[error("unrecognized command")]
    UnrecognizedCommand,

    #[error("unknown feedback id: {0}")]
    UnknownFeedback(u64),

    #[error("transport error: {0}")]
    Transport(String),
}

impl BotError {
    /// Text shown to the chat user for this failure.
    pub fn user_message(&self) -> String {
        match self {
            BotError::NoHashtagFound => self.to_string(),
            BotError::InvalidClarificationTarget(_) => NOT_A_REAL_MESSAGE.to_string(),
            BotError::ExternalTransformFailure(raw) => format!("{} {}", APOLOGY_PREFIX, raw),
            BotError::UnrecognizedCommand => DONT_UNDERSTAND.to_string(),
            BotError::UnknownFeedback(_) => NOT_A_REAL_MESSAGE.to_string(),
            BotError::Transport(raw) => format!("{} {}", APOLOGY_PREFIX, raw),
        }
    }
}

pub type BotResult<T> = Result<T, BotError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_hashtag_is_verbatim() {
        assert_eq!(BotError::NoHashtagFound.user_message(), "no hashtags found");
    }

    #[test]
    fn test_transform_failure_keeps_raw_message() {
        let err = BotError::ExternalTransformFailure("quota exceeded".to_string());
        assert_eq!(err.user_message(), "Sorry, something went wrong: quota exceeded");
    }

    #[test]
    fn test_clarify_target_is_fixed_refusal() {
        let err = BotError::InvalidClarificationTarget("position 9".to_string());
        assert_eq!(err.user_message(), NOT_A_REAL_MESSAGE);
    }
}
