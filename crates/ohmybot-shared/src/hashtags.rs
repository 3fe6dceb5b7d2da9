//! Hashtag extraction.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeSet;

static HASHTAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"#[\w-]+").expect("hashtag pattern"));

/// Lowercased hashtags in `text`, including the leading `#`.
pub fn extract(text: &str) -> BTreeSet<String> {
    HASHTAG
        .find_iter(text)
        .map(|m| m.as_str().to_lowercase())
        .collect()
}

/// True when `text` carries at least one hashtag token.
pub fn has_hashtag(text: &str) -> bool {
    HASHTAG.is_match(text)
}

/// Remove every hashtag token, leaving surrounding whitespace alone.
pub fn strip(text: &str) -> String {
    HASHTAG.replace_all(text, "").into_owned()
}

/// Normalise a caller-supplied tag: lowercase, with a leading `#`.
pub fn normalize(tag: &str) -> String {
    let tag = tag.trim().to_lowercase();
    if tag.starts_with('#') {
        tag
    } else {
        format!("#{}", tag)
    }
}
