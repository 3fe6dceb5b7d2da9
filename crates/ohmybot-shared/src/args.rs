//! Trailing `;;key=value,key=value` argument tails.

use std::collections::HashMap;

/// Marker that starts the argument tail.
pub const ARG_MARKER: &str = ";;";

/// Parsed argument tail. Keys are lowercased.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Args {
    values: HashMap<String, String>,
}

impl Args {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(&key.to_lowercase()).map(String::as_str)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into().to_lowercase(), value.into());
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether `key` is set to an affirmative value (yes/true/1/on/y).
    pub fn flag(&self, key: &str) -> bool {
        matches!(
            self.get(key).map(|v| v.to_lowercase()).as_deref(),
            Some("yes" | "y" | "true" | "1" | "on")
        )
    }

    /// Parse a bare tail (the part after `;;`).
    pub fn parse_tail(tail: &str) -> Self {
        let mut args = Args::new();
        for pair in tail.split(',') {
            let pair = pair.trim();
            if pair.is_empty() {
                continue;
            }
            let mut parts = pair.split('=');
            let key = parts.next().unwrap_or_default().trim();
            if key.is_empty() {
                continue;
            }
            let value = match (parts.next(), parts.next()) {
                (Some(v), None) => v.trim(),
                // No `=` or more than one: the value is dropped.
                _ => "",
            };
            args.insert(key, value);
        }
        args
    }
}

/// Split `text` at the first `;;`, returning the body and parsed arguments.
pub fn split_args(text: &str) -> (&str, Args) {
    match text.find(ARG_MARKER) {
        Some(idx) => (
            &text[..idx],
            Args::parse_tail(&text[idx + ARG_MARKER.len()..]),
        ),
        None => (text, Args::new()),
    }
}
