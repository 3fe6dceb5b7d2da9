//! Command parser.
//!
//! Free text is matched against a single ordered rule table; the first rule
//! that matches decides the command. The argument tail (`;;k=v,...`) is cut
//! off before any rule runs.
//!
//! Rule order:
//! 1. `clarify N`            - clarification by position in the last retrieval
//! 2. `\\rant ...`           - explicit feedback submission
//! 3. `\\ #tag` / `\\retro`  - retrieval
//! 4. `hi`, `hello`, ...     - greeting
//! 5. anything with `#tag`   - feedback submission

use std::collections::BTreeSet;
use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::args::{split_args, Args};
use crate::hashtags;

static CLARIFY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\s*\\{0,2}clarify\s+#?(\d+)\s*$").expect("clarify pattern"));
static RANT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\s*\\{1,2}rant\b\s*").expect("rant pattern"));
static RETRIEVE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\s*\\{1,2}(?:retro\b)?").expect("retrieve pattern"));
static GREETING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*(hi|hello|hey|yo|hiya|howdy)\s*[!.]?\s*$").expect("greeting pattern")
});

/// A recognised chat command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Record feedback. `text` still carries its hashtags.
    Submit {
        text: String,
        hashtags: BTreeSet<String>,
        args: Args,
    },
    /// Fetch feedback for any of `hashtags`.
    Retrieve {
        hashtags: BTreeSet<String>,
        args: Args,
    },
    /// Ask the author of item `position` (1-based) of the last retrieval to elaborate.
    Clarify { position: usize },
    Greeting,
}

/// Command label, shared with external intent recognizers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandKind {
    Submit,
    Retrieve,
    Clarify,
    Greeting,
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Submit => "submit",
            Self::Retrieve => "retrieve",
            Self::Clarify => "clarify",
            Self::Greeting => "greeting",
        };
        write!(f, "{}", s)
    }
}

impl Command {
    pub fn kind(&self) -> CommandKind {
        match self {
            Command::Submit { .. } => CommandKind::Submit,
            Command::Retrieve { .. } => CommandKind::Retrieve,
            Command::Clarify { .. } => CommandKind::Clarify,
            Command::Greeting => CommandKind::Greeting,
        }
    }
}

type Matcher = fn(&str, &Args) -> Option<Command>;

struct Rule {
    name: &'static str,
    matcher: Matcher,
}

const RULES: &[Rule] = &[
    Rule { name: "clarify", matcher: match_clarify },
    Rule { name: "rant", matcher: match_rant },
    Rule { name: "retrieve", matcher: match_retrieve },
    Rule { name: "greeting", matcher: match_greeting },
    Rule { name: "hashtag", matcher: match_hashtag },
];

/// Parse `text` into a command. `None` means unrecognized.
pub fn parse(text: &str) -> Option<Command> {
    parse_with_rule(text).map(|(_, cmd)| cmd)
}

/// Like [`parse`], also returning the name of the rule that matched.
pub fn parse_with_rule(text: &str) -> Option<(&'static str, Command)> {
    let (body, args) = split_args(text);
    RULES
        .iter()
        .find_map(|rule| (rule.matcher)(body, &args).map(|cmd| (rule.name, cmd)))
}

/// Build a command of `kind` from `text`, for recognizers that only return a label.
pub fn from_kind(kind: CommandKind, text: &str) -> Option<Command> {
    let (body, args) = split_args(text);
    match kind {
        CommandKind::Clarify => match_clarify(body, &args).or_else(|| {
            first_number(body).map(|position| Command::Clarify { position })
        }),
        CommandKind::Submit => {
            let text = RANT.replace(body, "").into_owned();
            Some(Command::Submit {
                hashtags: hashtags::extract(&text),
                text,
                args,
            })
        }
        CommandKind::Retrieve => Some(Command::Retrieve {
            hashtags: hashtags::extract(body),
            args,
        }),
        CommandKind::Greeting => Some(Command::Greeting),
    }
}

fn match_clarify(body: &str, _args: &Args) -> Option<Command> {
    let caps = CLARIFY.captures(body)?;
    // Out-of-range digits become position 0, which never resolves.
    let position = caps[1].parse().unwrap_or(0);
    Some(Command::Clarify { position })
}

fn match_rant(body: &str, args: &Args) -> Option<Command> {
    let m = RANT.find(body)?;
    let text = body[m.end()..].to_string();
    Some(Command::Submit {
        hashtags: hashtags::extract(&text),
        text,
        args: args.clone(),
    })
}

fn match_retrieve(body: &str, args: &Args) -> Option<Command> {
    let m = RETRIEVE.find(body)?;
    Some(Command::Retrieve {
        hashtags: hashtags::extract(&body[m.end()..]),
        args: args.clone(),
    })
}

fn match_greeting(body: &str, _args: &Args) -> Option<Command> {
    GREETING.is_match(body).then_some(Command::Greeting)
}

fn match_hashtag(body: &str, args: &Args) -> Option<Command> {
    if !hashtags::has_hashtag(body) {
        return None;
    }
    Some(Command::Submit {
        text: body.to_string(),
        hashtags: hashtags::extract(body),
        args: args.clone(),
    })
}

fn first_number(text: &str) -> Option<usize> {
    text.split(|c: char| !c.is_ascii_digit())
        .find(|s| !s.is_empty())
        .map(|s| s.parse().unwrap_or(0))
}
