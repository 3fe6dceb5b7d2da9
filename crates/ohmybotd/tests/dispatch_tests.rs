//! End-to-end dispatch tests.
//!
//! Runs whole conversations through `dispatch::handle_message` with an
//! in-memory outbox, a manual clock and a fake translator.

use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use async_trait::async_trait;
use ohmybot_shared::address::{ChannelAccount, ConversationAccount};
use ohmybot_shared::clarify::{CLARIFY_ANSWERED, CLARIFY_SCHEDULED, CLARIFY_THANKS};
use ohmybot_shared::clock::ManualClock;
use ohmybot_shared::error::{DONT_UNDERSTAND, NOT_A_REAL_MESSAGE};
use ohmybot_shared::render::{GREETING, NOTHING_TO_REPORT, THANKS};
use ohmybot_shared::{Activity, BotError, BotResult, InMemoryFeedbackStore};
use ohmybotd::config::Config;
use ohmybotd::connector::Outbox;
use ohmybotd::dispatch::handle_message;
use ohmybotd::recognizer::RegexRecognizer;
use ohmybotd::state::{AppState, Parts};
use ohmybotd::translator::TextTransform;

/// Appends the target locale, or fails every call when `fail` is set.
#[derive(Default)]
struct FakeTranslator {
    calls: StdMutex<Vec<(String, String)>>,
    fail: bool,
}

#[async_trait]
impl TextTransform for FakeTranslator {
    async fn translate(&self, text: &str, from: &str, to: &str) -> BotResult<String> {
        self.calls
            .lock()
            .unwrap()
            .push((from.to_string(), to.to_string()));
        if self.fail {
            return Err(BotError::ExternalTransformFailure("429 Too Many Requests".to_string()));
        }
        Ok(format!("{}~{}", text, to))
    }
}

struct Harness {
    state: AppState,
    outbox: Arc<Outbox>,
    clock: ManualClock,
    translator: Arc<FakeTranslator>,
}

fn harness_with(translator: FakeTranslator) -> Harness {
    let mut config = Config::default();
    config.clarify.delay_ms = 0;
    config.retrieval.lookback_secs = 60;
    config.clarify.ttl_secs = 3600;

    let clock = ManualClock::default();
    let outbox = Arc::new(Outbox::new());
    let translator = Arc::new(translator);
    let state = AppState::with_parts(
        config,
        Parts {
            store: Box::new(InMemoryFeedbackStore::with_clock(Arc::new(clock.clone()))),
            transport: outbox.clone(),
            outbox: Some(outbox.clone()),
            recognizer: Arc::new(RegexRecognizer),
            transform: translator.clone(),
            clock: Arc::new(clock.clone()),
        },
    );
    Harness {
        state,
        outbox,
        clock,
        translator,
    }
}

fn harness() -> Harness {
    harness_with(FakeTranslator::default())
}

fn message(user: &str, text: &str) -> Activity {
    Activity {
        kind: "message".to_string(),
        text: Some(text.to_string()),
        from: ChannelAccount {
            id: user.to_string(),
            name: None,
        },
        conversation: ConversationAccount {
            id: format!("conv-{}", user),
            name: None,
        },
        channel_id: "console".to_string(),
        ..Default::default()
    }
}

impl Harness {
    async fn say(&self, user: &str, text: &str) -> String {
        handle_message(&self.state, &message(user, text)).await.render()
    }

    /// Wait for the scheduler to put something in `user`'s outbox.
    async fn wait_for_outbox(&self, user: &str) -> Vec<String> {
        for _ in 0..200 {
            let queued = self.outbox.peek(user).await;
            if !queued.is_empty() {
                return self.outbox.drain(user).await;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        Vec::new()
    }

    fn translate_calls(&self) -> usize {
        self.translator.calls.lock().unwrap().len()
    }
}

#[tokio::test]
async fn test_submit_then_retrieve_with_bypass() {
    let h = harness();
    assert_eq!(h.say("alice", "Great day #worklife").await, THANKS);

    let reply = h.say("bob", "\\\\ #worklife ;;bypass=yes").await;
    assert_eq!(reply, "Here's what some people said...\n1. Great day ");
    assert_eq!(h.translate_calls(), 0);
}

#[tokio::test]
async fn test_retrieve_anonymizes_by_default() {
    let h = harness();
    h.say("alice", "one #x").await;
    h.say("alice", "two #x").await;

    let reply = h.say("bob", "\\\\retro #x").await;
    assert_eq!(
        reply,
        "Here's what some people said...\n1. one ~ja~en\n2. two ~ja~en"
    );
    assert_eq!(h.translate_calls(), 4);

    let calls = h.translator.calls.lock().unwrap().clone();
    assert_eq!(calls[0], ("en".to_string(), "ja".to_string()));
    assert_eq!(calls[1], ("ja".to_string(), "en".to_string()));
}

#[tokio::test]
async fn test_transform_failure_fails_whole_retrieval() {
    let h = harness_with(FakeTranslator {
        fail: true,
        ..Default::default()
    });
    h.say("alice", "one #x").await;

    let reply = h.say("bob", "\\\\ #x").await;
    assert_eq!(reply, "Sorry, something went wrong: 429 Too Many Requests");
    assert!(h.state.sessions.read().await.last_view("bob").is_empty());
}

#[tokio::test]
async fn test_submission_without_hashtag() {
    let h = harness();
    assert_eq!(h.say("alice", "\\\\rant nothing tagged").await, "no hashtags found");
    assert_eq!(h.state.store.read().await.len(), 0);
}

#[tokio::test]
async fn test_retrieval_without_hashtag() {
    let h = harness();
    assert_eq!(h.say("bob", "\\\\retro").await, "no hashtags found");
}

#[tokio::test]
async fn test_unrecognized_and_greeting() {
    let h = harness();
    assert_eq!(h.say("bob", "what is this").await, DONT_UNDERSTAND);
    assert_eq!(h.say("bob", "hello!").await, GREETING);
}

#[tokio::test]
async fn test_lookback_window() {
    let h = harness();
    h.say("alice", "old news #x").await;
    h.clock.advance(chrono::Duration::seconds(61));

    assert_eq!(h.say("bob", "\\\\ #x ;;bypass=yes").await, NOTHING_TO_REPORT);
    assert_eq!(
        h.say("bob", "\\\\ #x ;;bypass=yes,window=all").await,
        "Here's what some people said...\n1. old news "
    );
}

#[tokio::test]
async fn test_out_of_range_window_uses_configured_lookback() {
    let h = harness();
    h.say("alice", "fresh #x").await;
    h.clock.advance(chrono::Duration::seconds(30));

    assert_eq!(
        h.say("bob", "\\\\ #x ;;bypass=yes,window=99999999999999999").await,
        "Here's what some people said...\n1. fresh "
    );
    h.clock.advance(chrono::Duration::seconds(31));
    assert_eq!(
        h.say("bob", "\\\\ #x ;;bypass=yes,window=99999999999999999").await,
        NOTHING_TO_REPORT
    );
}

#[tokio::test]
async fn test_full_clarification_dialog() {
    let h = harness();
    h.say("alice", "the release process #ops").await;
    h.say("dave", "pager fatigue #ops").await;
    h.say("bob", "\\\\ #ops ;;bypass=yes").await;

    assert_eq!(h.say("bob", "clarify 1").await, CLARIFY_SCHEDULED);

    let prompt = h.wait_for_outbox("alice").await;
    assert_eq!(prompt.len(), 1);
    assert!(prompt[0].contains("> the release process"));
    assert!(h.outbox.peek("dave").await.is_empty());

    assert_eq!(h.say("alice", "it takes three approvals").await, CLARIFY_THANKS);

    let store = h.state.store.read().await;
    assert_eq!(store.get(1).unwrap().responses, vec!["it takes three approvals"]);
    assert!(store.get(2).unwrap().responses.is_empty());
    drop(store);

    assert_eq!(h.outbox.drain("bob").await, vec![CLARIFY_ANSWERED]);

    // The dialog is complete, so alice's next message is a normal command again.
    assert_eq!(h.say("alice", "hi").await, GREETING);

    let reply = h.say("bob", "\\\\ #ops ;;bypass=yes").await;
    assert_eq!(
        reply,
        "Here's what some people said...\n1. the release process \n    > it takes three approvals\n2. pager fatigue "
    );
}

#[tokio::test]
async fn test_clarify_prompt_uses_original_text() {
    let h = harness();
    h.say("alice", "secret sauce #x").await;
    h.say("bob", "\\\\ #x").await;
    h.say("bob", "clarify 1").await;

    let prompt = h.wait_for_outbox("alice").await;
    assert!(prompt[0].contains("> secret sauce"));
    assert!(!prompt[0].contains("~ja"));
}

#[tokio::test]
async fn test_clarify_out_of_range() {
    let h = harness();
    h.say("alice", "a #x").await;
    h.say("bob", "\\\\ #x ;;bypass=yes").await;

    assert_eq!(h.say("bob", "clarify 2").await, NOT_A_REAL_MESSAGE);
    assert_eq!(h.say("bob", "clarify 0").await, NOT_A_REAL_MESSAGE);
    assert!(h.state.pending.lock().await.is_empty());
    assert!(h.state.store.read().await.get(1).unwrap().responses.is_empty());
}

#[tokio::test]
async fn test_clarify_without_retrieval() {
    let h = harness();
    h.say("alice", "a #x").await;
    assert_eq!(h.say("bob", "clarify 1").await, NOT_A_REAL_MESSAGE);
}

#[tokio::test]
async fn test_clarify_noreply_record() {
    let h = harness();
    h.say("alice", "keep me out of it #x ;;noreply=yes").await;
    h.say("bob", "\\\\ #x ;;bypass=yes").await;

    assert_eq!(h.say("bob", "clarify 1").await, NOT_A_REAL_MESSAGE);
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(h.outbox.peek("alice").await.is_empty());
    assert!(h.state.pending.lock().await.is_empty());
}

#[tokio::test]
async fn test_unanswered_clarification_expires() {
    let h = harness();
    h.say("alice", "flaky tests #ci").await;
    h.say("bob", "\\\\ #ci ;;bypass=yes").await;
    assert_eq!(h.say("bob", "clarify 1").await, CLARIFY_SCHEDULED);
    assert_eq!(h.wait_for_outbox("alice").await.len(), 1);
    assert!(h.state.pending.lock().await.is_awaiting("alice"));

    h.clock.advance(chrono::Duration::hours(2));

    // Long after the request, alice's message is a command again.
    let reply = h.say("alice", "\\\\ #ci ;;bypass=yes,window=all").await;
    assert_eq!(reply, "Here's what some people said...\n1. flaky tests ");
    assert!(h.state.pending.lock().await.is_empty());
    assert!(h.state.store.read().await.get(1).unwrap().responses.is_empty());
    assert!(h.outbox.peek("bob").await.is_empty());
}
