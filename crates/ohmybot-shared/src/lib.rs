//! Shared types and logic for OhMyBot components.
//!
//! Everything here is transport-free: parsing, the feedback store, the
//! clarification dialog and reply rendering.

pub mod address;
pub mod args;
pub mod clarify;
pub mod clock;
pub mod command;
pub mod error;
pub mod feedback;
pub mod hashtags;
pub mod render;
pub mod rpc;

pub use address::{Activity, Address};
pub use args::Args;
pub use command::{Command, CommandKind};
pub use error::{BotError, BotResult};
pub use feedback::{FeedbackId, FeedbackRecord, FeedbackStore, InMemoryFeedbackStore};
pub use render::Reply;

/// Version shared by every binary in the workspace.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
