//! OhMyBot daemon library - exposes modules for testing.

pub mod anonymizer;
pub mod config;
pub mod connector;
pub mod dispatch;
pub mod handlers;
pub mod recognizer;
pub mod routes;
pub mod scheduler;
pub mod server;
pub mod session;
pub mod state;
pub mod translator;
