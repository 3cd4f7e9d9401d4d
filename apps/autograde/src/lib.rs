//! # Autograde
//!
//! Host-side shell around `autograde-core`: an in-memory sandbox world,
//! the chat/console command layer, a scenario runner, the CLI and the HTTP
//! event bridge.

pub mod api;
pub mod chat;
pub mod cli;
pub mod error;
pub mod lang;
pub mod runtime;
pub mod sandbox;
pub mod scenario;
pub mod settings;
