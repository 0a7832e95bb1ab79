//! Chat application module for interactive travel conversations.
//!
//! This module provides a streaming REPL chat interface built on top of
//! the polaris client library. It supports:
//!
//! - Streaming answers with real-time token display
//! - A pipeline progress indicator while the answer is prepared
//! - Slash commands for room, bookmark, and session control
//! - Optimistic local message history per room
//!
//! # Architecture
//!
//! The module is organized into several components:
//!
//! - [`config`]: CLI argument parsing and configuration
//! - [`session`]: Core chat session management and streaming
//! - [`turn`]: The per-question state machine
//! - [`commands`]: Slash command parsing and handling
//! - [`render`]: Terminal output rendering

mod commands;
mod config;
mod render;
mod session;
mod turn;

pub use commands::{ChatCommand, help_text, parse_command};
pub use config::{ChatArgs, ChatConfig};
pub use render::{PlainTextRenderer, Renderer};
pub use session::{ChatSession, SessionStats};
pub use turn::{Applied, ERROR_NOTICE, Finalized, PipelineProgress, Turn, TurnPhase};
