//! Chat application module for interactive conversations.
//!
//! This module provides the read loop behind `parley-chat`.  It supports:
//!
//! - Free-text turns sent to a remote or local completion provider
//! - Bare-word commands to save, load, and summarize the transcript
//! - Automatic summarization once the transcript grows past ten messages
//!
//! # Architecture
//!
//! - [`config`]: CLI argument parsing and configuration
//! - [`session`]: transcript operations and the read-loop state machine
//! - [`commands`]: command parsing

mod commands;
mod config;
mod session;

pub use crate::render::{PlainTextRenderer, Renderer};
pub use commands::{ChatCommand, help_text, parse_command};
pub use config::{
    ChatArgs, ChatConfig, DEFAULT_TRANSCRIPT_PATH, load_env_file, load_env_file_from,
};
pub use session::{
    API_ERROR_MARKER, AUTO_SUMMARY_THRESHOLD, ChatSession, LineSource, LoopState, PROMPT,
    Restored, SUMMARY_EXCERPT_CHARS, SUMMARY_PREFIX, SUMMARY_WINDOW, Step,
    create_initial_transcript, persist, restore, restore_or, submit_turn, summarize,
};
