//! Command parsing for the chat loop.
//!
//! A handful of bare words control the session instead of being sent to the provider.  Matching
//! is case-insensitive and ignores surrounding whitespace, but the word must be the whole line:
//! "save me a seat" is an ordinary message.

/// A parsed chat command.
///
/// These commands control the chat session and are never sent to the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatCommand {
    /// Write the transcript to the configured file.
    Save,

    /// Replace the transcript with the configured file's contents.
    Load,

    /// Summarize the transcript now.
    Summary,

    /// Exit the chat application.
    Quit,
}

/// Parses user input for commands.
///
/// Returns `Some(ChatCommand)` if the input is a command, or `None` if it should be treated as
/// a regular message.
///
/// # Examples
///
/// ```
/// # use parley::chat::{ChatCommand, parse_command};
/// assert_eq!(parse_command("QUIT"), Some(ChatCommand::Quit));
/// assert_eq!(parse_command("  save "), Some(ChatCommand::Save));
/// assert!(parse_command("Hello there").is_none());
/// ```
pub fn parse_command(input: &str) -> Option<ChatCommand> {
    match input.trim().to_lowercase().as_str() {
        "save" => Some(ChatCommand::Save),
        "load" => Some(ChatCommand::Load),
        "summary" => Some(ChatCommand::Summary),
        "quit" => Some(ChatCommand::Quit),
        _ => None,
    }
}

/// Returns help text describing available commands.
pub fn help_text() -> &'static str {
    r#"Available commands:
- 'save': Save conversation
- 'load': Load conversation
- 'summary': Summarize conversation
- 'quit': Quit conversation"#
}
