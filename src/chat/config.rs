//! Configuration types for the chat application.
//!
//! This module provides CLI argument parsing via `arrrg` and the resolved configuration the
//! chat loop runs with.  Every flag is optional; with none given the loop asks for a provider
//! and keeps its transcript in `conversation.json`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use arrrg_derive::CommandLine;

use crate::error::{Error, Result};
use crate::provider::ProviderChoice;
use crate::types::DEFAULT_SYSTEM_PROMPT;

/// Where `save` and `load` go unless told otherwise.
pub const DEFAULT_TRANSCRIPT_PATH: &str = "conversation.json";

/// Command-line arguments for the parley-chat tool.
#[derive(CommandLine, Debug, Default, PartialEq, Eq)]
pub struct ChatArgs {
    /// Provider to use; skips the startup menu.
    #[arrrg(optional, "Provider: remote, local, 1, or 2 (default: ask)", "PROVIDER")]
    pub provider: Option<String>,

    /// Model to use for chat.
    #[arrrg(optional, "Model (default: gpt-4o-mini remote, llama3.2 local)", "MODEL")]
    pub model: Option<String>,

    /// File used by the save and load commands.
    #[arrrg(optional, "Transcript file (default: conversation.json)", "PATH")]
    pub transcript: Option<String>,

    /// Instruction placed at the start of every new transcript.
    #[arrrg(optional, "System prompt for new conversations", "PROMPT")]
    pub system: Option<String>,

    /// Request timeout.
    #[arrrg(optional, "Request timeout in seconds (default: none)", "SECONDS")]
    pub timeout_secs: Option<u64>,

    /// Disable ANSI colors and styles.
    #[arrrg(flag, "Disable ANSI colors/styles")]
    pub no_color: bool,

    /// Log every request and response to stderr.
    #[arrrg(flag, "Log requests and responses to stderr as JSON")]
    pub log_requests: bool,
}

/// Configuration for a chat session.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatConfig {
    /// The provider, if chosen before startup.  `None` means ask.
    pub provider: Option<ProviderChoice>,

    /// Model override.  `None` means the provider's default.
    pub model: Option<String>,

    /// Instruction for new transcripts.
    pub system_prompt: String,

    /// File used by the save and load commands.
    pub transcript_path: PathBuf,

    /// Optional request timeout.
    pub timeout: Option<Duration>,

    /// Whether to use ANSI colors and styles in output.
    pub use_color: bool,

    /// Whether to log requests and responses to stderr.
    pub log_requests: bool,
}

impl ChatConfig {
    /// Creates a new ChatConfig with default values.
    pub fn new() -> Self {
        Self {
            provider: None,
            model: None,
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            transcript_path: PathBuf::from(DEFAULT_TRANSCRIPT_PATH),
            timeout: None,
            use_color: true,
            log_requests: false,
        }
    }

    /// Sets the provider.
    pub fn with_provider(mut self, provider: ProviderChoice) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Sets the model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Sets the system prompt.
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    /// Sets the transcript path.
    pub fn with_transcript_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.transcript_path = path.into();
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Disables ANSI color output.
    pub fn without_color(mut self) -> Self {
        self.use_color = false;
        self
    }

    /// Sets whether requests are logged.
    pub fn with_request_logging(mut self, enabled: bool) -> Self {
        self.log_requests = enabled;
        self
    }

    /// The model to send for `provider`: the override if set, else the provider's default.
    pub fn model_for(&self, provider: ProviderChoice) -> String {
        self.model
            .clone()
            .unwrap_or_else(|| provider.default_model().to_string())
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl TryFrom<ChatArgs> for ChatConfig {
    type Error = Error;

    fn try_from(args: ChatArgs) -> Result<Self> {
        let provider = args
            .provider
            .as_deref()
            .map(str::parse::<ProviderChoice>)
            .transpose()?;
        if args.timeout_secs == Some(0) {
            return Err(Error::validation(
                "timeout must be at least one second",
                Some("timeout-secs".to_string()),
            ));
        }
        let defaults = ChatConfig::new();
        Ok(ChatConfig {
            provider,
            model: args.model,
            system_prompt: args.system.unwrap_or(defaults.system_prompt),
            transcript_path: args
                .transcript
                .map(PathBuf::from)
                .unwrap_or(defaults.transcript_path),
            timeout: args.timeout_secs.map(Duration::from_secs),
            use_color: !args.no_color,
            log_requests: args.log_requests,
        })
    }
}

/// Loads `.env` from the working directory or one of its parents.
///
/// Returns `Ok(false)` when there is no such file.
pub fn load_env_file() -> Result<bool> {
    env_file_result(dotenvy::dotenv().map(|_| ()))
}

/// Loads the given env file.  Returns `Ok(false)` when it does not exist.
pub fn load_env_file_from(path: impl AsRef<Path>) -> Result<bool> {
    env_file_result(dotenvy::from_path(path.as_ref()))
}

fn env_file_result(result: std::result::Result<(), dotenvy::Error>) -> Result<bool> {
    match result {
        Ok(()) => Ok(true),
        Err(err) if err.not_found() => Ok(false),
        Err(dotenvy::Error::Io(err)) => Err(Error::io("failed to read .env file", err)),
        Err(err) => Err(Error::validation(
            format!("malformed .env file: {err}"),
            None,
        )),
    }
}
