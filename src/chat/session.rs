//! Core chat session management.
//!
//! The free functions in this module are the conversation operations: starting a transcript,
//! submitting a turn, summarizing, and saving or restoring a transcript file.  [`ChatSession`]
//! owns one transcript and drives those operations from a read loop.

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::Path;

use serde_json::{from_reader, to_writer_pretty};

use crate::chat::commands::{ChatCommand, parse_command};
use crate::chat::config::ChatConfig;
use crate::error::{Error, Result};
use crate::observability::{
    SESSION_LOADS, SESSION_SAVES, SESSION_SUMMARIES, SESSION_TURN_ERRORS, SESSION_TURNS,
};
use crate::provider::CompletionProvider;
use crate::render::Renderer;
use crate::types::{Message, Transcript};

/// Prefix of the text returned by [`submit_turn`] when the provider fails.
pub const API_ERROR_MARKER: &str = "Error with API:";

/// Opening text of the synthetic message produced by [`summarize`].
pub const SUMMARY_PREFIX: &str = "Previous conversation summarized:";

/// How many trailing messages [`summarize`] keeps.
pub const SUMMARY_WINDOW: usize = 5;

/// How many characters of each kept message go into the summary text.
pub const SUMMARY_EXCERPT_CHARS: usize = 50;

/// The loop summarizes after a turn once the transcript holds more messages than this.
pub const AUTO_SUMMARY_THRESHOLD: usize = 10;

/// Prompt shown when waiting for input.
pub const PROMPT: &str = "You: ";

const SUMMARY_SEPARATOR: &str = "   ";
const EXCERPT_SUFFIX: &str = "...";

/// A fresh transcript holding only the default system instruction.
pub fn create_initial_transcript() -> Transcript {
    Transcript::default()
}

/// Sends `text` as a user turn and returns the assistant's reply.
///
/// The user message is appended before the provider is called.  On success the reply is
/// appended as an assistant message and returned.  On failure nothing else is appended and the
/// returned text starts with [`API_ERROR_MARKER`]; the user message stays in the transcript.
pub async fn submit_turn<P: CompletionProvider + ?Sized>(
    text: &str,
    transcript: &mut Transcript,
    provider: &P,
    model_name: &str,
) -> String {
    SESSION_TURNS.click();
    transcript.push(Message::user(text));
    match provider.complete(model_name, transcript.messages()).await {
        Ok(reply) => {
            transcript.push(Message::assistant(reply.clone()));
            reply
        }
        Err(err) => {
            SESSION_TURN_ERRORS.click();
            format!("{API_ERROR_MARKER} {err}")
        }
    }
}

/// Collapses the transcript to its last [`SUMMARY_WINDOW`] messages behind a synthetic system
/// message.
///
/// The synthetic message is [`SUMMARY_PREFIX`] followed by the first
/// [`SUMMARY_EXCERPT_CHARS`] characters of each kept message, each ending in `...`, joined by
/// three spaces.  The kept messages follow it unchanged, so their text appears twice.
pub fn summarize(transcript: &Transcript) -> Transcript {
    SESSION_SUMMARIES.click();
    let kept = transcript.tail(SUMMARY_WINDOW);
    let excerpts = kept
        .iter()
        .map(|m| format!("{}{EXCERPT_SUFFIX}", excerpt(&m.content)))
        .collect::<Vec<_>>()
        .join(SUMMARY_SEPARATOR);
    let mut summarized = Transcript::with_system_prompt(format!("{SUMMARY_PREFIX}{excerpts}"));
    for message in kept {
        summarized.push(message.clone());
    }
    summarized
}

fn excerpt(content: &str) -> &str {
    match content.char_indices().nth(SUMMARY_EXCERPT_CHARS) {
        Some((idx, _)) => &content[..idx],
        None => content,
    }
}

/// Writes the transcript to `destination` as a JSON array of `{role, content}` records,
/// replacing whatever was there.  The write is not atomic.
pub fn persist(transcript: &Transcript, destination: impl AsRef<Path>) -> Result<()> {
    SESSION_SAVES.click();
    let file = File::create(destination.as_ref())
        .map_err(|err| Error::io("failed to create transcript file", err))?;
    let mut writer = BufWriter::new(file);
    to_writer_pretty(&mut writer, transcript).map_err(|err| {
        Error::serialization("failed to serialize transcript", Some(Box::new(err)))
    })?;
    writer
        .flush()
        .map_err(|err| Error::io("failed to write transcript file", err))
}

/// The result of reading a transcript file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Restored {
    /// The file existed and decoded.
    Loaded(Transcript),
    /// The file did not exist; this holds a fresh initial transcript.
    Missing(Transcript),
}

impl Restored {
    /// The transcript, however it was obtained.
    pub fn into_transcript(self) -> Transcript {
        match self {
            Restored::Loaded(transcript) | Restored::Missing(transcript) => transcript,
        }
    }

    /// Returns true if the file did not exist.
    pub fn is_missing(&self) -> bool {
        matches!(self, Restored::Missing(_))
    }
}

/// Reads a transcript written by [`persist`].
///
/// A missing file is not an error: it yields [`Restored::Missing`] holding
/// [`create_initial_transcript`].
///
/// # Errors
///
/// Fails with a serialization error if the file is not a JSON array of messages, and with a
/// validation error if the array is empty or does not start with a system message.
pub fn restore(source: impl AsRef<Path>) -> Result<Restored> {
    restore_or(source, create_initial_transcript)
}

/// Like [`restore`], but builds the transcript for a missing file with `initial`.
pub fn restore_or<F>(source: impl AsRef<Path>, initial: F) -> Result<Restored>
where
    F: FnOnce() -> Transcript,
{
    SESSION_LOADS.click();
    let file = match File::open(source.as_ref()) {
        Ok(file) => file,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            return Ok(Restored::Missing(initial()));
        }
        Err(err) => return Err(Error::io("failed to open transcript file", err)),
    };
    let reader = BufReader::new(file);
    let messages: Vec<Message> = from_reader(reader).map_err(|err| {
        Error::serialization("failed to parse transcript", Some(Box::new(err)))
    })?;
    Transcript::from_messages(messages).map(Restored::Loaded)
}

/// Where the read loop is.  Dispatching and auto-summarizing happen inside a single call to
/// [`ChatSession::handle_line`], so between calls the loop is either waiting or done.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    /// Waiting for the next line.
    AwaitingInput,
    /// `quit` was entered or input ended.
    Exited,
}

/// What one line of input did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Blank input; nothing happened.
    Ignored,
    /// A command ran.  `ok` is false if it reported an error.
    Command {
        /// The command that ran.
        command: ChatCommand,
        /// Whether it succeeded.
        ok: bool,
    },
    /// A turn was submitted.
    Turn {
        /// The reply, or the API error text.
        reply: String,
        /// Whether the transcript was summarized afterwards.
        auto_summarized: bool,
    },
}

/// A source of input lines for [`ChatSession::run`].
pub trait LineSource {
    /// Reads one line.  `Ok(None)` means input has ended.
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>>;
}

impl<I: Iterator<Item = String>> LineSource for I {
    fn read_line(&mut self, _prompt: &str) -> Result<Option<String>> {
        Ok(self.next())
    }
}

/// A chat session that owns one transcript and the provider it talks to.
pub struct ChatSession<P: CompletionProvider = Box<dyn CompletionProvider>> {
    provider: P,
    model: String,
    config: ChatConfig,
    transcript: Transcript,
    state: LoopState,
}

impl<P: CompletionProvider> ChatSession<P> {
    /// Creates a session whose transcript holds only the configured system prompt.
    pub fn new(provider: P, model: impl Into<String>, config: ChatConfig) -> Self {
        let transcript = Transcript::with_system_prompt(config.system_prompt.clone());
        Self {
            provider,
            model: model.into(),
            config,
            transcript,
            state: LoopState::AwaitingInput,
        }
    }

    /// The current transcript.
    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// Replaces the transcript wholesale.
    pub fn replace_transcript(&mut self, transcript: Transcript) {
        self.transcript = transcript;
    }

    /// The model sent with every request.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// The provider's display name.
    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// The file used by `save` and `load`.
    pub fn transcript_path(&self) -> &Path {
        &self.config.transcript_path
    }

    /// Where the read loop is.
    pub fn state(&self) -> LoopState {
        self.state
    }

    /// Returns true once `quit` was entered or input ended.
    pub fn is_exited(&self) -> bool {
        self.state == LoopState::Exited
    }

    /// Submits one turn, without the loop's automatic summarization.
    pub async fn submit(&mut self, text: &str) -> String {
        submit_turn(text, &mut self.transcript, &self.provider, &self.model).await
    }

    /// Summarizes the transcript in place.
    pub fn summarize(&mut self) {
        self.transcript = summarize(&self.transcript);
    }

    /// Writes the transcript to the configured file.
    pub fn save(&self) -> Result<()> {
        persist(&self.transcript, &self.config.transcript_path)
    }

    /// Replaces the transcript from the configured file.  A missing file starts a new
    /// conversation and returns false.  On error the current transcript is kept.
    pub fn load(&mut self) -> Result<bool> {
        let system_prompt = self.config.system_prompt.clone();
        let restored = restore_or(&self.config.transcript_path, || {
            Transcript::with_system_prompt(system_prompt)
        })?;
        let found = !restored.is_missing();
        self.transcript = restored.into_transcript();
        Ok(found)
    }

    /// Handles one line of input: a command, a turn, or nothing.
    pub async fn handle_line(&mut self, line: &str, renderer: &mut dyn Renderer) -> Step {
        if let Some(command) = parse_command(line) {
            let ok = self.dispatch(command, renderer);
            return Step::Command { command, ok };
        }
        if line.trim().is_empty() {
            return Step::Ignored;
        }

        let reply = self.submit(line).await;
        renderer.print_reply(&reply);

        let auto_summarized = self.transcript.len() > AUTO_SUMMARY_THRESHOLD;
        if auto_summarized {
            self.summarize();
            renderer.print_notice("(Conversation automatically summarized)");
        }
        Step::Turn {
            reply,
            auto_summarized,
        }
    }

    fn dispatch(&mut self, command: ChatCommand, renderer: &mut dyn Renderer) -> bool {
        match command {
            ChatCommand::Quit => {
                self.state = LoopState::Exited;
                true
            }
            ChatCommand::Save => match self.save() {
                Ok(()) => {
                    renderer.print_info("Conversation saved!");
                    true
                }
                Err(err) => {
                    renderer.print_error(&format!("Failed to save conversation: {err}"));
                    false
                }
            },
            ChatCommand::Load => match self.load() {
                Ok(true) => {
                    renderer.print_info("Conversation loaded.");
                    true
                }
                Ok(false) => {
                    renderer.print_info(&format!(
                        "No conversation file found at {}; started a new conversation.",
                        self.config.transcript_path.display()
                    ));
                    true
                }
                Err(err) => {
                    renderer.print_error(&format!("Failed to load conversation: {err}"));
                    false
                }
            },
            ChatCommand::Summary => {
                self.summarize();
                renderer.print_info("Summarized messages.");
                true
            }
        }
    }

    /// Runs the read loop until `quit` or end of input.
    pub async fn run(
        &mut self,
        input: &mut dyn LineSource,
        renderer: &mut dyn Renderer,
    ) -> Result<()> {
        while !self.is_exited() {
            match input.read_line(PROMPT)? {
                Some(line) => {
                    self.handle_line(&line, renderer).await;
                }
                None => self.state = LoopState::Exited,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::sync::Mutex;

    use super::*;
    use crate::types::{DEFAULT_SYSTEM_PROMPT, MessageRole};

    struct Echo;

    #[async_trait::async_trait]
    impl CompletionProvider for Echo {
        fn name(&self) -> &str {
            "echo"
        }

        async fn complete(&self, _: &str, messages: &[Message]) -> Result<String> {
            Ok(messages.last().map(|m| m.content.clone()).unwrap_or_default())
        }
    }

    struct Fixed(&'static str);

    #[async_trait::async_trait]
    impl CompletionProvider for Fixed {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn complete(&self, _: &str, _: &[Message]) -> Result<String> {
            Ok(self.0.to_string())
        }
    }

    struct Failing;

    #[async_trait::async_trait]
    impl CompletionProvider for Failing {
        fn name(&self) -> &str {
            "failing"
        }

        async fn complete(&self, _: &str, _: &[Message]) -> Result<String> {
            Err(Error::rate_limit("too many requests", Some(20)))
        }
    }

    /// Records the model name and message count of each call.
    #[derive(Default)]
    struct Recording {
        calls: Mutex<Vec<(String, usize)>>,
    }

    #[async_trait::async_trait]
    impl CompletionProvider for Recording {
        fn name(&self) -> &str {
            "recording"
        }

        async fn complete(&self, model: &str, messages: &[Message]) -> Result<String> {
            self.calls
                .lock()
                .unwrap()
                .push((model.to_string(), messages.len()));
            Ok("ok".to_string())
        }
    }

    #[derive(Default)]
    struct Captured {
        replies: Vec<String>,
        errors: Vec<String>,
        infos: Vec<String>,
        notices: Vec<String>,
    }

    impl Renderer for Captured {
        fn print_reply(&mut self, reply: &str) {
            self.replies.push(reply.to_string());
        }

        fn print_error(&mut self, error: &str) {
            self.errors.push(error.to_string());
        }

        fn print_info(&mut self, info: &str) {
            self.infos.push(info.to_string());
        }

        fn print_notice(&mut self, notice: &str) {
            self.notices.push(notice.to_string());
        }
    }

    fn scratch_path(name: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!(
            "parley-session-{}-{name}.json",
            std::process::id()
        ));
        let _ = std::fs::remove_file(&path);
        path
    }

    fn transcript_of(len: usize) -> Transcript {
        let mut transcript = create_initial_transcript();
        for i in 1..len {
            if i % 2 == 1 {
                transcript.push(Message::user(format!("question {i}")));
            } else {
                transcript.push(Message::assistant(format!("answer {i}")));
            }
        }
        transcript
    }

    #[test]
    fn initial_transcript_is_one_system_message() {
        let transcript = create_initial_transcript();
        assert_eq!(transcript.messages(), &[Message::system(DEFAULT_SYSTEM_PROMPT)]);
    }

    #[tokio::test]
    async fn successful_turn_appends_user_then_assistant() {
        let mut transcript = create_initial_transcript();
        let reply = submit_turn("Hello", &mut transcript, &Echo, "m").await;
        assert_eq!(reply, "Hello");
        assert_eq!(transcript.len(), 3);
        assert_eq!(transcript.messages()[1], Message::user("Hello"));
        assert_eq!(transcript.messages()[2], Message::assistant("Hello"));
    }

    #[tokio::test]
    async fn failed_turn_keeps_only_the_user_message() {
        let mut transcript = create_initial_transcript();
        let reply = submit_turn("Hello", &mut transcript, &Failing, "m").await;
        assert!(reply.starts_with(API_ERROR_MARKER), "{reply}");
        assert!(reply.contains("too many requests"));
        assert_eq!(transcript.len(), 2);
        assert_eq!(transcript.last().unwrap().role, MessageRole::User);
    }

    #[tokio::test]
    async fn provider_sees_whole_transcript_and_model() {
        let provider = Recording::default();
        let mut transcript = create_initial_transcript();
        submit_turn("one", &mut transcript, &provider, "llama3.2").await;
        submit_turn("two", &mut transcript, &provider, "llama3.2").await;
        let calls = provider.calls.lock().unwrap();
        assert_eq!(
            *calls,
            vec![("llama3.2".to_string(), 2), ("llama3.2".to_string(), 4)]
        );
    }

    #[test]
    fn summarize_keeps_last_five_behind_summary() {
        let transcript = transcript_of(8);
        let summarized = summarize(&transcript);
        assert_eq!(summarized.len(), 6);
        assert!(summarized.messages()[0].is_system());
        assert!(summarized.messages()[0].content.starts_with(SUMMARY_PREFIX));
        assert_eq!(&summarized.messages()[1..], transcript.tail(5));
    }

    #[test]
    fn summary_text_format() {
        let mut transcript = create_initial_transcript();
        transcript.push(Message::user("Hello"));
        transcript.push(Message::assistant("Hi"));
        let summarized = summarize(&transcript);
        assert_eq!(
            summarized.messages()[0].content,
            "Previous conversation summarized:You are a helpful assistant....   Hello...   Hi..."
        );
        assert_eq!(&summarized.messages()[1..], transcript.messages());
    }

    #[test]
    fn summary_truncates_to_fifty_characters() {
        let mut transcript = create_initial_transcript();
        transcript.push(Message::user("x".repeat(80)));
        let summarized = summarize(&transcript);
        let expected = format!("{}...", "x".repeat(50));
        assert!(summarized.messages()[0].content.ends_with(&expected));
        assert!(!summarized.messages()[0].content.contains(&"x".repeat(51)));
        assert_eq!(summarized.messages()[2].content.len(), 80);
    }

    #[test]
    fn summary_does_not_split_characters() {
        let mut transcript = create_initial_transcript();
        transcript.push(Message::user("é".repeat(60)));
        let summarized = summarize(&transcript);
        let expected = format!("{}...", "é".repeat(50));
        assert!(summarized.messages()[0].content.ends_with(&expected));
    }

    #[test]
    fn persist_then_restore_round_trips() {
        let path = scratch_path("round-trip");
        let mut transcript = transcript_of(4);
        transcript.push(Message::assistant("quotes \" and\nnewlines"));
        persist(&transcript, &path).unwrap();
        let restored = restore(&path).unwrap();
        assert_eq!(restored, Restored::Loaded(transcript));
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn persist_overwrites() {
        let path = scratch_path("overwrite");
        persist(&transcript_of(7), &path).unwrap();
        persist(&transcript_of(2), &path).unwrap();
        assert_eq!(restore(&path).unwrap().into_transcript(), transcript_of(2));
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn persisted_file_is_array_of_role_content() {
        let path = scratch_path("shape");
        persist(&create_initial_transcript(), &path).unwrap();
        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(
            raw,
            serde_json::json!([{"role": "system", "content": DEFAULT_SYSTEM_PROMPT}])
        );
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn restore_missing_file_gives_initial_transcript() {
        let path = scratch_path("missing");
        let restored = restore(&path).unwrap();
        assert!(restored.is_missing());
        assert_eq!(restored.into_transcript(), create_initial_transcript());
    }

    #[test]
    fn restore_malformed_file_is_serialization_error() {
        let path = scratch_path("malformed");
        std::fs::write(&path, "{\"role\": ").unwrap();
        assert!(restore(&path).unwrap_err().is_serialization());
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn restore_without_leading_system_is_validation_error() {
        let path = scratch_path("no-system");
        std::fs::write(&path, r#"[{"role": "user", "content": "hi"}]"#).unwrap();
        assert!(restore(&path).unwrap_err().is_validation());
        std::fs::write(&path, "[]").unwrap();
        assert!(restore(&path).unwrap_err().is_validation());
        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn save_then_load_restores_saved_transcript() {
        let path = scratch_path("save-load");
        let config = ChatConfig::new().with_transcript_path(&path);
        let mut session = ChatSession::new(Fixed("Hi"), "m", config);
        let mut renderer = Captured::default();

        session.handle_line("Hello", &mut renderer).await;
        assert_eq!(
            session.transcript().messages(),
            &[
                Message::system(DEFAULT_SYSTEM_PROMPT),
                Message::user("Hello"),
                Message::assistant("Hi"),
            ]
        );
        let saved = session.transcript().clone();

        session.handle_line("save", &mut renderer).await;
        session.handle_line("Another", &mut renderer).await;
        assert_eq!(session.transcript().len(), 5);
        let step = session.handle_line("LOAD", &mut renderer).await;
        assert_eq!(
            step,
            Step::Command {
                command: ChatCommand::Load,
                ok: true
            }
        );
        assert_eq!(session.transcript(), &saved);
        assert_eq!(renderer.infos, vec!["Conversation saved!", "Conversation loaded."]);
        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn load_missing_file_starts_over_with_configured_prompt() {
        let path = scratch_path("load-missing");
        let config = ChatConfig::new()
            .with_transcript_path(&path)
            .with_system_prompt("Be terse.");
        let mut session = ChatSession::new(Fixed("Hi"), "m", config);
        let mut renderer = Captured::default();
        session.handle_line("Hello", &mut renderer).await;
        session.handle_line("load", &mut renderer).await;
        assert_eq!(session.transcript().messages(), &[Message::system("Be terse.")]);
        assert!(renderer.infos[0].starts_with("No conversation file found at"));
    }

    #[tokio::test]
    async fn load_malformed_file_keeps_current_transcript() {
        let path = scratch_path("load-malformed");
        std::fs::write(&path, "not json").unwrap();
        let config = ChatConfig::new().with_transcript_path(&path);
        let mut session = ChatSession::new(Fixed("Hi"), "m", config);
        let mut renderer = Captured::default();
        session.handle_line("Hello", &mut renderer).await;
        let before = session.transcript().clone();
        let step = session.handle_line("load", &mut renderer).await;
        assert_eq!(
            step,
            Step::Command {
                command: ChatCommand::Load,
                ok: false
            }
        );
        assert_eq!(session.transcript(), &before);
        assert_eq!(renderer.errors.len(), 1);
        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn commands_do_not_reach_the_provider() {
        let path = scratch_path("commands");
        let config = ChatConfig::new().with_transcript_path(&path);
        let mut session = ChatSession::new(Recording::default(), "m", config);
        let mut renderer = Captured::default();
        for line in ["save", "summary", "load", "   "] {
            session.handle_line(line, &mut renderer).await;
        }
        assert!(session.provider.calls.lock().unwrap().is_empty());
        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn turn_keeps_surrounding_whitespace() {
        let mut session = ChatSession::new(Echo, "m", ChatConfig::new());
        let mut renderer = Captured::default();
        let step = session.handle_line("  Hello world  ", &mut renderer).await;
        assert_eq!(
            step,
            Step::Turn {
                reply: "  Hello world  ".to_string(),
                auto_summarized: false
            }
        );
        assert_eq!(session.transcript().messages()[1], Message::user("  Hello world  "));
    }

    #[tokio::test]
    async fn load_reports_whether_the_file_existed() {
        let path = scratch_path("load-found");
        let config = ChatConfig::new().with_transcript_path(&path);
        let mut session = ChatSession::new(Fixed("Hi"), "m", config);
        assert!(!session.load().unwrap());
        session.submit("Hello").await;
        session.save().unwrap();
        assert!(session.load().unwrap());
        assert_eq!(session.transcript().len(), 3);
        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn summary_command_summarizes() {
        let mut session = ChatSession::new(Fixed("Hi"), "m", ChatConfig::new());
        let mut renderer = Captured::default();
        session.handle_line("Hello", &mut renderer).await;
        session.handle_line("summary", &mut renderer).await;
        assert_eq!(session.transcript().len(), 4);
        assert!(
            session.transcript().messages()[0]
                .content
                .starts_with(SUMMARY_PREFIX)
        );
        assert_eq!(renderer.infos, vec!["Summarized messages."]);
    }

    #[tokio::test]
    async fn quit_exits_in_any_case() {
        let mut session = ChatSession::new(Fixed("Hi"), "m", ChatConfig::new());
        let mut renderer = Captured::default();
        assert_eq!(session.state(), LoopState::AwaitingInput);
        session.handle_line("QuIt", &mut renderer).await;
        assert!(session.is_exited());
    }

    #[tokio::test]
    async fn auto_summarizes_once_more_than_ten_messages() {
        let mut session = ChatSession::new(Fixed("Hi"), "m", ChatConfig::new());
        let mut renderer = Captured::default();
        for i in 0..4 {
            let step = session.handle_line(&format!("turn {i}"), &mut renderer).await;
            assert_eq!(
                step,
                Step::Turn {
                    reply: "Hi".to_string(),
                    auto_summarized: false
                }
            );
        }
        assert_eq!(session.transcript().len(), 9);
        session.handle_line("turn 4", &mut renderer).await;
        assert_eq!(session.transcript().len(), 6);
        assert!(
            session.transcript().messages()[0]
                .content
                .starts_with(SUMMARY_PREFIX)
        );
        assert_eq!(
            renderer.notices,
            vec!["(Conversation automatically summarized)"]
        );
    }

    #[tokio::test]
    async fn failed_turns_count_toward_auto_summary() {
        let mut session = ChatSession::new(Failing, "m", ChatConfig::new());
        let mut renderer = Captured::default();
        for i in 0..9 {
            session.handle_line(&format!("turn {i}"), &mut renderer).await;
        }
        assert_eq!(session.transcript().len(), 10);
        let step = session.handle_line("turn 9", &mut renderer).await;
        assert!(matches!(
            step,
            Step::Turn {
                auto_summarized: true,
                ..
            }
        ));
        assert!(renderer.replies.iter().all(|r| r.starts_with(API_ERROR_MARKER)));
    }

    #[tokio::test]
    async fn run_stops_at_quit() {
        let mut session = ChatSession::new(Fixed("Hi"), "m", ChatConfig::new());
        let mut renderer = Captured::default();
        let mut input = vec!["Hello", "quit", "never sent"]
            .into_iter()
            .map(String::from);
        session.run(&mut input, &mut renderer).await.unwrap();
        assert!(session.is_exited());
        assert_eq!(renderer.replies, vec!["Hi"]);
        assert_eq!(input.next().as_deref(), Some("never sent"));
    }

    #[tokio::test]
    async fn run_stops_at_end_of_input() {
        let mut session = ChatSession::new(Fixed("Hi"), "m", ChatConfig::new());
        let mut renderer = Captured::default();
        let mut input = vec!["one".to_string(), "two".to_string()].into_iter();
        session.run(&mut input, &mut renderer).await.unwrap();
        assert!(session.is_exited());
        assert_eq!(session.transcript().len(), 5);
    }
}
