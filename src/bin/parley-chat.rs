//! Interactive chat client for OpenAI-compatible completion endpoints.
//!
//! # Usage
//!
//! ```bash
//! # Ask which provider to use, keep the transcript in ./conversation.json
//! parley-chat
//!
//! # Skip the menu and talk to a local Ollama server
//! parley-chat --provider local
//!
//! # Use a different model and transcript file
//! parley-chat --provider remote --model gpt-4o --transcript notes.json
//! ```
//!
//! The remote provider reads `OPENAI_API_KEY` from the environment or from a `.env` file in
//! the working directory.
//!
//! # Commands
//!
//! - `save` - Write the conversation to the transcript file
//! - `load` - Replace the conversation with the transcript file
//! - `summary` - Summarize the conversation
//! - `quit` - Exit the application

use std::io;
use std::sync::Arc;

use arrrg::CommandLine;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

use parley::chat::{
    ChatArgs, ChatConfig, ChatSession, LineSource, PlainTextRenderer, Renderer, help_text,
    load_env_file,
};
use parley::{ClientLogger, Error, ProviderChoice, StderrLogger};

/// Line input backed by rustyline.
struct Editor {
    rl: DefaultEditor,
}

impl Editor {
    fn new() -> Result<Self, ReadlineError> {
        Ok(Self {
            rl: DefaultEditor::new()?,
        })
    }
}

impl LineSource for Editor {
    fn read_line(&mut self, prompt: &str) -> parley::Result<Option<String>> {
        println!();
        match self.rl.readline(prompt) {
            Ok(line) => {
                if !line.trim().is_empty() {
                    let _ = self.rl.add_history_entry(line.as_str());
                }
                Ok(Some(line))
            }
            // Ctrl+C at the prompt discards the line.
            Err(ReadlineError::Interrupted) => Ok(Some(String::new())),
            Err(ReadlineError::Eof) => Ok(None),
            Err(err) => Err(Error::io("input failed", io::Error::other(err.to_string()))),
        }
    }
}

/// Asks which provider to use.  Returns `None` if input ends first.
fn prompt_for_provider(editor: &mut Editor) -> parley::Result<Option<ProviderChoice>> {
    println!("Select model type:");
    println!("1. OpenAI GPT 4");
    println!("2. Llama (local)");
    let answer = editor.read_line("Enter choice(1 or 2): ")?;
    Ok(answer.as_deref().map(ProviderChoice::from_menu_answer))
}

/// Main entry point for the parley-chat application.
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let (args, _) = ChatArgs::from_command_line_relaxed("parley-chat [OPTIONS]");
    let config = ChatConfig::try_from(args)?;
    let mut renderer = PlainTextRenderer::with_color(config.use_color);
    if let Err(err) = load_env_file() {
        renderer.print_error(&err.to_string());
    }
    let mut editor = Editor::new()?;

    let choice = match config.provider {
        Some(choice) => choice,
        None => match prompt_for_provider(&mut editor)? {
            Some(choice) => choice,
            None => return Ok(()),
        },
    };

    let logger: Option<Arc<dyn ClientLogger>> = if config.log_requests {
        Some(Arc::new(StderrLogger::new()))
    } else {
        None
    };
    let provider = choice.connect(config.timeout, logger)?;
    let model = config.model_for(choice);
    let mut session = ChatSession::new(provider, model, config);

    println!("\nUsing {} model ({}).", choice.label(), session.model());
    println!("{}", help_text());

    session.run(&mut editor, &mut renderer).await?;
    println!("\nGoodbye!");
    Ok(())
}
