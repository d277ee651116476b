// Public modules
pub mod chat;
pub mod client;
pub mod client_logger;
pub mod error;
pub mod observability;
pub mod provider;
pub mod render;
pub mod types;

// Re-exports
pub use client::{ChatCompletions, OLLAMA_API_URL, OPENAI_API_URL};
pub use client_logger::{ClientLogger, StderrLogger};
pub use error::{Error, Result};
pub use observability::register_biometrics;
pub use provider::{CompletionProvider, LocalProvider, ProviderChoice, RemoteProvider};
pub use render::{PlainTextRenderer, Renderer};
pub use types::*;
