//! Completion providers.
//!
//! A [`CompletionProvider`] maps a transcript and a model name to one assistant reply.  Two
//! implementations ship with parley: [`RemoteProvider`] for the hosted, credentialed API and
//! [`LocalProvider`] for an unauthenticated server on this machine.  [`ProviderChoice`] picks
//! between them at startup.

use std::env;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use crate::client::{ChatCompletions, OLLAMA_API_URL, OPENAI_API_URL};
use crate::client_logger::ClientLogger;
use crate::error::{Error, Result};
use crate::types::{ChatCompletionRequest, Message};

/// Environment variable holding the remote credential.
pub const OPENAI_API_KEY_VAR: &str = "OPENAI_API_KEY";
/// Optional override for the remote base URL.
pub const OPENAI_BASE_URL_VAR: &str = "OPENAI_BASE_URL";
/// Optional override for the local base URL.
pub const OLLAMA_BASE_URL_VAR: &str = "OLLAMA_BASE_URL";

/// Default model for the remote provider.
pub const DEFAULT_REMOTE_MODEL: &str = "gpt-4o-mini";
/// Default model for the local provider.
pub const DEFAULT_LOCAL_MODEL: &str = "llama3.2";

/// A capability that turns a conversation into the next assistant message.
///
/// Implementations hold no conversation state; every call sends the whole transcript.
#[async_trait::async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Human-readable provider name, e.g. "OpenAI".
    fn name(&self) -> &str;

    /// Ask `model` for the reply to `messages`.
    async fn complete(&self, model: &str, messages: &[Message]) -> Result<String>;
}

#[async_trait::async_trait]
impl<P: CompletionProvider + ?Sized> CompletionProvider for Box<P> {
    fn name(&self) -> &str {
        (**self).name()
    }

    async fn complete(&self, model: &str, messages: &[Message]) -> Result<String> {
        (**self).complete(model, messages).await
    }
}

/// The hosted OpenAI endpoint, authenticated with a bearer credential.
#[derive(Debug, Clone)]
pub struct RemoteProvider {
    client: ChatCompletions,
}

impl RemoteProvider {
    /// Create a provider for `base_url` using `api_key`.
    pub fn new(
        api_key: impl Into<String>,
        base_url: &str,
        timeout: Option<Duration>,
    ) -> Result<Self> {
        let client = ChatCompletions::with_options(Some(api_key.into()), base_url, timeout)?;
        Ok(Self { client })
    }

    /// Create a provider from `OPENAI_API_KEY` and, if set, `OPENAI_BASE_URL`.
    ///
    /// # Errors
    ///
    /// Returns an authentication error if `OPENAI_API_KEY` is not set.
    pub fn from_env(timeout: Option<Duration>) -> Result<Self> {
        let api_key = env::var(OPENAI_API_KEY_VAR).map_err(|_| {
            Error::authentication(format!(
                "{OPENAI_API_KEY_VAR} is not set; export it or add it to .env"
            ))
        })?;
        let base_url =
            env::var(OPENAI_BASE_URL_VAR).unwrap_or_else(|_| OPENAI_API_URL.to_string());
        Self::new(api_key, &base_url, timeout)
    }

    /// Attach a request logger to the underlying client.
    pub fn with_logger(mut self, logger: Arc<dyn ClientLogger>) -> Self {
        self.client = self.client.with_logger(logger);
        self
    }
}

#[async_trait::async_trait]
impl CompletionProvider for RemoteProvider {
    fn name(&self) -> &str {
        "OpenAI"
    }

    async fn complete(&self, model: &str, messages: &[Message]) -> Result<String> {
        complete_with(&self.client, model, messages).await
    }
}

/// A local OpenAI-compatible server such as Ollama.  No credential is sent.
#[derive(Debug, Clone)]
pub struct LocalProvider {
    client: ChatCompletions,
}

impl LocalProvider {
    /// Create a provider for `base_url`.
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Result<Self> {
        let client = ChatCompletions::with_options(None, base_url, timeout)?;
        Ok(Self { client })
    }

    /// Create a provider for `OLLAMA_BASE_URL`, or `http://localhost:11434/v1/` when unset.
    pub fn from_env(timeout: Option<Duration>) -> Result<Self> {
        let base_url =
            env::var(OLLAMA_BASE_URL_VAR).unwrap_or_else(|_| OLLAMA_API_URL.to_string());
        Self::new(&base_url, timeout)
    }

    /// Attach a request logger to the underlying client.
    pub fn with_logger(mut self, logger: Arc<dyn ClientLogger>) -> Self {
        self.client = self.client.with_logger(logger);
        self
    }
}

#[async_trait::async_trait]
impl CompletionProvider for LocalProvider {
    fn name(&self) -> &str {
        "Ollama"
    }

    async fn complete(&self, model: &str, messages: &[Message]) -> Result<String> {
        complete_with(&self.client, model, messages).await
    }
}

async fn complete_with(
    client: &ChatCompletions,
    model: &str,
    messages: &[Message],
) -> Result<String> {
    let request = ChatCompletionRequest::new(model, messages);
    let response = client.send(&request).await?;
    response
        .first_content()
        .map(str::to_string)
        .ok_or_else(|| Error::serialization("response contained no message content", None))
}

/// Which provider to talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProviderChoice {
    /// The hosted OpenAI API.
    #[default]
    Remote,
    /// A local Ollama server.
    Local,
}

impl ProviderChoice {
    /// Interpret an answer to the startup menu.  Only "2" selects the local provider; anything
    /// else falls back to the remote one.
    pub fn from_menu_answer(answer: &str) -> Self {
        if answer.trim() == "2" {
            ProviderChoice::Local
        } else {
            ProviderChoice::Remote
        }
    }

    /// The model used when none is configured.
    pub fn default_model(&self) -> &'static str {
        match self {
            ProviderChoice::Remote => DEFAULT_REMOTE_MODEL,
            ProviderChoice::Local => DEFAULT_LOCAL_MODEL,
        }
    }

    /// The vendor name shown to the user.
    pub fn label(&self) -> &'static str {
        match self {
            ProviderChoice::Remote => "OpenAI",
            ProviderChoice::Local => "Ollama",
        }
    }

    /// Build the provider from the environment.
    pub fn connect(
        &self,
        timeout: Option<Duration>,
        logger: Option<Arc<dyn ClientLogger>>,
    ) -> Result<Box<dyn CompletionProvider>> {
        let provider: Box<dyn CompletionProvider> = match self {
            ProviderChoice::Remote => {
                let mut provider = RemoteProvider::from_env(timeout)?;
                if let Some(logger) = logger {
                    provider = provider.with_logger(logger);
                }
                Box::new(provider)
            }
            ProviderChoice::Local => {
                let mut provider = LocalProvider::from_env(timeout)?;
                if let Some(logger) = logger {
                    provider = provider.with_logger(logger);
                }
                Box::new(provider)
            }
        };
        Ok(provider)
    }
}

impl fmt::Display for ProviderChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderChoice::Remote => write!(f, "remote"),
            ProviderChoice::Local => write!(f, "local"),
        }
    }
}

impl FromStr for ProviderChoice {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "1" | "remote" | "openai" => Ok(ProviderChoice::Remote),
            "2" | "local" | "ollama" => Ok(ProviderChoice::Local),
            other => Err(Error::validation(
                format!("unknown provider {other:?}; expected remote, local, 1, or 2"),
                Some("provider".to_string()),
            )),
        }
    }
}
