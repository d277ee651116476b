use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::Message;

/// The default persona instruction every new conversation starts from.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant.";

/// The ordered conversation history exchanged with a completion provider.
///
/// A transcript always starts with a system message.  It serializes as a bare JSON array of
/// `{role, content}` records.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(try_from = "Vec<Message>", into = "Vec<Message>")]
pub struct Transcript {
    messages: Vec<Message>,
}

impl Transcript {
    /// A transcript holding only the given system prompt.
    pub fn with_system_prompt(prompt: impl Into<String>) -> Self {
        Self {
            messages: vec![Message::system(prompt)],
        }
    }

    /// Builds a transcript from raw messages, checking that it opens with a system message.
    pub fn from_messages(messages: Vec<Message>) -> Result<Self> {
        match messages.first() {
            Some(first) if first.is_system() => Ok(Self { messages }),
            Some(first) => Err(Error::validation(
                format!("transcript must start with a system message, found {}", first.role),
                Some("messages".to_string()),
            )),
            None => Err(Error::validation(
                "transcript must not be empty",
                Some("messages".to_string()),
            )),
        }
    }

    /// Appends a message to the end of the transcript.
    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Number of messages, including the leading system message.
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Always false; a transcript holds at least its system message.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// All messages in order.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// The last `n` messages, or all of them when the transcript is shorter.
    pub fn tail(&self, n: usize) -> &[Message] {
        let start = self.messages.len().saturating_sub(n);
        &self.messages[start..]
    }

    /// The most recent message.
    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Iterates over the messages in order.
    pub fn iter(&self) -> std::slice::Iter<'_, Message> {
        self.messages.iter()
    }
}

impl Default for Transcript {
    fn default() -> Self {
        Self::with_system_prompt(DEFAULT_SYSTEM_PROMPT)
    }
}

impl TryFrom<Vec<Message>> for Transcript {
    type Error = Error;

    fn try_from(messages: Vec<Message>) -> Result<Self> {
        Self::from_messages(messages)
    }
}

impl From<Transcript> for Vec<Message> {
    fn from(transcript: Transcript) -> Self {
        transcript.messages
    }
}

impl<'a> IntoIterator for &'a Transcript {
    type Item = &'a Message;
    type IntoIter = std::slice::Iter<'a, Message>;

    fn into_iter(self) -> Self::IntoIter {
        self.messages.iter()
    }
}
