use std::fmt;

use serde::{Deserialize, Serialize};

/// A single role-tagged entry in a transcript.
///
/// Messages are immutable once created; the transcript only ever appends, replaces, or drops
/// them wholesale.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Message {
    /// The role of the message.
    pub role: MessageRole,

    /// The text of the message.
    pub content: String,
}

/// Role type for a message.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// Persona or instruction text.
    System,

    /// User role.
    User,

    /// Assistant role.
    Assistant,
}

impl Message {
    /// Create a new `Message` with the given role and content.
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    /// Create a new system `Message`.
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(MessageRole::System, content)
    }

    /// Create a new user `Message`.
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageRole::User, content)
    }

    /// Create a new assistant `Message`.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(MessageRole::Assistant, content)
    }

    /// Returns true if this is a system message.
    pub fn is_system(&self) -> bool {
        self.role == MessageRole::System
    }
}

impl From<&str> for Message {
    fn from(content: &str) -> Self {
        Self::user(content)
    }
}

impl From<String> for Message {
    fn from(content: String) -> Self {
        Self::user(content)
    }
}

impl MessageRole {
    /// The wire name of the role.
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageRole::System => "system",
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
        }
    }
}

impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, to_value};

    #[test]
    fn message_serializes_with_lowercase_role() {
        let message = Message::assistant("Hi");
        assert_eq!(
            to_value(&message).unwrap(),
            json!({"role": "assistant", "content": "Hi"})
        );
    }

    #[test]
    fn message_deserializes_system() {
        let message: Message =
            serde_json::from_value(json!({"role": "system", "content": "Be brief."})).unwrap();
        assert!(message.is_system());
        assert_eq!(message.content, "Be brief.");
    }

    #[test]
    fn unknown_role_is_rejected() {
        let result =
            serde_json::from_value::<Message>(json!({"role": "tool", "content": "{}"}));
        assert!(result.is_err());
    }

    #[test]
    fn string_converts_to_user_message() {
        let message = Message::from("Hello");
        assert_eq!(message.role, MessageRole::User);
        assert_eq!(message.role.to_string(), "user");
    }
}
