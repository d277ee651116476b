// Public modules
pub mod chat_completion;
pub mod message;
pub mod transcript;

// Re-exports
pub use chat_completion::{
    ChatCompletionChoice, ChatCompletionRequest, ChatCompletionResponse, ChoiceMessage,
    CompletionUsage,
};
pub use message::{Message, MessageRole};
pub use transcript::{DEFAULT_SYSTEM_PROMPT, Transcript};
