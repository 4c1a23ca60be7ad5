//! Chat-completion client with OpenAI-style function calling, plus the
//! token accounting recorded with every interaction.

pub mod analytics;
mod client;
mod types;

pub use analytics::{
    analyze_prompt_complexity, count_message_tokens, count_tokens, create_record,
    extract_full_prompt, LlmInteractionRecord, PromptComplexity,
};
pub use client::{ChatModel, LlmClient};
pub use types::{ChatCompletion, ChatMessage, MessageRole, TokenUsage, ToolCall, ToolDefinition};
