//! Token accounting for logged interactions.
//!
//! Counts are estimates (about four characters per token) unless the
//! provider reported usage, which always wins.

use crate::types::{ChatMessage, MessageRole, TokenUsage};
use chrono::Local;
use serde::{Deserialize, Serialize};

const PER_MESSAGE_OVERHEAD: u64 = 4;
const REQUEST_OVERHEAD: u64 = 3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmInteractionRecord {
    pub llm_prompt: String,
    pub llm_response: String,
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
    pub model_used: String,
    pub temperature: f32,
    pub prompt_length_chars: usize,
    pub response_length_chars: usize,
    pub timestamp: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PromptComplexity {
    pub word_count: usize,
    pub sentence_count: usize,
    pub avg_words_per_sentence: f64,
    pub contains_code: bool,
    pub contains_data: bool,
    pub contains_instructions: bool,
}

pub fn count_tokens(text: &str) -> u64 {
    (text.chars().count() as u64).div_ceil(4)
}

pub fn count_message_tokens(messages: &[ChatMessage]) -> u64 {
    messages
        .iter()
        .map(|m| count_tokens(&m.content) + PER_MESSAGE_OVERHEAD)
        .sum::<u64>()
        + REQUEST_OVERHEAD
}

/// The conversation as sent, one `[ROLE]: content` block per message.
pub fn extract_full_prompt(messages: &[ChatMessage]) -> String {
    messages
        .iter()
        .map(|m| {
            let label = match m.role {
                MessageRole::System => "SYSTEM",
                MessageRole::User => "USER",
                MessageRole::Assistant => "ASSISTANT",
                MessageRole::Tool => "TOOL",
            };
            format!("[{}]: {}", label, m.content)
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub fn create_record(
    messages: &[ChatMessage],
    response: &str,
    model: &str,
    temperature: f32,
    usage: Option<TokenUsage>,
) -> LlmInteractionRecord {
    let llm_prompt = extract_full_prompt(messages);
    let usage = usage.unwrap_or_else(|| {
        TokenUsage::new(count_message_tokens(messages), count_tokens(response))
    });

    LlmInteractionRecord {
        prompt_length_chars: llm_prompt.chars().count(),
        response_length_chars: response.chars().count(),
        llm_prompt,
        llm_response: response.to_string(),
        prompt_tokens: usage.prompt_tokens,
        completion_tokens: usage.completion_tokens,
        total_tokens: usage.total_tokens,
        model_used: model.to_string(),
        temperature,
        timestamp: Local::now().format("%Y-%m-%dT%H:%M:%S%.6f").to_string(),
    }
}

pub fn analyze_prompt_complexity(prompt: &str) -> PromptComplexity {
    let word_count = prompt.split_whitespace().count();
    let sentence_count = prompt.matches(['.', '!', '?']).count();
    let lower = prompt.to_lowercase();
    let has_any = |words: &[&str]| words.iter().any(|w| lower.contains(w));

    PromptComplexity {
        word_count,
        sentence_count,
        avg_words_per_sentence: word_count as f64 / sentence_count.max(1) as f64,
        contains_code: has_any(&["def ", "class ", "import ", "```"]),
        contains_data: has_any(&["table", "database", "query", "sql"]),
        contains_instructions: has_any(&["please", "can you", "help me", "show me"]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conversation() -> Vec<ChatMessage> {
        vec![
            ChatMessage::system("You are the SV assistant."),
            ChatMessage::user("Show me props for SCH001"),
        ]
    }

    #[test]
    fn test_count_tokens_rounds_up() {
        assert_eq!(count_tokens(""), 0);
        assert_eq!(count_tokens("abcd"), 1);
        assert_eq!(count_tokens("abcde"), 2);
    }

    #[test]
    fn test_message_overhead() {
        // 25 chars -> 7 tokens, 24 chars -> 6 tokens, plus 4 + 4 + 3
        assert_eq!(count_message_tokens(&conversation()), 7 + 6 + 11);
        assert_eq!(count_message_tokens(&[]), 3);
    }

    #[test]
    fn test_full_prompt_labels() {
        let mut messages = conversation();
        messages.push(ChatMessage::tool("call_1", "Props Inventory"));
        assert_eq!(
            extract_full_prompt(&messages),
            "[SYSTEM]: You are the SV assistant.\n\n[USER]: Show me props for SCH001\n\n[TOOL]: Props Inventory"
        );
    }

    #[test]
    fn test_record_prefers_provider_usage() {
        let estimated = create_record(&conversation(), "abcdefgh", "gpt-4o-mini", 0.0, None);
        assert_eq!(estimated.prompt_tokens, 24);
        assert_eq!(estimated.completion_tokens, 2);
        assert_eq!(estimated.total_tokens, 26);
        assert_eq!(estimated.response_length_chars, 8);

        let reported = create_record(
            &conversation(),
            "abcdefgh",
            "gpt-4o-mini",
            0.0,
            Some(TokenUsage::new(300, 40)),
        );
        assert_eq!(reported.total_tokens, 340);
        assert!(reported.llm_prompt.starts_with("[SYSTEM]: "));
    }

    #[test]
    fn test_prompt_complexity() {
        let analysis = analyze_prompt_complexity("Please show me the props table. Is it current?");
        assert_eq!(analysis.word_count, 9);
        assert_eq!(analysis.sentence_count, 2);
        assert!((analysis.avg_words_per_sentence - 4.5).abs() < 1e-9);
        assert!(analysis.contains_data);
        assert!(analysis.contains_instructions);
        assert!(!analysis.contains_code);
    }
}
