use crate::types::{ChatCompletion, ChatMessage, MessageRole, TokenUsage, ToolCall, ToolDefinition};
use async_trait::async_trait;
use common::{LlmConfig, LlmError};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::{Duration, Instant};
use tracing::{debug, error, info};

/// Anything that can answer a chat turn, optionally asking for tool calls.
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        tools: &[ToolDefinition],
    ) -> Result<ChatCompletion, LlmError>;

    fn model_name(&self) -> &str;

    fn temperature(&self) -> f32;
}

/// Client for an OpenAI-compatible `/chat/completions` endpoint.
#[derive(Debug, Clone)]
pub struct LlmClient {
    api_key: String,
    model: String,
    endpoint: String,
    temperature: f32,
    max_tokens: u32,
    client: Client,
}

impl LlmClient {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>, endpoint: impl Into<String>) -> Result<Self, LlmError> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(LlmError::MissingApiKey("OPENAI_API_KEY".into()));
        }

        Ok(Self {
            api_key,
            model: model.into(),
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            temperature: 0.0,
            max_tokens: 1000,
            client: build_client(Duration::from_secs(60))?,
        })
    }

    pub fn from_config(config: &LlmConfig) -> Result<Self, LlmError> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| LlmError::MissingApiKey("OPENAI_API_KEY".into()))?;

        let mut client = Self::new(api_key, config.model.clone(), config.base_url.clone())?
            .with_temperature(config.temperature)
            .with_max_tokens(config.max_tokens);
        client.client = build_client(Duration::from_secs(config.timeout_secs))?;
        Ok(client)
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }
}

fn build_client(timeout: Duration) -> Result<Client, LlmError> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| LlmError::Http(format!("Failed to create HTTP client: {}", e)))
}

#[async_trait]
impl ChatModel for LlmClient {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        tools: &[ToolDefinition],
    ) -> Result<ChatCompletion, LlmError> {
        let start_time = Instant::now();

        let request = OpenAIRequest {
            model: &self.model,
            messages: messages.iter().map(OpenAIMessage::from).collect(),
            tools: tools.iter().map(OpenAITool::from).collect(),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        debug!(
            model = %self.model,
            messages = messages.len(),
            tools = tools.len(),
            "Sending chat completion request"
        );

        let response = self
            .client
            .post(format!("{}/chat/completions", self.endpoint))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| LlmError::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(%status, "Chat completion failed: {}", body);
            return Err(LlmError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: OpenAIResponse = response
            .json()
            .await
            .map_err(|e| LlmError::Malformed(e.to_string()))?;

        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or(LlmError::EmptyResponse)?;

        let tool_calls: Vec<ToolCall> = choice
            .message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .map(|call| ToolCall {
                arguments: serde_json::from_str(&call.function.arguments)
                    .unwrap_or(Value::String(call.function.arguments)),
                id: call.id,
                name: call.function.name,
            })
            .collect();

        let usage = parsed
            .usage
            .map(|u| TokenUsage::new(u.prompt_tokens, u.completion_tokens));

        info!(
            elapsed_ms = start_time.elapsed().as_millis() as u64,
            tool_calls = tool_calls.len(),
            total_tokens = usage.map(|u| u.total_tokens),
            "Received chat completion"
        );

        Ok(ChatCompletion {
            content: choice.message.content.filter(|c| !c.is_empty()),
            tool_calls,
            usage,
            model: parsed.model.unwrap_or_else(|| self.model.clone()),
        })
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn temperature(&self) -> f32 {
        self.temperature
    }
}

#[derive(Serialize)]
struct OpenAIRequest<'a> {
    model: &'a str,
    messages: Vec<OpenAIMessage>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<OpenAITool>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct OpenAIMessage {
    role: String,
    content: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tool_calls: Vec<OpenAIToolCall>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

impl From<&ChatMessage> for OpenAIMessage {
    fn from(message: &ChatMessage) -> Self {
        // Assistant turns that only call tools carry no text.
        let content = if message.role == MessageRole::Assistant
            && message.content.is_empty()
            && !message.tool_calls.is_empty()
        {
            None
        } else {
            Some(message.content.clone())
        };

        Self {
            role: message.role.as_str().to_string(),
            content,
            tool_calls: message
                .tool_calls
                .iter()
                .map(|call| OpenAIToolCall {
                    id: call.id.clone(),
                    kind: "function".to_string(),
                    function: OpenAIFunctionCall {
                        name: call.name.clone(),
                        arguments: match &call.arguments {
                            Value::String(raw) => raw.clone(),
                            other => other.to_string(),
                        },
                    },
                })
                .collect(),
            tool_call_id: message.tool_call_id.clone(),
        }
    }
}

#[derive(Serialize, Deserialize)]
struct OpenAIToolCall {
    id: String,
    #[serde(rename = "type", default = "function_kind")]
    kind: String,
    function: OpenAIFunctionCall,
}

fn function_kind() -> String {
    "function".to_string()
}

#[derive(Serialize, Deserialize)]
struct OpenAIFunctionCall {
    name: String,
    #[serde(default)]
    arguments: String,
}

#[derive(Serialize)]
struct OpenAITool {
    #[serde(rename = "type")]
    kind: &'static str,
    function: OpenAIFunction,
}

#[derive(Serialize)]
struct OpenAIFunction {
    name: String,
    description: String,
    parameters: Value,
}

impl From<&ToolDefinition> for OpenAITool {
    fn from(tool: &ToolDefinition) -> Self {
        Self {
            kind: "function",
            function: OpenAIFunction {
                name: tool.name.clone(),
                description: tool.description.clone(),
                parameters: tool.parameters.clone(),
            },
        }
    }
}

#[derive(Deserialize)]
struct OpenAIResponse {
    #[serde(default)]
    choices: Vec<OpenAIChoice>,
    usage: Option<OpenAIUsage>,
    model: Option<String>,
}

#[derive(Deserialize)]
struct OpenAIChoice {
    message: OpenAIResponseMessage,
}

/// Compatible servers send `null` for absent fields as often as they omit them.
#[derive(Deserialize)]
struct OpenAIResponseMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<OpenAIToolCall>>,
}

#[derive(Deserialize)]
struct OpenAIUsage {
    prompt_tokens: u64,
    completion_tokens: u64,
}
