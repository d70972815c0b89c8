//! Provider trait definition

use async_trait::async_trait;

use crate::types::{ChatMessage, Tool, ToolCall, CancellationToken};
use super::error::ProviderResult;

/// Model configuration for provider requests
#[derive(Debug, Clone)]
pub struct ProviderModelConfig {
    /// Model identifier as used by the provider's API
    pub model: String,
    pub api_key: Option<String>,
    pub api_base: Option<String>,
}

impl ProviderModelConfig {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            api_key: None,
            api_base: None,
        }
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn with_api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = Some(base.into());
        self
    }
}

/// Per-request generation options
#[derive(Debug, Clone, Default)]
pub struct ChatOptions {
    /// Temperature for response generation (0.0 - 2.0)
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    /// Tools offered to the model; `None` asks for a plain text answer
    pub tools: Option<Vec<Tool>>,
}

impl ChatOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_temperature(mut self, temp: f32) -> Self {
        self.temperature = Some(temp);
        self
    }

    pub fn with_max_tokens(mut self, tokens: u32) -> Self {
        self.max_tokens = Some(tokens);
        self
    }

    pub fn with_tools(mut self, tools: Vec<Tool>) -> Self {
        self.tools = Some(tools);
        self
    }

    /// Same options with the tool list removed
    pub fn without_tools(mut self) -> Self {
        self.tools = None;
        self
    }
}

/// One completed model turn: optional text plus any requested tool calls
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChatResponse {
    pub text: Option<String>,
    pub tool_calls: Vec<ToolCall>,
}

impl ChatResponse {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            tool_calls: Vec::new(),
        }
    }

    pub fn tool_calls(calls: Vec<ToolCall>) -> Self {
        Self {
            text: None,
            tool_calls: calls,
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }
}

/// LLM chat-completion backend
#[async_trait]
pub trait Provider: Send + Sync {
    /// Provider id (e.g., "openai", "mock")
    fn name(&self) -> &str;

    fn default_api_base(&self) -> &str;

    /// Whether `chat` needs `ProviderModelConfig::api_key`
    fn requires_api_key(&self) -> bool {
        true
    }

    /// Run one non-streaming chat completion
    async fn chat(
        &self,
        messages: Vec<ChatMessage>,
        model: ProviderModelConfig,
        options: ChatOptions,
        cancel_token: CancellationToken,
    ) -> ProviderResult<ChatResponse>;

    /// Get the API base URL, using custom if provided
    fn get_api_base(&self, model: &ProviderModelConfig) -> String {
        model.api_base.clone().unwrap_or_else(|| self.default_api_base().to_string())
    }
}
