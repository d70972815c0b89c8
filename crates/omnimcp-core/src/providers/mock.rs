//! Mock provider for testing
//!
//! Deterministic responses without network access. The scripted mode replays
//! a queue of model turns, which is how the tool-calling loop is tested.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::error::{ProviderError, ProviderResult};
use super::traits::{ChatOptions, ChatResponse, Provider, ProviderModelConfig};
use crate::logging::Logger;
use crate::types::{CancellationToken, ChatMessage, ContentPart, MessageContent, MessageRole};

/// One scripted model turn
#[derive(Debug, Clone)]
pub enum MockReply {
    Response(ChatResponse),
    Error(String),
}

/// Mock response mode
#[derive(Debug, Clone, Default)]
pub enum MockMode {
    /// Echo back the last user message
    #[default]
    Echo,
    /// Return a fixed response
    Fixed(String),
    /// Pop replies in order; running dry is an error
    Script,
    /// Fail every request
    Error(String),
}

/// What the mock saw on one call
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub messages: Vec<ChatMessage>,
    /// Tool names offered, `None` when the call carried no tools
    pub tool_names: Option<Vec<String>>,
    pub max_tokens: Option<u32>,
}

pub struct MockProvider {
    mode: MockMode,
    script: Mutex<VecDeque<MockReply>>,
    requests: Mutex<Vec<RecordedRequest>>,
    logger: Arc<dyn Logger>,
}

impl MockProvider {
    pub fn new(mode: MockMode, logger: Arc<dyn Logger>) -> Self {
        Self {
            mode,
            script: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
            logger,
        }
    }

    pub fn echo(logger: Arc<dyn Logger>) -> Self {
        Self::new(MockMode::Echo, logger)
    }

    pub fn fixed(response: impl Into<String>, logger: Arc<dyn Logger>) -> Self {
        Self::new(MockMode::Fixed(response.into()), logger)
    }

    pub fn error(message: impl Into<String>, logger: Arc<dyn Logger>) -> Self {
        Self::new(MockMode::Error(message.into()), logger)
    }

    pub fn scripted(replies: Vec<MockReply>, logger: Arc<dyn Logger>) -> Self {
        let provider = Self::new(MockMode::Script, logger);
        provider.script.lock().extend(replies);
        provider
    }

    /// Append a reply to the script
    pub fn push_reply(&self, reply: MockReply) {
        self.script.lock().push_back(reply);
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }

    pub fn remaining_replies(&self) -> usize {
        self.script.lock().len()
    }

    fn last_user_text(messages: &[ChatMessage]) -> String {
        messages
            .iter()
            .rev()
            .filter(|m| m.role == MessageRole::User)
            .find_map(|m| match &m.content {
                MessageContent::Text(text) if !text.is_empty() => Some(text.clone()),
                MessageContent::Parts(parts) => {
                    let text: String = parts
                        .iter()
                        .filter_map(|p| match p {
                            ContentPart::Text { text } => Some(text.as_str()),
                            _ => None,
                        })
                        .collect();
                    (!text.is_empty()).then_some(text)
                }
                _ => None,
            })
            .unwrap_or_else(|| "Hello from MockProvider!".to_string())
    }
}

#[async_trait]
impl Provider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    fn default_api_base(&self) -> &str {
        "http://localhost:0/mock"
    }

    fn requires_api_key(&self) -> bool {
        false
    }

    async fn chat(
        &self,
        messages: Vec<ChatMessage>,
        _model: ProviderModelConfig,
        options: ChatOptions,
        cancel_token: CancellationToken,
    ) -> ProviderResult<ChatResponse> {
        if cancel_token.is_cancelled() {
            return Err(ProviderError::Cancelled);
        }

        self.requests.lock().push(RecordedRequest {
            messages: messages.clone(),
            tool_names: options
                .tools
                .as_ref()
                .map(|tools| tools.iter().map(|t| t.name.clone()).collect()),
            max_tokens: options.max_tokens,
        });

        match &self.mode {
            MockMode::Echo => {
                let text = Self::last_user_text(&messages);
                self.logger.debug(&format!("MockProvider: echoing '{}'", text));
                Ok(ChatResponse::text(format!("Echo: {}", text)))
            }
            MockMode::Fixed(text) => Ok(ChatResponse::text(text.clone())),
            MockMode::Error(message) => Err(ProviderError::Other(format!("Mock error: {}", message))),
            MockMode::Script => {
                let reply = self.script.lock().pop_front();
                match reply {
                    Some(MockReply::Response(response)) => Ok(response),
                    Some(MockReply::Error(message)) => {
                        Err(ProviderError::Other(format!("Mock error: {}", message)))
                    }
                    None => Err(ProviderError::Other("Mock script exhausted".to_string())),
                }
            }
        }
    }
}
