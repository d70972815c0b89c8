//! OpenAI-compatible chat completions provider
//!
//! Speaks `POST {api_base}/chat/completions` with function tools. Works with
//! OpenAI itself and with compatible gateways (Azure-style proxies,
//! OpenRouter, local servers) through `ProviderModelConfig::api_base`.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Map, Value};

use super::error::{ProviderError, ProviderResult};
use super::traits::{ChatOptions, ChatResponse, Provider, ProviderModelConfig};
use crate::logging::Logger;
use crate::types::{CancellationToken, ChatMessage, ContentPart, MessageContent, MessageRole, Tool, ToolCall};

const OPENAI_API_BASE: &str = "https://api.openai.com/v1";

pub struct OpenAiProvider {
    id: String,
    http: reqwest::Client,
    logger: Arc<dyn Logger>,
}

impl OpenAiProvider {
    pub fn new(logger: Arc<dyn Logger>) -> Self {
        Self::with_id("openai", logger)
    }

    /// Same wire protocol under another provider id
    pub fn with_id(id: impl Into<String>, logger: Arc<dyn Logger>) -> Self {
        Self {
            id: id.into(),
            http: reqwest::Client::new(),
            logger,
        }
    }
}

/// Deserialize a tool-call argument string, falling back to `{}`
pub fn parse_tool_arguments(raw: &str) -> Value {
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => Value::Object(map),
        _ => Value::Object(Map::new()),
    }
}

fn tool_to_wire(tool: &Tool) -> Value {
    json!({
        "type": "function",
        "function": {
            "name": tool.name,
            "description": tool.description,
            "parameters": tool
                .input_schema
                .clone()
                .unwrap_or_else(|| json!({"type": "object", "properties": {}})),
        }
    })
}

/// Expand one message into wire messages; tool results become `role: "tool"` entries
fn message_to_wire(msg: &ChatMessage, out: &mut Vec<Value>) {
    let role = msg.role.to_string();
    let parts = match &msg.content {
        MessageContent::Text(text) => {
            out.push(json!({"role": role, "content": text}));
            return;
        }
        MessageContent::Parts(parts) => parts,
    };

    let text: Vec<&str> = parts
        .iter()
        .filter_map(|p| match p {
            ContentPart::Text { text } => Some(text.as_str()),
            _ => None,
        })
        .collect();

    if msg.role == MessageRole::Assistant {
        let tool_calls: Vec<Value> = parts
            .iter()
            .filter_map(|p| match p {
                ContentPart::ToolUse { id, name, input } => Some(json!({
                    "id": id,
                    "type": "function",
                    "function": {"name": name, "arguments": input.to_string()},
                })),
                _ => None,
            })
            .collect();

        let content = if text.is_empty() {
            Value::Null
        } else {
            Value::String(text.join("\n"))
        };
        let mut wire = json!({"role": role, "content": content});
        if !tool_calls.is_empty() {
            wire["tool_calls"] = Value::Array(tool_calls);
        }
        out.push(wire);
        return;
    }

    for part in parts {
        if let ContentPart::ToolResult { tool_use_id, content } = part {
            out.push(json!({"role": "tool", "tool_call_id": tool_use_id, "content": content}));
        }
    }
    if !text.is_empty() {
        out.push(json!({"role": role, "content": text.join("\n")}));
    }
}

/// Build the JSON request body for `/chat/completions`
pub fn build_request_body(messages: &[ChatMessage], model: &str, options: &ChatOptions) -> Value {
    let mut wire_messages = Vec::with_capacity(messages.len());
    for msg in messages {
        message_to_wire(msg, &mut wire_messages);
    }

    let mut body = json!({
        "model": model,
        "messages": wire_messages,
    });
    if let Some(t) = options.temperature {
        body["temperature"] = json!(t);
    }
    if let Some(n) = options.max_tokens {
        body["max_tokens"] = json!(n);
    }
    if let Some(tools) = options.tools.as_ref().filter(|t| !t.is_empty()) {
        body["tools"] = Value::Array(tools.iter().map(tool_to_wire).collect());
    }
    body
}

/// Extract text and tool calls from a `/chat/completions` response body
pub fn parse_response(provider: &str, body: &Value) -> ProviderResult<ChatResponse> {
    let message = body
        .pointer("/choices/0/message")
        .ok_or_else(|| ProviderError::invalid_response(provider, "missing choices[0].message"))?;

    let text = message
        .get("content")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string);

    let tool_calls = message
        .get("tool_calls")
        .and_then(Value::as_array)
        .map(|calls| {
            calls
                .iter()
                .enumerate()
                .filter_map(|(i, call)| {
                    let name = call.pointer("/function/name")?.as_str()?;
                    let id = call
                        .get("id")
                        .and_then(Value::as_str)
                        .map(str::to_string)
                        .unwrap_or_else(|| format!("call_{}", i));
                    let args = call
                        .pointer("/function/arguments")
                        .and_then(Value::as_str)
                        .map(parse_tool_arguments)
                        .unwrap_or_else(|| Value::Object(Map::new()));
                    Some(ToolCall::new(id, name, args))
                })
                .collect()
        })
        .unwrap_or_default();

    Ok(ChatResponse { text, tool_calls })
}

#[async_trait]
impl Provider for OpenAiProvider {
    fn name(&self) -> &str {
        &self.id
    }

    fn default_api_base(&self) -> &str {
        OPENAI_API_BASE
    }

    async fn chat(
        &self,
        messages: Vec<ChatMessage>,
        model: ProviderModelConfig,
        options: ChatOptions,
        cancel_token: CancellationToken,
    ) -> ProviderResult<ChatResponse> {
        if cancel_token.is_cancelled() {
            return Err(ProviderError::Cancelled);
        }
        let api_key = model
            .api_key
            .clone()
            .ok_or_else(|| ProviderError::missing_api_key(&self.id))?;

        let url = format!("{}/chat/completions", self.get_api_base(&model).trim_end_matches('/'));
        let body = build_request_body(&messages, &model.model, &options);

        crate::log_debug!(
            self.logger,
            "[OpenAiProvider] POST {} ({} messages, {} tools)",
            url,
            messages.len(),
            options.tools.as_ref().map(Vec::len).unwrap_or(0)
        );

        let request = self.http.post(&url).bearer_auth(api_key).json(&body).send();
        let response = cancel_token
            .run_until_cancelled(request)
            .await
            .ok_or(ProviderError::Cancelled)??;

        let status = response.status();
        if status.as_u16() == 429 {
            let message = response.text().await.unwrap_or_default();
            return Err(ProviderError::rate_limited(&self.id, message));
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            crate::log_error!(self.logger, "[OpenAiProvider] {} returned {}", url, status);
            return Err(ProviderError::api_error(&self.id, status.as_u16(), message));
        }

        let json: Value = response.json().await?;
        parse_response(&self.id, &json)
    }
}
