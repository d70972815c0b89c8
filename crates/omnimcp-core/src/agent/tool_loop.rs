//! Tool-calling loop
//!
//! # State Machine
//!
//! ```text
//!   IDLE ──▶ AWAITING_MODEL ──(tool calls)──▶ EXECUTING_TOOLS ──▶ CHECKING_COMPLETION
//!                 ▲      │                                              │      │
//!                 │      └──(text only)──▶ DONE ◀── AWAITING_FINAL ◀────┘      │
//!                 │                                                  (complete │
//!                 └──────────────(incomplete, rounds left)─────────── or bound)┘
//! ```
//!
//! - **AWAITING_MODEL**: one backend call with the server's tools attached
//! - **EXECUTING_TOOLS**: every requested call runs in order; failures become
//!   error results the model sees on its next turn
//! - **CHECKING_COMPLETION**: the completion predicate looks at tool names in
//!   the last [`LOOK_BACK_MESSAGES`] messages
//! - **AWAITING_FINAL**: one backend call without tools for the closing answer

use std::fmt;
use std::sync::Arc;

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::logging::Logger;
use crate::providers::{ChatOptions, ChatResponse, Provider, ProviderModelConfig};
use crate::tools::ToolRegistry;
use crate::types::{CancellationToken, ChatMessage, Tool, ToolCall};
use crate::workflow::CompletionPredicate;

/// Messages inspected when checking workflow completion
pub const LOOK_BACK_MESSAGES: usize = 10;

/// Injected between rounds while a workflow is unfinished
pub const CONTINUE_PROMPT: &str = "Continue with the next step in the workflow.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Idle,
    AwaitingModel,
    ExecutingTools,
    CheckingCompletion,
    AwaitingFinal,
    Done,
}

impl fmt::Display for LoopState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoopState::Idle => write!(f, "IDLE"),
            LoopState::AwaitingModel => write!(f, "AWAITING_MODEL"),
            LoopState::ExecutingTools => write!(f, "EXECUTING_TOOLS"),
            LoopState::CheckingCompletion => write!(f, "CHECKING_COMPLETION"),
            LoopState::AwaitingFinal => write!(f, "AWAITING_FINAL"),
            LoopState::Done => write!(f, "DONE"),
        }
    }
}

/// Backend parameters for one loop run
#[derive(Debug, Clone)]
pub struct LoopSettings {
    pub model: ProviderModelConfig,
    pub max_tokens: u32,
    pub temperature: f32,
    /// Upper bound on model turns that carry tools
    pub max_tool_rounds: u32,
}

impl LoopSettings {
    pub fn from_config(config: &ClientConfig, api_key: Option<String>) -> Self {
        let mut model = ProviderModelConfig::new(&config.model);
        if let Some(key) = api_key {
            model = model.with_api_key(key);
        }
        if let Some(base) = &config.api_base {
            model = model.with_api_base(base);
        }
        Self {
            model,
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            max_tool_rounds: config.max_tool_rounds.max(1),
        }
    }
}

/// Result of a finished loop
#[derive(Debug, Clone)]
pub struct LoopOutcome {
    /// Assistant text and tool markers, newline-joined
    pub response: String,
    /// Model turns that carried tools
    pub rounds: u32,
    pub messages: Vec<ChatMessage>,
    /// Every state entered, in order
    pub trail: Vec<LoopState>,
}

/// Original names of `server_id` tools called by assistant turns among the
/// last `window` messages
pub fn recent_tool_names(
    messages: &[ChatMessage],
    window: usize,
    registry: &ToolRegistry,
    server_id: &str,
) -> Vec<String> {
    let start = messages.len().saturating_sub(window);
    messages[start..]
        .iter()
        .flat_map(|m| m.tool_use_names())
        .filter_map(|name| registry.resolve_in(server_id, name))
        .map(|info| info.original_name)
        .collect()
}

/// Drives one query through the model and the primary server's tools
pub struct ToolLoop<'a> {
    provider: &'a dyn Provider,
    registry: &'a ToolRegistry,
    completion: &'a dyn CompletionPredicate,
    settings: &'a LoopSettings,
    logger: Arc<dyn Logger>,
}

impl<'a> ToolLoop<'a> {
    pub fn new(
        provider: &'a dyn Provider,
        registry: &'a ToolRegistry,
        completion: &'a dyn CompletionPredicate,
        settings: &'a LoopSettings,
        logger: Arc<dyn Logger>,
    ) -> Self {
        Self {
            provider,
            registry,
            completion,
            settings,
            logger,
        }
    }

    pub async fn run(
        &self,
        server_id: &str,
        system_prompt: &str,
        query: &str,
        cancel: &CancellationToken,
    ) -> ClientResult<LoopOutcome> {
        let tools = self.registry.get_llm_tools(server_id);
        let mut messages = vec![ChatMessage::system(system_prompt), ChatMessage::user(query)];
        let mut fragments: Vec<String> = Vec::new();
        let mut pending: Vec<ToolCall> = Vec::new();
        let mut rounds = 0u32;
        let mut state = LoopState::Idle;
        let mut trail = vec![state];

        loop {
            state = match state {
                LoopState::Idle => LoopState::AwaitingModel,

                LoopState::AwaitingModel => {
                    rounds += 1;
                    let response = self.chat(&messages, Some(tools.as_slice()), cancel).await?;
                    if let Some(text) = &response.text {
                        fragments.push(text.clone());
                    }
                    if response.has_tool_calls() {
                        messages.push(ChatMessage::assistant_tool_calls(
                            response.text.as_deref(),
                            &response.tool_calls,
                        ));
                        pending = response.tool_calls;
                        LoopState::ExecutingTools
                    } else {
                        LoopState::Done
                    }
                }

                LoopState::ExecutingTools => {
                    for call in pending.drain(..) {
                        if cancel.is_cancelled() {
                            return Err(ClientError::Cancelled);
                        }
                        let execution = self.registry.execute_tool_call(server_id, &call).await;
                        if let Some(marker) = execution.marker {
                            fragments.push(marker);
                        }
                        messages.push(ChatMessage::tool_result(&call.id, execution.result.content));
                    }
                    LoopState::CheckingCompletion
                }

                LoopState::CheckingCompletion => {
                    let used =
                        recent_tool_names(&messages, LOOK_BACK_MESSAGES, self.registry, server_id);
                    let used: Vec<&str> = used.iter().map(String::as_str).collect();

                    if !self.completion.is_incomplete(&used) {
                        LoopState::AwaitingFinal
                    } else if rounds >= self.settings.max_tool_rounds {
                        crate::log_warn!(
                            self.logger,
                            "[ToolLoop] Workflow still incomplete after {} rounds, finishing",
                            rounds
                        );
                        LoopState::AwaitingFinal
                    } else {
                        crate::log_info!(
                            self.logger,
                            "[ToolLoop] Workflow incomplete after round {}, continuing",
                            rounds
                        );
                        messages.push(ChatMessage::user(CONTINUE_PROMPT));
                        LoopState::AwaitingModel
                    }
                }

                LoopState::AwaitingFinal => {
                    match self.chat(&messages, None, cancel).await {
                        Ok(response) => fragments.extend(response.text),
                        Err(ClientError::Cancelled) => return Err(ClientError::Cancelled),
                        Err(e) => {
                            crate::log_error!(self.logger, "[ToolLoop] Error getting final response: {}", e);
                            fragments.push(format!("[Error getting final response: {}]", e));
                        }
                    }
                    LoopState::Done
                }

                LoopState::Done => break,
            };
            crate::log_debug!(self.logger, "[ToolLoop] -> {}", state);
            trail.push(state);
        }

        Ok(LoopOutcome {
            response: fragments.join("\n"),
            rounds,
            messages,
            trail,
        })
    }

    async fn chat(
        &self,
        messages: &[ChatMessage],
        tools: Option<&[Tool]>,
        cancel: &CancellationToken,
    ) -> ClientResult<ChatResponse> {
        if cancel.is_cancelled() {
            return Err(ClientError::Cancelled);
        }

        let mut options = ChatOptions::new()
            .with_temperature(self.settings.temperature)
            .with_max_tokens(self.settings.max_tokens);
        if let Some(tools) = tools {
            options = options.with_tools(tools.to_vec());
        }

        self.provider
            .chat(messages.to_vec(), self.settings.model.clone(), options, cancel.clone())
            .await
            .map_err(ClientError::from_provider)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::NoOpLogger;
    use crate::mcp::{McpError, McpResult, ToolServer};
    use crate::profile::ToolDescriptor;
    use crate::providers::{MockProvider, MockReply};
    use crate::workflow::{WorkflowChecklist, WorkflowCompletion};
    use async_trait::async_trait;
    use serde_json::{json, Value};

    const WEATHER_STEPS: [&str; 5] = [
        "get_secret",
        "build_api_url",
        "http_request",
        "extract_data_fields",
        "format_data",
    ];

    struct FakeWeather;

    #[async_trait]
    impl ToolServer for FakeWeather {
        fn server_id(&self) -> &str {
            "weather"
        }

        async fn list_tools(&self) -> McpResult<Vec<ToolDescriptor>> {
            Ok(WEATHER_STEPS.iter().map(|n| ToolDescriptor::new(*n)).collect())
        }

        async fn call_tool(&self, name: &str, _arguments: Value) -> McpResult<String> {
            match name {
                "http_request" => Err(McpError::ToolCallFailed("503".to_string())),
                other => Ok(format!("ok:{}", other)),
            }
        }

        async fn shutdown(&self) -> McpResult<()> {
            Ok(())
        }
    }

    struct NeverDone;

    impl CompletionPredicate for NeverDone {
        fn is_incomplete(&self, _used: &[&str]) -> bool {
            true
        }
    }

    fn logger() -> Arc<dyn Logger> {
        Arc::new(NoOpLogger::new())
    }

    fn registry() -> ToolRegistry {
        let registry = ToolRegistry::new(logger());
        let tools: Vec<ToolDescriptor> = WEATHER_STEPS.iter().map(|n| ToolDescriptor::new(*n)).collect();
        registry.register(Arc::new(FakeWeather), &tools);
        registry
    }

    fn settings(max_tool_rounds: u32) -> LoopSettings {
        LoopSettings {
            model: ProviderModelConfig::new("mock-model"),
            max_tokens: 256,
            temperature: 0.0,
            max_tool_rounds,
        }
    }

    fn calls(names: &[&str]) -> MockReply {
        MockReply::Response(ChatResponse::tool_calls(
            names
                .iter()
                .enumerate()
                .map(|(i, n)| ToolCall::new(format!("call_{}_{}", n, i), format!("weather_{}", n), json!({})))
                .collect(),
        ))
    }

    fn text(t: &str) -> MockReply {
        MockReply::Response(ChatResponse::text(t))
    }

    #[tokio::test]
    async fn test_text_only_reply_ends_loop() {
        let provider = MockProvider::scripted(vec![text("Hello!")], logger());
        let registry = registry();
        let checklist = WorkflowChecklist::new(WEATHER_STEPS);
        let settings = settings(10);
        let tool_loop = ToolLoop::new(&provider, &registry, &checklist, &settings, logger());

        let outcome = tool_loop
            .run("weather", "prompt", "hi", &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(outcome.response, "Hello!");
        assert_eq!(outcome.rounds, 1);
        assert_eq!(
            outcome.trail,
            vec![LoopState::Idle, LoopState::AwaitingModel, LoopState::Done]
        );
        let requests = provider.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].tool_names.as_ref().unwrap().len(), 5);
        assert_eq!(requests[0].max_tokens, Some(256));
    }

    #[tokio::test]
    async fn test_partial_workflow_continues_then_finishes() {
        let provider = MockProvider::scripted(
            vec![
                calls(&["get_secret", "build_api_url"]),
                calls(&["http_request", "extract_data_fields", "format_data"]),
                text("Paris: 18C and cloudy."),
            ],
            logger(),
        );
        let registry = registry();
        let checklist = WorkflowChecklist::new(WEATHER_STEPS);
        let settings = settings(10);
        let tool_loop = ToolLoop::new(&provider, &registry, &checklist, &settings, logger());

        let outcome = tool_loop
            .run("weather", "prompt", "weather in Paris?", &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(
            outcome.response,
            "[Executed weather:get_secret]\n\
             [Executed weather:build_api_url]\n\
             [Error: Tool execution failed: Tool call failed: 503]\n\
             [Executed weather:extract_data_fields]\n\
             [Executed weather:format_data]\n\
             Paris: 18C and cloudy."
        );
        assert_eq!(outcome.rounds, 2);

        let requests = provider.requests();
        assert_eq!(requests.len(), 3);
        assert_eq!(
            requests[1].messages.last().and_then(|m| m.text()),
            Some(CONTINUE_PROMPT)
        );
        assert!(requests[2].tool_names.is_none());
        assert_eq!(*outcome.trail.last().unwrap(), LoopState::Done);
        assert!(outcome.trail.contains(&LoopState::AwaitingFinal));
    }

    #[tokio::test]
    async fn test_complete_after_first_round_skips_continue() {
        let provider = MockProvider::scripted(
            vec![calls(&WEATHER_STEPS), text("done")],
            logger(),
        );
        let registry = registry();
        let checklist = WorkflowChecklist::new(WEATHER_STEPS);
        let settings = settings(10);
        let tool_loop = ToolLoop::new(&provider, &registry, &checklist, &settings, logger());

        let outcome = tool_loop
            .run("weather", "prompt", "q", &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(outcome.rounds, 1);
        assert_eq!(provider.request_count(), 2);
        assert!(outcome.response.ends_with("\ndone"));
    }

    #[tokio::test]
    async fn test_round_bound_forces_final() {
        let provider = MockProvider::scripted(
            vec![calls(&["get_secret"]), calls(&["get_secret"]), text("gave up")],
            logger(),
        );
        let registry = registry();
        let settings = settings(2);
        let tool_loop = ToolLoop::new(&provider, &registry, &NeverDone, &settings, logger());

        let outcome = tool_loop
            .run("weather", "prompt", "q", &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(outcome.rounds, 2);
        assert_eq!(provider.request_count(), 3);
        assert_eq!(provider.remaining_replies(), 0);
        assert!(outcome.response.ends_with("gave up"));
    }

    #[tokio::test]
    async fn test_final_failure_becomes_marker() {
        let provider = MockProvider::scripted(
            vec![calls(&WEATHER_STEPS), MockReply::Error("down".to_string())],
            logger(),
        );
        let registry = registry();
        let completion = WorkflowCompletion::default();
        let settings = settings(10);
        let tool_loop = ToolLoop::new(&provider, &registry, &completion, &settings, logger());

        let outcome = tool_loop
            .run("weather", "prompt", "q", &CancellationToken::new())
            .await
            .unwrap();

        assert!(outcome
            .response
            .ends_with("[Error getting final response: Mock error: down]"));
    }

    #[tokio::test]
    async fn test_unknown_tool_reported_to_model() {
        let provider = MockProvider::scripted(
            vec![
                MockReply::Response(ChatResponse::tool_calls(vec![ToolCall::new(
                    "c1",
                    "weather_teleport",
                    json!({}),
                )])),
                text("sorry"),
            ],
            logger(),
        );
        let registry = registry();
        let checklist = WorkflowChecklist::new(WEATHER_STEPS);
        let settings = settings(10);
        let tool_loop = ToolLoop::new(&provider, &registry, &checklist, &settings, logger());

        let outcome = tool_loop
            .run("weather", "prompt", "q", &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(outcome.response, "sorry");
        let final_request = &provider.requests()[1];
        let json = serde_json::to_string(final_request.messages.last().unwrap()).unwrap();
        assert!(json.contains("Error: Tool 'weather_teleport' not found"));
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let provider = MockProvider::scripted(vec![text("never")], logger());
        let registry = registry();
        let checklist = WorkflowChecklist::new(WEATHER_STEPS);
        let settings = settings(10);
        let tool_loop = ToolLoop::new(&provider, &registry, &checklist, &settings, logger());

        let token = CancellationToken::new();
        token.cancel();
        let err = tool_loop.run("weather", "prompt", "q", &token).await.unwrap_err();

        assert!(matches!(err, ClientError::Cancelled));
        assert_eq!(provider.request_count(), 0);
    }

    #[test]
    fn test_recent_tool_names_window() {
        let registry = registry();
        let mut messages = vec![ChatMessage::assistant_tool_calls(
            None,
            &[ToolCall::new("a", "weather_get_secret", json!({}))],
        )];
        for i in 0..10 {
            messages.push(ChatMessage::tool_result(format!("x{}", i), "filler"));
        }
        assert!(recent_tool_names(&messages, LOOK_BACK_MESSAGES, &registry, "weather").is_empty());

        messages.push(ChatMessage::assistant_tool_calls(
            None,
            &[
                ToolCall::new("b", "weather_format_data", json!({})),
                ToolCall::new("c", "weather_unknown", json!({})),
            ],
        ));
        assert_eq!(
            recent_tool_names(&messages, LOOK_BACK_MESSAGES, &registry, "weather"),
            vec!["format_data"]
        );
    }
}
