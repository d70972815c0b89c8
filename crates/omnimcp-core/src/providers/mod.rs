//! LLM chat backends
//!
//! - `OpenAiProvider`: OpenAI-compatible `/chat/completions` over reqwest
//! - `MockProvider`: scripted, offline, records what it was sent

mod traits;
mod error;
mod openai;
mod mock;

pub use traits::{Provider, ProviderModelConfig, ChatOptions, ChatResponse};
pub use error::{ProviderError, ProviderResult};
pub use openai::{OpenAiProvider, build_request_body, parse_response, parse_tool_arguments};
pub use mock::{MockProvider, MockMode, MockReply, RecordedRequest};

use crate::logging::Logger;
use std::sync::Arc;

/// Create a provider for the given provider ID
///
/// Every id other than `mock` is assumed to speak the OpenAI protocol; point
/// `api_base` at the gateway for non-OpenAI hosts.
pub fn create_provider(provider_id: &str, logger: Arc<dyn Logger>) -> ProviderResult<Arc<dyn Provider>> {
    let id = provider_id.trim().to_lowercase();
    match id.as_str() {
        "" => Err(ProviderError::UnknownProvider(provider_id.to_string())),
        "mock" => Ok(Arc::new(MockProvider::echo(logger))),
        "openai" => Ok(Arc::new(OpenAiProvider::new(logger))),
        _ => Ok(Arc::new(OpenAiProvider::with_id(id, logger))),
    }
}

/// Provider ids with first-class defaults
pub fn supported_providers() -> Vec<&'static str> {
    vec!["openai", "mock"]
}
