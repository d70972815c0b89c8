//! End-to-end client behaviour with in-process servers and a scripted model

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use omnimcp_core::mcp::{McpError, McpResult};
use omnimcp_core::providers::{MockReply, ProviderModelConfig};
use omnimcp_core::{
    CancellationToken, ChatMessage, ChatOptions, ChatResponse, ClientConfig, ClientError, Domain,
    Logger, MemorySecretStore, MockProvider, NoOpLogger, Provider, ProviderResult, RoutingError,
    SecretResolver, SecretStore, ToolCall, ToolDescriptor, ToolServer, UniversalClient,
};

struct FakeServer {
    id: String,
    tools: Vec<ToolDescriptor>,
    calls: AtomicUsize,
    shut_down: AtomicBool,
}

impl FakeServer {
    fn new(id: &str, tools: Vec<ToolDescriptor>) -> Arc<Self> {
        Arc::new(Self {
            id: id.to_string(),
            tools,
            calls: AtomicUsize::new(0),
            shut_down: AtomicBool::new(false),
        })
    }

    fn weather(id: &str) -> Arc<Self> {
        Self::new(
            id,
            vec![
                ToolDescriptor::new("get_secret")
                    .with_description("Read a secret from Key Vault")
                    .with_schema(json!({
                        "type": "object",
                        "properties": {"secret_name": {"type": "string", "description": "e.g. 'OWM-API-KEY'"}},
                        "required": ["secret_name"]
                    })),
                ToolDescriptor::new("build_api_url").with_description("Build an OpenWeatherMap weather URL"),
                ToolDescriptor::new("http_request").with_description("Call an HTTP API"),
                ToolDescriptor::new("extract_data_fields").with_description("Pull temperature fields"),
                ToolDescriptor::new("format_data").with_description("Render a forecast"),
            ],
        )
    }

    fn finance(id: &str) -> Arc<Self> {
        Self::new(
            id,
            vec![
                ToolDescriptor::new("get_stock_price").with_description("Latest stock price"),
                ToolDescriptor::new("list_market_news"),
            ],
        )
    }
}

#[async_trait]
impl ToolServer for FakeServer {
    fn server_id(&self) -> &str {
        &self.id
    }

    async fn list_tools(&self) -> McpResult<Vec<ToolDescriptor>> {
        Ok(self.tools.clone())
    }

    async fn call_tool(&self, name: &str, arguments: Value) -> McpResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.tools.iter().any(|t| t.name == name) {
            return Err(McpError::ToolNotFound {
                tool: name.to_string(),
                available: self.tools.iter().map(|t| t.name.clone()).collect(),
            });
        }
        Ok(format!("{} -> {}", name, arguments))
    }

    async fn shutdown(&self) -> McpResult<()> {
        self.shut_down.store(true, Ordering::SeqCst);
        Ok(())
    }
}

fn logger() -> Arc<dyn Logger> {
    Arc::new(NoOpLogger::new())
}

fn mock_config() -> ClientConfig {
    ClientConfig {
        provider: "mock".to_string(),
        retry_attempts: 1,
        retry_delay_ms: 1,
        connection_timeout_secs: 2,
        ..ClientConfig::default()
    }
}

fn client_with(provider: Arc<dyn Provider>) -> UniversalClient {
    let secrets = SecretResolver::new(Arc::new(MemorySecretStore::new()), logger());
    UniversalClient::with_provider(mock_config(), provider, secrets, logger()).unwrap()
}

fn tool_calls(server: &str, names: &[&str]) -> MockReply {
    MockReply::Response(ChatResponse::tool_calls(
        names
            .iter()
            .enumerate()
            .map(|(i, n)| ToolCall::new(format!("call_{}", i), format!("{}_{}", server, n), json!({})))
            .collect(),
    ))
}

#[tokio::test]
async fn test_weather_query_runs_full_workflow() {
    let provider = Arc::new(MockProvider::scripted(
        vec![
            tool_calls("srvB", &["get_secret", "build_api_url"]),
            tool_calls("srvB", &["http_request", "extract_data_fields", "format_data"]),
            MockReply::Response(ChatResponse::text("Paris: 18C, cloudy.")),
        ],
        logger(),
    ));
    let client = client_with(provider.clone());

    client.add_server(FakeServer::finance("srvA")).await.unwrap();
    let weather = client.add_server(FakeServer::weather("srvB")).await.unwrap();
    assert_eq!(weather.domain, Some(Domain::Weather));
    assert_eq!(weather.workflow_patterns, vec!["authenticated_api_workflow"]);

    let answer = client.process_query("What's the weather in Paris?").await.unwrap();
    assert_eq!(
        answer,
        "[Executed srvB:get_secret]\n[Executed srvB:build_api_url]\n[Executed srvB:http_request]\n\
         [Executed srvB:extract_data_fields]\n[Executed srvB:format_data]\nParis: 18C, cloudy."
    );

    let requests = provider.requests();
    assert_eq!(requests.len(), 3);

    let system = requests[0].messages[0].text().unwrap();
    assert!(system.starts_with("You are an intelligent weather agent with access to 5 specialized tools."));
    assert!(system.contains("use EXACT secret name 'OWM-API-KEY'"));
    assert!(system.contains("API_INTEGRATION_WORKFLOW"));

    let offered = requests[0].tool_names.as_ref().unwrap();
    assert_eq!(offered.len(), 5);
    assert!(offered.iter().all(|n| n.starts_with("srvB_")));
    assert!(requests[2].tool_names.is_none());
}

#[tokio::test]
async fn test_tool_of_other_server_is_not_executed() {
    let provider = Arc::new(MockProvider::scripted(
        vec![
            tool_calls("fin", &["get_stock_price"]),
            MockReply::Response(ChatResponse::text("done")),
        ],
        logger(),
    ));
    let client = client_with(provider.clone());
    let wx = FakeServer::weather("wx");
    let fin = FakeServer::finance("fin");
    client.add_server(wx.clone()).await.unwrap();
    client.add_server(fin.clone()).await.unwrap();

    let answer = client.process_query("weather in Paris?").await.unwrap();
    assert_eq!(answer, "done");
    assert_eq!(fin.calls.load(Ordering::SeqCst), 0);
    assert_eq!(wx.calls.load(Ordering::SeqCst), 0);

    let requests = provider.requests();
    assert_eq!(requests.len(), 2);
    let offered = requests[0].tool_names.as_ref().unwrap();
    assert!(offered.iter().all(|n| n.starts_with("wx_")));

    let tool_reply = serde_json::to_string(requests[1].messages.last().unwrap()).unwrap();
    assert!(tool_reply.contains("Error: Tool 'fin_get_stock_price' not found"));
}

#[tokio::test]
async fn test_general_query_uses_first_server() {
    let provider = Arc::new(MockProvider::fixed("AAPL is up.", logger()));
    let client = client_with(provider.clone());
    client.add_server(FakeServer::finance("srvA")).await.unwrap();
    client.add_server(FakeServer::weather("srvB")).await.unwrap();

    let answer = client.process_query("How is the market?").await.unwrap();
    assert_eq!(answer, "AAPL is up.");

    let requests = provider.requests();
    let offered = requests[0].tool_names.as_ref().unwrap();
    assert_eq!(offered, &vec!["srvA_get_stock_price".to_string(), "srvA_list_market_news".to_string()]);
}

#[tokio::test]
async fn test_query_without_servers_fails() {
    let client = client_with(Arc::new(MockProvider::echo(logger())));
    let err = client.process_query("anything").await.unwrap_err();
    assert!(matches!(err, ClientError::Routing(RoutingError::NoServerAvailable)));
}

#[tokio::test]
async fn test_readding_server_replaces_profile() {
    let client = client_with(Arc::new(MockProvider::echo(logger())));
    client.add_server(FakeServer::weather("one")).await.unwrap();
    client.add_server(FakeServer::finance("two")).await.unwrap();
    client.add_server(FakeServer::finance("one")).await.unwrap();

    let profiles = client.profiles();
    assert_eq!(profiles.len(), 2);
    assert_eq!(profiles[0].server_id, "one");
    assert_eq!(profiles[0].domain, Some(Domain::Finance));

    let listed = client.list_connected_servers();
    assert_eq!(listed[0].0, "one");
    assert_eq!(listed[0].1, vec!["get_stock_price", "list_market_news"]);
}

#[tokio::test]
async fn test_readding_server_closes_previous_connection() {
    let client = client_with(Arc::new(MockProvider::echo(logger())));
    let first = FakeServer::weather("wx");
    let second = FakeServer::weather("wx");
    client.add_server(first.clone()).await.unwrap();
    client.add_server(second.clone()).await.unwrap();

    assert!(first.shut_down.load(Ordering::SeqCst));
    assert!(!second.shut_down.load(Ordering::SeqCst));
    assert_eq!(client.profiles().len(), 1);

    // Same connection again is kept open
    client.add_server(second.clone()).await.unwrap();
    assert!(!second.shut_down.load(Ordering::SeqCst));

    client.shutdown().await;
    assert!(second.shut_down.load(Ordering::SeqCst));
}

#[tokio::test]
async fn test_shutdown_closes_every_server() {
    let client = client_with(Arc::new(MockProvider::echo(logger())));
    let a = FakeServer::weather("a");
    let b = FakeServer::finance("b");
    client.add_server(a.clone()).await.unwrap();
    client.add_server(b.clone()).await.unwrap();

    client.shutdown().await;

    assert!(a.shut_down.load(Ordering::SeqCst));
    assert!(b.shut_down.load(Ordering::SeqCst));
    assert!(client.profiles().is_empty());
    assert!(client.list_connected_servers().is_empty());
}

#[tokio::test]
async fn test_cancelled_client_stops_queries() {
    let provider = Arc::new(MockProvider::echo(logger()));
    let client = client_with(provider.clone());
    client.add_server(FakeServer::finance("srvA")).await.unwrap();

    client.cancellation_token().cancel();
    let err = client.process_query("hello").await.unwrap_err();

    assert!(matches!(err, ClientError::Cancelled));
    assert_eq!(provider.request_count(), 0);
}

#[tokio::test]
async fn test_auto_discover_without_scripts() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("README.md"), "no servers here").unwrap();

    let client = client_with(Arc::new(MockProvider::echo(logger())));
    let err = client.auto_discover_servers(dir.path()).await.unwrap_err();
    assert!(matches!(err, ClientError::NoScriptsFound(_)));
}

#[tokio::test]
async fn test_connect_missing_script() {
    let client = client_with(Arc::new(MockProvider::echo(logger())));
    let err = client
        .connect_to_server("ghost", std::path::Path::new("/nonexistent/ghost.py"))
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Mcp(McpError::ScriptNotFound(_))));
}

/// Provider that insists on a specific API key
struct KeyedProvider;

#[async_trait]
impl Provider for KeyedProvider {
    fn name(&self) -> &str {
        "keyed"
    }

    fn default_api_base(&self) -> &str {
        "http://localhost:0"
    }

    async fn chat(
        &self,
        _messages: Vec<ChatMessage>,
        model: ProviderModelConfig,
        _options: ChatOptions,
        _cancel_token: CancellationToken,
    ) -> ProviderResult<ChatResponse> {
        Ok(ChatResponse::text(format!("key={}", model.api_key.unwrap_or_default())))
    }
}

#[tokio::test]
async fn test_llm_key_comes_from_secret_store() {
    let store = Arc::new(MemorySecretStore::new());
    store.store("openai-api-key", "sk-test").unwrap();
    let secrets = SecretResolver::new(store, logger());
    let client =
        UniversalClient::with_provider(mock_config(), Arc::new(KeyedProvider), secrets, logger()).unwrap();
    client.add_server(FakeServer::finance("srvA")).await.unwrap();

    assert_eq!(client.process_query("hi").await.unwrap(), "key=sk-test");
}

#[tokio::test]
async fn test_missing_llm_key_is_an_error() {
    let secrets = SecretResolver::new(Arc::new(MemorySecretStore::new()), logger());
    let client =
        UniversalClient::with_provider(mock_config(), Arc::new(KeyedProvider), secrets, logger()).unwrap();
    client.add_server(FakeServer::finance("srvA")).await.unwrap();

    let err = client.process_query("hi").await.unwrap_err();
    assert!(matches!(err, ClientError::Secret(_)));
}
