//! Server profile builder

use std::collections::{BTreeMap, BTreeSet};

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::category::{classify_tool, ToolCategory};
use super::descriptor::ToolDescriptor;
use super::domain::{detect_domain, Domain};

/// Quoted upper-case names that look like credentials, e.g. `'OWM-API-KEY'`
static SECRET_NAME_HINT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"['"]([A-Z][A-Z0-9_-]*(?:API|KEY)[A-Z0-9_-]*)['"]"#).expect("valid regex")
});

/// Exact tool-name combinations that mark a well-known server shape
pub const PROFILE_SIGNATURES: &[(&[&str], &str)] = &[
    (&["get_secret", "http_request"], "authenticated_api_workflow"),
    (&["cache_data", "get_cached_data"], "caching_workflow"),
    (&["ai_completion"], "ai_enhanced_workflow"),
];

/// Boolean capability summary computed from tool names
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capabilities {
    pub tool_count: usize,
    pub has_caching: bool,
    pub has_ai_features: bool,
    pub has_external_apis: bool,
    pub has_security: bool,
}

/// Hints pulled out of input schemas
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfiguration {
    /// Secret names the server's secret tool expects, in discovery order
    pub secret_names: Vec<String>,
    /// Required parameters per tool (tools without any are omitted)
    pub expected_parameters: BTreeMap<String, Vec<String>>,
}

/// Derived capability summary for one connected server
///
/// Rebuilt from scratch on every (re)connect and never edited afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerProfile {
    pub server_id: String,
    pub domain: Option<Domain>,
    pub tools: Vec<String>,
    /// Every category is present, possibly with no tools
    pub tool_categories: BTreeMap<ToolCategory, Vec<String>>,
    pub workflow_patterns: Vec<String>,
    pub data_sources: BTreeSet<String>,
    pub capabilities: Capabilities,
    pub configuration: ServerConfiguration,
}

impl ServerProfile {
    pub fn has_domain(&self, domain: Domain) -> bool {
        self.domain == Some(domain)
    }

    pub fn tools_in(&self, category: ToolCategory) -> &[String] {
        self.tool_categories
            .get(&category)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// First secret name discovered in the schemas, if any
    pub fn primary_secret_name(&self) -> Option<&str> {
        self.configuration.secret_names.first().map(String::as_str)
    }
}

/// Build a profile from a server's tool list
///
/// Never fails: missing descriptions read as empty and unexpected schema
/// shapes simply yield no hints.
pub fn build_profile(server_id: &str, tools: &[ToolDescriptor]) -> ServerProfile {
    ServerProfile {
        server_id: server_id.to_string(),
        domain: Some(detect_domain(tools)),
        tools: tools.iter().map(|t| t.name.clone()).collect(),
        tool_categories: categorize(tools),
        workflow_patterns: signature_patterns(tools),
        data_sources: identify_data_sources(tools),
        capabilities: analyze_capabilities(tools),
        configuration: analyze_schemas(tools),
    }
}

fn categorize(tools: &[ToolDescriptor]) -> BTreeMap<ToolCategory, Vec<String>> {
    let mut categories: BTreeMap<ToolCategory, Vec<String>> =
        ToolCategory::ALL.iter().map(|c| (*c, Vec::new())).collect();

    for tool in tools {
        let category = classify_tool(&tool.name, tool.description.as_deref());
        categories.entry(category).or_default().push(tool.name.clone());
    }
    categories
}

fn signature_patterns(tools: &[ToolDescriptor]) -> Vec<String> {
    let names: BTreeSet<String> = tools.iter().map(|t| t.name.to_lowercase()).collect();
    PROFILE_SIGNATURES
        .iter()
        .filter(|(required, _)| required.iter().all(|r| names.contains(*r)))
        .map(|(_, pattern)| pattern.to_string())
        .collect()
}

fn identify_data_sources(tools: &[ToolDescriptor]) -> BTreeSet<String> {
    let mut sources = BTreeSet::new();
    for tool in tools {
        let description = tool.description_or_empty().to_lowercase();
        if description.contains("openweathermap") || description.contains("owm") {
            sources.insert("OpenWeatherMap API".to_string());
        } else if description.contains("api") && tool.name.to_lowercase().contains("http") {
            sources.insert("External API".to_string());
        }
    }
    sources
}

fn analyze_capabilities(tools: &[ToolDescriptor]) -> Capabilities {
    let any_name = |needle: &str| tools.iter().any(|t| t.name.to_lowercase().contains(needle));
    Capabilities {
        tool_count: tools.len(),
        has_caching: any_name("cache"),
        has_ai_features: any_name("ai"),
        has_external_apis: any_name("http"),
        has_security: any_name("secret"),
    }
}

fn analyze_schemas(tools: &[ToolDescriptor]) -> ServerConfiguration {
    let mut config = ServerConfiguration::default();

    for tool in tools {
        let required = tool.required_parameters();
        if !required.is_empty() {
            config.expected_parameters.insert(tool.name.clone(), required);
        }

        if !tool.name.to_lowercase().contains("secret") {
            continue;
        }
        let Some(prop) = tool.input_schema.pointer("/properties/secret_name") else {
            continue;
        };

        let listed = prop
            .get("examples")
            .or_else(|| prop.get("enum"))
            .and_then(Value::as_array);
        let found: Vec<String> = match listed {
            Some(values) => values
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect(),
            None => prop
                .get("description")
                .and_then(Value::as_str)
                .map(|desc| {
                    SECRET_NAME_HINT
                        .captures_iter(desc)
                        .map(|c| c[1].to_string())
                        .collect()
                })
                .unwrap_or_default(),
        };

        for name in found {
            if !config.secret_names.contains(&name) {
                config.secret_names.push(name);
            }
        }
    }
    config
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn weather_tools() -> Vec<ToolDescriptor> {
        vec![
            ToolDescriptor::new("get_secret")
                .with_description("Fetch an API credential from the vault")
                .with_schema(json!({
                    "type": "object",
                    "properties": {
                        "secret_name": {
                            "type": "string",
                            "description": "Name of the secret, e.g. 'OWM-API-KEY'"
                        }
                    },
                    "required": ["secret_name"]
                })),
            ToolDescriptor::new("build_api_url")
                .with_description("Build an OpenWeatherMap URL for current weather"),
            ToolDescriptor::new("http_request").with_description("Call an HTTP API endpoint"),
            ToolDescriptor::new("extract_data_fields")
                .with_description("Pull temperature and conditions from a response"),
            ToolDescriptor::new("format_data").with_description("Render a weather summary"),
        ]
    }

    #[test]
    fn test_weather_profile() {
        let profile = build_profile("weather", &weather_tools());

        assert_eq!(profile.domain, Some(Domain::Weather));
        assert_eq!(profile.tools.len(), 5);
        assert_eq!(profile.tools_in(ToolCategory::DataRetrieval), ["get_secret"]);
        assert_eq!(
            profile.tools_in(ToolCategory::ExternalApi),
            ["build_api_url", "http_request"]
        );
        assert_eq!(
            profile.tools_in(ToolCategory::DataProcessing),
            ["extract_data_fields", "format_data"]
        );
        assert_eq!(profile.workflow_patterns, vec!["authenticated_api_workflow"]);
        assert!(profile.data_sources.contains("OpenWeatherMap API"));
        assert!(profile.data_sources.contains("External API"));
        assert!(profile.capabilities.has_security);
        assert!(profile.capabilities.has_external_apis);
        assert!(!profile.capabilities.has_caching);
        assert_eq!(profile.capabilities.tool_count, 5);
        assert_eq!(profile.primary_secret_name(), Some("OWM-API-KEY"));
        assert_eq!(
            profile.configuration.expected_parameters.get("get_secret"),
            Some(&vec!["secret_name".to_string()])
        );
    }

    #[test]
    fn test_every_category_present() {
        let profile = build_profile("empty", &[]);

        assert_eq!(profile.tool_categories.len(), ToolCategory::ALL.len());
        assert!(profile.tool_categories.values().all(Vec::is_empty));
        assert_eq!(profile.domain, Some(Domain::General));
        assert!(profile.workflow_patterns.is_empty());
        assert!(profile.data_sources.is_empty());
        assert_eq!(profile.capabilities, Capabilities::default());
    }

    #[test]
    fn test_each_tool_in_exactly_one_category() {
        let profile = build_profile("weather", &weather_tools());
        let total: usize = profile.tool_categories.values().map(Vec::len).sum();
        assert_eq!(total, profile.tools.len());
    }

    #[test]
    fn test_secret_names_from_examples_then_enum() {
        let tools = vec![
            ToolDescriptor::new("get_secret").with_schema(json!({
                "properties": {"secret_name": {"examples": ["STRIPE-KEY"], "enum": ["IGNORED"]}}
            })),
            ToolDescriptor::new("secret_lookup").with_schema(json!({
                "properties": {"secret_name": {"enum": ["DB-PASSWORD", "STRIPE-KEY"]}}
            })),
        ];
        let profile = build_profile("vault", &tools);
        assert_eq!(
            profile.configuration.secret_names,
            vec!["STRIPE-KEY".to_string(), "DB-PASSWORD".to_string()]
        );
    }

    #[test]
    fn test_malformed_schema_degrades() {
        let tools = vec![
            ToolDescriptor::new("get_secret").with_schema(json!("not an object")),
            ToolDescriptor::new("secret_store").with_schema(json!({"properties": {"secret_name": 42}})),
        ];
        let profile = build_profile("odd", &tools);
        assert!(profile.configuration.secret_names.is_empty());
        assert!(profile.configuration.expected_parameters.is_empty());
    }

    #[test]
    fn test_caching_signature() {
        let tools = vec![
            ToolDescriptor::new("cache_data"),
            ToolDescriptor::new("get_cached_data"),
            ToolDescriptor::new("ai_completion"),
        ];
        let profile = build_profile("cache", &tools);
        assert_eq!(
            profile.workflow_patterns,
            vec!["caching_workflow", "ai_enhanced_workflow"]
        );
        assert!(profile.capabilities.has_caching);
        assert!(profile.capabilities.has_ai_features);
    }
}
