//! Plain tool record as listed by a server

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A tool as a server advertises it: name, optional description, input schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "inputSchema", default = "empty_schema")]
    pub input_schema: Value,
}

fn empty_schema() -> Value {
    Value::Object(Map::new())
}

impl ToolDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            input_schema: empty_schema(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_schema(mut self, schema: Value) -> Self {
        self.input_schema = schema;
        self
    }

    /// Description or the empty string
    pub fn description_or_empty(&self) -> &str {
        self.description.as_deref().unwrap_or("")
    }

    /// Names listed under the schema's `required` key
    pub fn required_parameters(&self) -> Vec<String> {
        self.input_schema
            .get("required")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }
}

impl From<rmcp::model::Tool> for ToolDescriptor {
    fn from(tool: rmcp::model::Tool) -> Self {
        Self {
            name: tool.name.to_string(),
            description: tool.description.map(|d| d.to_string()),
            input_schema: Value::Object(tool.input_schema.as_ref().clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_builder_and_required_parameters() {
        let tool = ToolDescriptor::new("build_api_url")
            .with_description("Build an OpenWeatherMap URL")
            .with_schema(json!({
                "type": "object",
                "properties": {"city": {"type": "string"}, "units": {"type": "string"}},
                "required": ["city"]
            }));

        assert_eq!(tool.description_or_empty(), "Build an OpenWeatherMap URL");
        assert_eq!(tool.required_parameters(), vec!["city".to_string()]);
    }

    #[test]
    fn test_missing_description_and_schema() {
        let tool = ToolDescriptor::new("noop");
        assert_eq!(tool.description_or_empty(), "");
        assert!(tool.required_parameters().is_empty());

        let parsed: ToolDescriptor = serde_json::from_value(json!({"name": "bare"})).unwrap();
        assert_eq!(parsed.input_schema, json!({}));
    }

    #[test]
    fn test_from_rmcp_tool() {
        let schema = json!({"type": "object", "properties": {}});
        let tool = rmcp::model::Tool::new(
            "get_secret",
            "Read a secret",
            std::sync::Arc::new(schema.as_object().cloned().unwrap_or_default()),
        );

        let descriptor = ToolDescriptor::from(tool);
        assert_eq!(descriptor.name, "get_secret");
        assert_eq!(descriptor.description.as_deref(), Some("Read a secret"));
        assert_eq!(descriptor.input_schema, schema);
    }
}
