//! Workflow type and step purpose classification

use serde::{Deserialize, Serialize};

use crate::profile::{first_match, KeywordRule};

/// Coarse shape of a traced workflow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowType {
    ApiIntegration,
    DataProcessing,
    AiEnhanced,
    General,
}

impl WorkflowType {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkflowType::ApiIntegration => "api_integration",
            WorkflowType::DataProcessing => "data_processing",
            WorkflowType::AiEnhanced => "ai_enhanced",
            WorkflowType::General => "general",
        }
    }

    /// Pattern name, e.g. `api_integration_workflow`
    pub fn pattern_name(&self) -> String {
        format!("{}_workflow", self.as_str())
    }

    /// Query phrases expected to invoke a workflow of this type
    pub fn triggers(&self) -> &'static [&'static str] {
        match self {
            WorkflowType::ApiIntegration => &["data", "information", "get", "fetch", "what", "show"],
            WorkflowType::DataProcessing => &["process", "analyze", "format", "parse"],
            WorkflowType::AiEnhanced => &["recommend", "suggest", "what should", "advice"],
            WorkflowType::General => &["help", "do", "can you"],
        }
    }

    /// Human label used in descriptions, e.g. `Data Processing`
    pub fn title(&self) -> String {
        self.as_str()
            .split('_')
            .map(|word| {
                let mut chars = word.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                    None => String::new(),
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl std::fmt::Display for WorkflowType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered; evaluated against the joined step names
pub const WORKFLOW_RULES: &[KeywordRule<WorkflowType>] = &[
    KeywordRule::new(&["secret", "url", "http", "request"], WorkflowType::ApiIntegration),
    KeywordRule::new(&["process", "format", "extract"], WorkflowType::DataProcessing),
    KeywordRule::new(&["ai"], WorkflowType::AiEnhanced),
];

/// Classify a traced sequence; falls back to [`WorkflowType::General`]
pub fn classify_workflow<S: AsRef<str>>(sequence: &[S]) -> WorkflowType {
    let joined = sequence
        .iter()
        .map(|s| s.as_ref().to_lowercase())
        .collect::<Vec<_>>()
        .join(" ");
    first_match(WORKFLOW_RULES, &joined).unwrap_or(WorkflowType::General)
}

const PURPOSE_RULES: &[KeywordRule<&str>] = &[
    KeywordRule::new(&["secret"], "Retrieve authentication credentials"),
    KeywordRule::new(&["url"], "Build API endpoint URL"),
    KeywordRule::new(&["http", "request"], "Make external API call"),
    KeywordRule::new(&["extract"], "Extract specific data fields"),
    KeywordRule::new(&["format"], "Format data for human reading"),
    KeywordRule::new(&["ai"], "Generate AI-enhanced insights"),
    KeywordRule::new(&["cache"], "Cache data for performance"),
];

/// One-line purpose of a step, inferred from its name
pub fn tool_purpose(tool_name: &str) -> String {
    match first_match(PURPOSE_RULES, &tool_name.to_lowercase()) {
        Some(purpose) => purpose.to_string(),
        None => format!("Execute {} operation", tool_name),
    }
}

/// Natural-language description of a traced sequence
pub fn describe_workflow<S: AsRef<str>>(workflow_type: WorkflowType, sequence: &[S]) -> String {
    match workflow_type {
        WorkflowType::ApiIntegration => format!(
            "Complete {}-step API integration: {}",
            sequence.len(),
            sequence.iter().map(|s| s.as_ref()).collect::<Vec<&str>>().join(" → ")
        ),
        other => format!("{} workflow with {} steps", other.title(), sequence.len()),
    }
}
