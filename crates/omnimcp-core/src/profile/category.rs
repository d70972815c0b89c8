//! Capability category classifier

use serde::{Deserialize, Serialize};

use super::rules::{first_match, KeywordRule};

/// Capability category of a single tool
///
/// Declaration order is the display order on a profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolCategory {
    DataRetrieval,
    DataProcessing,
    ExternalApi,
    StorageCache,
    AiEnhancement,
    Security,
    Utilities,
    Unknown,
}

impl ToolCategory {
    pub const ALL: [ToolCategory; 8] = [
        ToolCategory::DataRetrieval,
        ToolCategory::DataProcessing,
        ToolCategory::ExternalApi,
        ToolCategory::StorageCache,
        ToolCategory::AiEnhancement,
        ToolCategory::Security,
        ToolCategory::Utilities,
        ToolCategory::Unknown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ToolCategory::DataRetrieval => "data_retrieval",
            ToolCategory::DataProcessing => "data_processing",
            ToolCategory::ExternalApi => "external_api",
            ToolCategory::StorageCache => "storage_cache",
            ToolCategory::AiEnhancement => "ai_enhancement",
            ToolCategory::Security => "security",
            ToolCategory::Utilities => "utilities",
            ToolCategory::Unknown => "unknown",
        }
    }

    /// Human-facing label used in prompts
    pub fn label(&self) -> &'static str {
        match self {
            ToolCategory::DataRetrieval => "Data Retrieval",
            ToolCategory::DataProcessing => "Data Processing",
            ToolCategory::ExternalApi => "External Api",
            ToolCategory::StorageCache => "Storage Cache",
            ToolCategory::AiEnhancement => "Ai Enhancement",
            ToolCategory::Security => "Security",
            ToolCategory::Utilities => "Utilities",
            ToolCategory::Unknown => "Unknown",
        }
    }
}

impl std::fmt::Display for ToolCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Name keywords per category, first match wins.
///
/// Order matters: `get_cache_data` is retrieval, not storage.
pub const CATEGORY_RULES: &[KeywordRule<ToolCategory>] = &[
    KeywordRule::new(&["get", "fetch", "retrieve", "read"], ToolCategory::DataRetrieval),
    KeywordRule::new(&["cache", "store", "save"], ToolCategory::StorageCache),
    KeywordRule::new(&["http", "api", "request", "url"], ToolCategory::ExternalApi),
    KeywordRule::new(&["format", "process", "parse", "extract"], ToolCategory::DataProcessing),
    KeywordRule::new(&["ai", "completion", "generate"], ToolCategory::AiEnhancement),
    KeywordRule::new(&["secret", "key", "auth"], ToolCategory::Security),
];

/// Classify a tool by its name
///
/// The description is accepted for signature symmetry with the other
/// detectors but does not influence the category.
pub fn classify_tool(name: &str, _description: Option<&str>) -> ToolCategory {
    first_match(CATEGORY_RULES, &name.to_lowercase()).unwrap_or(ToolCategory::Unknown)
}
