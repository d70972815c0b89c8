//! Server domain detector

use serde::{Deserialize, Serialize};

use super::descriptor::ToolDescriptor;
use super::rules::{first_match, KeywordRule};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    Weather,
    Finance,
    Productivity,
    Filesystem,
    General,
}

impl Domain {
    pub fn as_str(&self) -> &'static str {
        match self {
            Domain::Weather => "weather",
            Domain::Finance => "finance",
            Domain::Productivity => "productivity",
            Domain::Filesystem => "filesystem",
            Domain::General => "general",
        }
    }
}

impl std::fmt::Display for Domain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

pub const DOMAIN_RULES: &[KeywordRule<Domain>] = &[
    KeywordRule::new(&["weather", "temperature", "forecast"], Domain::Weather),
    KeywordRule::new(&["finance", "stock", "price", "market"], Domain::Finance),
    KeywordRule::new(&["calendar", "task", "todo", "schedule"], Domain::Productivity),
    KeywordRule::new(&["file", "document", "storage"], Domain::Filesystem),
];

/// Guess a server's domain from all tool names and descriptions
///
/// Precedence follows [`DOMAIN_RULES`], not keyword frequency.
pub fn detect_domain(tools: &[ToolDescriptor]) -> Domain {
    let names = tools.iter().map(|t| t.name.as_str());
    let descriptions = tools.iter().filter_map(|t| t.description.as_deref());
    let text = names.chain(descriptions).collect::<Vec<_>>().join(" ").to_lowercase();

    first_match(DOMAIN_RULES, &text).unwrap_or(Domain::General)
}
