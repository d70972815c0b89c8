//! Lexical dependency analysis between tools

use crate::profile::ToolDescriptor;

/// A tool whose name contains one of `own` depends on every other tool whose
/// name contains one of `predecessors`. Rows are mutually exclusive, first
/// match wins.
#[derive(Debug, Clone, Copy)]
pub struct DependencyRule {
    pub own: &'static [&'static str],
    pub predecessors: &'static [&'static str],
}

pub const DEPENDENCY_RULES: &[DependencyRule] = &[
    DependencyRule {
        own: &["api", "http"],
        predecessors: &["url", "secret"],
    },
    DependencyRule {
        own: &["format"],
        predecessors: &["http", "request", "get", "extract", "parse"],
    },
    DependencyRule {
        own: &["extract"],
        predecessors: &["http", "request", "get"],
    },
    DependencyRule {
        own: &["ai"],
        predecessors: &["format", "extract"],
    },
];

/// `tool -> tools it depends on`, in tool-list order
///
/// Heuristic and possibly cyclic; consumers must not assume a DAG.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyMap {
    entries: Vec<(String, Vec<String>)>,
}

impl DependencyMap {
    pub fn from_entries(entries: Vec<(String, Vec<String>)>) -> Self {
        Self { entries }
    }

    pub fn get(&self, tool: &str) -> Option<&[String]> {
        self.entries
            .iter()
            .find(|(name, _)| name == tool)
            .map(|(_, deps)| deps.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries
            .iter()
            .map(|(name, deps)| (name.as_str(), deps.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Tools that list `tool` as a dependency, in map order
    pub fn dependents_of<'a>(&'a self, tool: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.iter()
            .filter(move |(_, deps)| deps.iter().any(|d| d == tool))
            .map(|(name, _)| name)
    }
}

pub fn analyze_dependencies(tools: &[ToolDescriptor]) -> DependencyMap {
    let lowered: Vec<String> = tools.iter().map(|t| t.name.to_lowercase()).collect();

    let entries = tools
        .iter()
        .enumerate()
        .map(|(i, tool)| {
            let own = &lowered[i];
            let deps = DEPENDENCY_RULES
                .iter()
                .find(|rule| rule.own.iter().any(|k| own.contains(k)))
                .map(|rule| {
                    tools
                        .iter()
                        .enumerate()
                        .filter(|(j, _)| *j != i)
                        .filter(|(j, _)| rule.predecessors.iter().any(|k| lowered[*j].contains(k)))
                        .map(|(_, other)| other.name.clone())
                        .collect()
                })
                .unwrap_or_default();
            (tool.name.clone(), deps)
        })
        .collect();

    DependencyMap { entries }
}
