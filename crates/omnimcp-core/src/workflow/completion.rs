//! Completion predicates for the tool-calling loop
//!
//! A predicate looks at the (un-namespaced) tool names used in the recent
//! conversation and says whether a discovered workflow was started but not
//! finished, in which case the loop asks the model to continue.

use super::WorkflowPattern;

pub trait CompletionPredicate: Send + Sync {
    fn is_incomplete(&self, used: &[&str]) -> bool;
}

/// Ordered step names of one workflow
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowChecklist {
    steps: Vec<String>,
}

impl WorkflowChecklist {
    pub fn new<I, S>(steps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            steps: steps.into_iter().map(Into::into).collect(),
        }
    }

    pub fn from_pattern(pattern: &WorkflowPattern) -> Self {
        Self::new(pattern.steps.iter().map(|s| s.tool_name.clone()))
    }

    pub fn steps(&self) -> &[String] {
        &self.steps
    }

    /// Number of distinct steps seen in `used`
    pub fn hits(&self, used: &[&str]) -> usize {
        self.steps
            .iter()
            .filter(|step| used.contains(&step.as_str()))
            .count()
    }

    pub fn is_partial(&self, used: &[&str]) -> bool {
        let hits = self.hits(used);
        hits >= 1 && hits < self.steps.len()
    }

    pub fn is_full(&self, used: &[&str]) -> bool {
        !self.steps.is_empty() && self.hits(used) == self.steps.len()
    }
}

impl CompletionPredicate for WorkflowChecklist {
    fn is_incomplete(&self, used: &[&str]) -> bool {
        self.is_partial(used)
    }
}

/// Union over every workflow discovered for a server
///
/// Incomplete while some workflow is partially done and none has finished.
/// With no workflows it never reports incomplete.
#[derive(Debug, Clone, Default)]
pub struct WorkflowCompletion {
    checklists: Vec<WorkflowChecklist>,
}

impl WorkflowCompletion {
    pub fn new(checklists: Vec<WorkflowChecklist>) -> Self {
        Self { checklists }
    }

    pub fn from_patterns(patterns: &[WorkflowPattern]) -> Self {
        Self::new(patterns.iter().map(WorkflowChecklist::from_pattern).collect())
    }

    pub fn is_empty(&self) -> bool {
        self.checklists.is_empty()
    }
}

impl CompletionPredicate for WorkflowCompletion {
    fn is_incomplete(&self, used: &[&str]) -> bool {
        let any_full = self.checklists.iter().any(|c| c.is_full(used));
        let any_partial = self.checklists.iter().any(|c| c.is_partial(used));
        any_partial && !any_full
    }
}
