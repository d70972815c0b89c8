//! Workflow inference
//!
//! Pure functions over a tool list: lexical dependency analysis, linear
//! tracing, classification and completion checking. Nothing here is cached;
//! callers re-run [`infer_workflows`] against whichever tool snapshot they
//! hold so prompt and completion logic always agree with the live server.

mod classifier;
mod completion;
mod dependency;
mod tracer;

use serde::{Deserialize, Serialize};

use crate::profile::ToolDescriptor;

pub use classifier::{
    classify_workflow, describe_workflow, tool_purpose, WorkflowType, WORKFLOW_RULES,
};
pub use completion::{CompletionPredicate, WorkflowChecklist, WorkflowCompletion};
pub use dependency::{analyze_dependencies, DependencyMap, DependencyRule, DEPENDENCY_RULES};
pub use tracer::{trace_workflows, NEXT_STEP_RULES, START_KEYWORDS};

/// One step of a traced workflow
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowStep {
    pub tool_name: String,
    pub purpose: String,
    /// Tools preceding this one in the workflow, in order
    pub dependencies: Vec<String>,
    /// 1-based
    pub position: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowPattern {
    pub name: String,
    pub workflow_type: WorkflowType,
    pub steps: Vec<WorkflowStep>,
    pub description: String,
    pub triggers: Vec<String>,
}

impl WorkflowPattern {
    /// Build a pattern from a traced sequence of tool names
    pub fn from_sequence(sequence: &[String]) -> Self {
        let workflow_type = classify_workflow(sequence);
        let steps = sequence
            .iter()
            .enumerate()
            .map(|(i, name)| WorkflowStep {
                tool_name: name.clone(),
                purpose: tool_purpose(name),
                dependencies: sequence[..i].to_vec(),
                position: i + 1,
            })
            .collect();

        Self {
            name: workflow_type.pattern_name(),
            workflow_type,
            steps,
            description: describe_workflow(workflow_type, sequence),
            triggers: workflow_type.triggers().iter().map(|t| t.to_string()).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn step_names(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.tool_name.as_str()).collect()
    }
}

/// Discover every multi-step workflow among `tools`
pub fn infer_workflows(tools: &[ToolDescriptor]) -> Vec<WorkflowPattern> {
    let deps = analyze_dependencies(tools);
    trace_workflows(&deps)
        .iter()
        .map(|sequence| WorkflowPattern::from_sequence(sequence))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn weather_tools() -> Vec<ToolDescriptor> {
        [
            "get_secret",
            "build_api_url",
            "http_request",
            "extract_data_fields",
            "format_data",
        ]
        .iter()
        .map(|n| ToolDescriptor::new(*n))
        .collect()
    }

    #[test]
    fn test_weather_tools_infer_one_api_workflow() {
        let workflows = infer_workflows(&weather_tools());

        assert_eq!(workflows.len(), 1);
        let wf = &workflows[0];
        assert_eq!(wf.name, "api_integration_workflow");
        assert_eq!(wf.workflow_type, WorkflowType::ApiIntegration);
        assert_eq!(wf.len(), 5);
        assert_eq!(wf.triggers[0], "data");
        assert!(wf.description.starts_with("Complete 5-step API integration: get_secret → "));
    }

    #[test]
    fn test_step_dependencies_are_prefixes() {
        let workflows = infer_workflows(&weather_tools());
        let wf = &workflows[0];
        let names = wf.step_names();

        for (i, step) in wf.steps.iter().enumerate() {
            assert_eq!(step.position, i + 1);
            assert_eq!(step.dependencies, names[..i]);
        }
        assert_eq!(wf.steps[2].purpose, "Make external API call");
    }

    #[test]
    fn test_no_tools_no_workflows() {
        assert!(infer_workflows(&[]).is_empty());
    }

    #[test]
    fn test_unrelated_tools_no_workflows() {
        let tools = vec![ToolDescriptor::new("get_time"), ToolDescriptor::new("list_files")];
        assert!(infer_workflows(&tools).is_empty());
    }
}
