//! Builds the system prompt for one server
//!
//! The prompt is assembled from five sections in fixed order (header,
//! workflows, categories, execution rules, domain guidance). Empty sections
//! are dropped before joining so no stray headings or blank runs remain.

use crate::profile::{Domain, ServerProfile, ToolCategory, ToolDescriptor};
use crate::workflow::{infer_workflows, WorkflowPattern};

/// Chain length advertised when no workflow was discovered
pub const DEFAULT_MAX_STEPS: usize = 3;

/// Credential name used by the weather rule when schemas carry no hint
pub const FALLBACK_WEATHER_SECRET: &str = "OWM-API-KEY";

/// Generate the system prompt for `profile`
///
/// Workflows are re-inferred from `live_tools` rather than read from the
/// profile, so the prompt always matches the current connection.
pub fn generate_prompt(profile: &ServerProfile, live_tools: &[ToolDescriptor]) -> String {
    let workflows = infer_workflows(live_tools);

    let sections = [
        header(profile, live_tools.len()),
        workflow_instructions(&workflows),
        tool_categories(profile),
        execution_rules(&workflows),
        domain_guidance(profile, &workflows),
    ];

    sections
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn header(profile: &ServerProfile, tool_count: usize) -> String {
    let domain = profile
        .domain
        .map(|d| d.to_string())
        .unwrap_or_else(|| "general purpose".to_string());

    format!(
        "You are an intelligent {} agent with access to {} specialized tools.\n\n\
         🎯 CRITICAL: Most tasks require MULTIPLE tool calls in sequence. \
         Break every task into atomic steps and execute complete workflows.",
        domain, tool_count
    )
}

fn workflow_instructions(workflows: &[WorkflowPattern]) -> String {
    if workflows.is_empty() {
        return "Execute tools in logical sequence based on dependencies.".to_string();
    }

    let mut lines = vec!["📋 DISCOVERED WORKFLOWS:".to_string()];
    for workflow in workflows {
        let steps = workflow
            .steps
            .iter()
            .map(|s| format!("{}. {}", s.position, s.tool_name))
            .collect::<Vec<_>>()
            .join(" → ");
        lines.push(format!("• {}: {}", workflow.name.to_uppercase(), steps));
        lines.push(format!("  Purpose: {}", workflow.description));
        if !workflow.triggers.is_empty() {
            lines.push(format!(
                "  Triggered by: queries containing '{}'",
                workflow.triggers.join(", ")
            ));
        }
    }
    lines.push("\n⚠️ Execute ALL steps in discovered workflows - don't stop after the first tool.".to_string());
    lines.join("\n")
}

fn tool_categories(profile: &ServerProfile) -> String {
    let lines: Vec<String> = ToolCategory::ALL
        .iter()
        .filter_map(|category| {
            let tools = profile.tools_in(*category);
            (!tools.is_empty()).then(|| format!("• {}: {}", category.label(), tools.join(", ")))
        })
        .collect();

    if lines.is_empty() {
        return String::new();
    }
    format!("🔧 AVAILABLE TOOL CATEGORIES:\n{}", lines.join("\n"))
}

fn execution_rules(workflows: &[WorkflowPattern]) -> String {
    let max_steps = workflows
        .iter()
        .map(WorkflowPattern::len)
        .max()
        .unwrap_or(DEFAULT_MAX_STEPS);

    format!(
        "⚡ EXECUTION RULES:\n\
         • Execute up to {} tools in sequence without stopping\n\
         • Continue automatically between workflow steps\n\
         • Don't ask permission between tool calls\n\
         • Complete entire workflows before providing final response",
        max_steps
    )
}

fn domain_guidance(profile: &ServerProfile, workflows: &[WorkflowPattern]) -> String {
    let mut rules = Vec::new();

    if profile.has_domain(Domain::Weather) {
        let secret = profile.primary_secret_name().unwrap_or(FALLBACK_WEATHER_SECRET);
        rules.push(format!("🔑 CRITICAL: For get_secret tool, use EXACT secret name '{}'", secret));
        rules.push(format!(
            "❌ DO NOT guess secret names like 'weather_api_key' - use '{}'",
            secret
        ));
        rules.push(format!(
            "🌤️ Weather API requires OpenWeatherMap key stored as '{}' in Key Vault",
            secret
        ));
    }

    let any_named = |needle: &str| workflows.iter().any(|w| w.name.to_lowercase().contains(needle));
    if any_named("api") {
        rules.push("🌐 For external data: Always retrieve fresh information via API calls".to_string());
    }
    if any_named("cache") {
        rules.push("💾 Use caching tools for performance optimization".to_string());
    }
    if any_named("ai") {
        rules.push("🤖 Provide AI-enhanced insights when available".to_string());
    }

    if rules.is_empty() {
        return String::new();
    }
    format!("🎯 DOMAIN-SPECIFIC GUIDANCE:\n{}", rules.join("\n"))
}
