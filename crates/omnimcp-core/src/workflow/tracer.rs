//! Linear workflow tracing over a dependency map

use super::dependency::DependencyMap;

/// Name keywords that mark a tool as a possible workflow entry point
pub const START_KEYWORDS: &[&str] = &["get", "secret", "start"];

/// Successor preference keyed on the current tool's name: when the current
/// tool matches `current`, the first candidate matching `prefer` is taken.
/// Only the first matching row is consulted.
pub const NEXT_STEP_RULES: &[(&[&str], &[&str])] = &[
    (&["secret"], &["url"]),
    (&["url"], &["http", "request"]),
    (&["http", "request"], &["extract", "parse"]),
    (&["extract"], &["format"]),
];

fn contains_any(name: &str, keywords: &[&str]) -> bool {
    let lower = name.to_lowercase();
    keywords.iter().any(|k| lower.contains(k))
}

/// Pick the successor of `current` among `candidates` (non-empty)
fn choose_next<'a>(current: &str, candidates: &[&'a str]) -> &'a str {
    let preferred = NEXT_STEP_RULES
        .iter()
        .find(|(when, _)| contains_any(current, when))
        .and_then(|(_, prefer)| candidates.iter().find(|c| contains_any(c, prefer)));

    match preferred {
        Some(next) => *next,
        None => candidates[0],
    }
}

fn trace_from<'a>(start: &'a str, deps: &'a DependencyMap) -> Vec<&'a str> {
    let mut path = vec![start];
    let mut current = start;

    loop {
        let candidates: Vec<&str> = deps
            .dependents_of(current)
            .filter(|name| !path.contains(name))
            .collect();
        if candidates.is_empty() {
            break;
        }
        let next = choose_next(current, &candidates);
        path.push(next);
        current = next;
    }
    path
}

/// Trace every multi-step workflow reachable from an entry-point tool
///
/// Entry points have no dependencies and a [`START_KEYWORDS`] name. Paths
/// never revisit a tool, so cyclic maps terminate; single-tool paths are
/// dropped. Ties resolve to map order, making the output reproducible.
pub fn trace_workflows(deps: &DependencyMap) -> Vec<Vec<String>> {
    deps.iter()
        .filter(|(name, d)| d.is_empty() && contains_any(name, START_KEYWORDS))
        .map(|(name, _)| trace_from(name, deps))
        .filter(|path| path.len() > 1)
        .map(|path| path.into_iter().map(str::to_string).collect())
        .collect()
}
