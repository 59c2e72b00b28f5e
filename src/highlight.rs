use std::collections::HashSet;

use regex::{Regex, RegexBuilder};

/// Builds the case-insensitive regex used to highlight world-name search
/// hits. Longer tokens are tried first so `"forest"` wins over `"for"`
/// when both are typed.
pub fn build_match_regex(query: &str) -> Option<Regex> {
    let mut unique = Vec::new();
    let mut seen = HashSet::new();
    for token in query.split_whitespace() {
        let lowered = token.to_lowercase();
        if seen.insert(lowered) {
            unique.push(token);
        }
    }
    if unique.is_empty() {
        return None;
    }
    unique.sort_by(|a, b| b.len().cmp(&a.len()));
    let pattern = unique
        .into_iter()
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join("|");
    RegexBuilder::new(&pattern)
        .case_insensitive(true)
        .build()
        .ok()
}

/// Whether a world name matches the query: every whitespace-separated
/// token must appear somewhere in the name, case-insensitively.
pub fn world_matches(world_name: &str, query: &str) -> bool {
    let haystack = world_name.to_lowercase();
    query
        .split_whitespace()
        .all(|token| haystack.contains(&token.to_lowercase()))
}
