//! Weighted fuzzy search over the tool catalog.
//!
//! Scores combine direct substring hits on the tool name (strongest),
//! prefix and compact-form matches, description and parameter-name hits,
//! per-token contributions and two multi-signal bonuses, with normalized
//! Levenshtein similarities as tie-breakers. Results below the noise floor
//! are dropped.

use crate::catalog::ServerTool;
use std::cmp::Ordering;

/// Scores below this are noise and never returned.
const MIN_SCORE: f64 = 1.0;

const WEIGHT_NAME_SUBSTRING: f64 = 8.0;
const WEIGHT_NAME_PREFIX: f64 = 3.0;
const WEIGHT_NAME_COMPACT_EXACT: f64 = 6.0;
const WEIGHT_DESCRIPTION_SUBSTRING: f64 = 4.0;
const WEIGHT_PARAMETER_SUBSTRING: f64 = 2.0;
const WEIGHT_NAME_TOKEN: f64 = 1.5;
const WEIGHT_DESCRIPTION_TOKEN: f64 = 0.8;
const WEIGHT_PARAMETER_TOKEN: f64 = 0.5;
const BONUS_ALL_TOKENS_IN_NAME: f64 = 2.0;
const BONUS_EXACT_TOKEN_SET: f64 = 2.5;
const PENALTY_UNUSED_NAME_TOKEN: f64 = 0.1;

pub const DEFAULT_MAX_RESULTS: usize = 3;

/// One search result with the signals that produced its score.
#[derive(Clone, Debug)]
pub struct SearchHit {
    pub tool: ServerTool,
    pub score: f64,
    pub matched_signals: Vec<String>,
}

/// Search the catalog for tools matching a free-text query.
pub fn search_tools(tools: &[ServerTool], query: &str, max_results: usize) -> Vec<SearchHit> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return Vec::new();
    }

    let tokens: Vec<&str> = query.split_whitespace().collect();
    let compact_query = compact(&query);

    let mut hits: Vec<SearchHit> = tools
        .iter()
        .filter_map(|tool| score_tool(tool, &query, &tokens, &compact_query))
        .collect();

    hits.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.tool.spec.name.cmp(&b.tool.spec.name))
    });
    hits.truncate(max_results);
    hits
}

fn score_tool(
    tool: &ServerTool,
    query: &str,
    tokens: &[&str],
    compact_query: &str,
) -> Option<SearchHit> {
    let name = tool.spec.name.to_lowercase();
    let description = tool.spec.description.to_lowercase();
    let name_tokens: Vec<&str> = name.split(['_', '-', ' ']).filter(|t| !t.is_empty()).collect();
    let params = property_names(tool);

    let mut score = 0.0;
    let mut signals: Vec<&'static str> = Vec::new();

    if name.contains(query) {
        score += WEIGHT_NAME_SUBSTRING;
        signals.push("name:substring");
        if name.starts_with(query) {
            score += WEIGHT_NAME_PREFIX;
            signals.push("name:prefix");
        }
    }
    if compact(&name) == compact_query {
        score += WEIGHT_NAME_COMPACT_EXACT;
        signals.push("name:exact");
    }
    if description.contains(query) {
        score += WEIGHT_DESCRIPTION_SUBSTRING;
        signals.push("description:substring");
    }
    if params.iter().any(|p| p.contains(query)) {
        score += WEIGHT_PARAMETER_SUBSTRING;
        signals.push("parameter");
    }

    let mut matched_name_tokens = 0usize;
    for token in tokens {
        if name_tokens.iter().any(|nt| nt.contains(token)) {
            score += WEIGHT_NAME_TOKEN;
            signals.push("name:token");
        }
        if description.contains(token) {
            score += WEIGHT_DESCRIPTION_TOKEN;
            signals.push("description:token");
        }
        if params.iter().any(|p| p.contains(token)) {
            score += WEIGHT_PARAMETER_TOKEN;
            signals.push("parameter:token");
        }
        if name_tokens.iter().any(|nt| nt == token) {
            matched_name_tokens += 1;
        }
    }

    let all_tokens_in_name = !tokens.is_empty()
        && tokens.iter().all(|t| name_tokens.iter().any(|nt| nt == t));
    if all_tokens_in_name {
        score += BONUS_ALL_TOKENS_IN_NAME;
        signals.push("name:all-tokens");
        if name_tokens.iter().all(|nt| tokens.contains(nt)) {
            score += BONUS_EXACT_TOKEN_SET;
            signals.push("name:exact-tokens");
        }
    }

    // Lightly penalize name tokens the query never asked for.
    let unused = name_tokens.len().saturating_sub(matched_name_tokens);
    score -= PENALTY_UNUSED_NAME_TOKEN * unused as f64;

    // Levenshtein tie-breakers on top of the discrete signals.
    score += 2.0 * strsim::normalized_levenshtein(&name, query);
    score += 0.8 * strsim::normalized_levenshtein(&description, query);
    let best_param = params
        .iter()
        .map(|p| strsim::normalized_levenshtein(p, query))
        .fold(0.0f64, f64::max);
    score += 0.6 * best_param;
    score += 0.5 * strsim::normalized_levenshtein(&format!("{name} {description}"), query);

    if score <= MIN_SCORE {
        return None;
    }

    let mut matched_signals: Vec<String> = Vec::new();
    for signal in signals {
        if !matched_signals.iter().any(|s| s == signal) {
            matched_signals.push(signal.to_string());
        }
    }

    Some(SearchHit {
        tool: tool.clone(),
        score,
        matched_signals,
    })
}

fn compact(s: &str) -> String {
    s.chars().filter(|c| !c.is_whitespace() && *c != '_' && *c != '-').collect()
}

/// Lowercased property names from the tool's input schema.
fn property_names(tool: &ServerTool) -> Vec<String> {
    tool.spec
        .input_schema
        .get("properties")
        .and_then(|p| p.as_object())
        .map(|props| props.keys().map(|k| k.to_lowercase()).collect())
        .unwrap_or_default()
}
