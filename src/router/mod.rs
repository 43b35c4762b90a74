//! Capability routing.
//!
//! An ordered, fixed rule table maps each task's raw text to a capability
//! and a normalized input. The first matching rule wins; there is no
//! scoring and no backtracking. Routing is a pure function of the goal, the
//! raw text, and the table, which keeps both routing and fusion
//! deterministic and testable.

use crate::types::{Capability, RoutedTask, TaskDescriptor};

/// Profile URL pattern for the professional-network rule.
const PROFILE_URL_PATTERN: &str = "linkedin.com/in/";

/// Keyword for the code-hosting rule.
const CODE_HOSTING_KEYWORD: &str = "github";

/// Keyword set for the academic rule, matched per token.
const ACADEMIC_KEYWORDS: &[&str] = &[
    "arxiv",
    "paper",
    "papers",
    "publication",
    "publications",
    "academic",
    "citations",
    "scholar",
];

/// Filler tokens skipped when hunting for a handle after the code-hosting
/// keyword.
const HANDLE_STOPWORDS: &[&str] = &[
    "profile", "page", "account", "user", "username", "handle", "repo", "repos", "at", "on", "is",
    "the", "his", "her", "their", "a", "an", "of", "for", "to",
];

/// One row of the routing table.
struct RouteRule {
    capability: Capability,
    predicate: fn(&str) -> bool,
    extractor: fn(goal: &str, raw: &str) -> Option<String>,
}

/// The fixed rule table, evaluated top to bottom.
const RULES: &[RouteRule] = &[
    RouteRule {
        capability: Capability::LinkedinProfile,
        predicate: |raw| raw.to_lowercase().contains(PROFILE_URL_PATTERN),
        extractor: |_, raw| extract_profile_url(raw),
    },
    RouteRule {
        capability: Capability::GithubProfile,
        predicate: |raw| raw.to_lowercase().contains(CODE_HOSTING_KEYWORD),
        extractor: |_, raw| extract_handle(raw),
    },
    RouteRule {
        capability: Capability::AcademicSearch,
        predicate: contains_academic_keyword,
        extractor: |goal, raw| Some(format!("{} {}", goal, raw)),
    },
];

/// Maps free-text task descriptions to routed tasks.
pub struct Router {
    goal: String,
}

impl Router {
    pub fn new(goal: impl Into<String>) -> Self {
        Self { goal: goal.into() }
    }

    /// Route one descriptor. Identical raw text always yields the identical
    /// routed task (modulo the descriptor id carried through).
    pub fn route(&self, descriptor: &TaskDescriptor) -> RoutedTask {
        for rule in RULES {
            if (rule.predicate)(&descriptor.raw_text) {
                // Extraction failure falls back to the raw text; the task
                // still executes.
                let input = match (rule.extractor)(&self.goal, &descriptor.raw_text) {
                    Some(input) => input,
                    None => {
                        tracing::warn!(
                            task_id = %descriptor.id,
                            capability = %rule.capability,
                            raw = %descriptor.raw_text,
                            "input extraction failed, falling back to raw text"
                        );
                        descriptor.raw_text.clone()
                    }
                };
                return RoutedTask {
                    descriptor: descriptor.clone(),
                    capability: rule.capability,
                    input,
                };
            }
        }

        // Default rule: general search over goal + raw text.
        RoutedTask {
            descriptor: descriptor.clone(),
            capability: Capability::GeneralSearch,
            input: format!("{} {}", self.goal, descriptor.raw_text),
        }
    }

    /// Route a whole plan, preserving order.
    pub fn route_all(&self, descriptors: &[TaskDescriptor]) -> Vec<RoutedTask> {
        descriptors.iter().map(|d| self.route(d)).collect()
    }
}

fn contains_academic_keyword(raw: &str) -> bool {
    raw.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .any(|token| ACADEMIC_KEYWORDS.contains(&token))
}

/// Pull the first profile URL token out of the text.
fn extract_profile_url(raw: &str) -> Option<String> {
    raw.split_whitespace()
        .find(|token| token.to_lowercase().contains(PROFILE_URL_PATTERN))
        .map(|token| token.trim_matches(|c: char| "()<>,;\"'".contains(c)).to_string())
        .filter(|url| !url.is_empty())
}

/// Extract a code-hosting handle from the text.
///
/// If the token carrying the keyword is itself a URL, the trailing path
/// segment is the handle. Otherwise the tokens after the keyword are
/// scanned, skipping filler words, for the first handle-shaped token.
fn extract_handle(raw: &str) -> Option<String> {
    let tokens: Vec<&str> = raw.split_whitespace().collect();
    let keyword_pos = tokens
        .iter()
        .position(|t| t.to_lowercase().contains(CODE_HOSTING_KEYWORD))?;

    let keyword_token = tokens[keyword_pos];
    if keyword_token.to_lowercase().contains("github.com/") {
        return handle_from_url(keyword_token);
    }

    for token in &tokens[keyword_pos + 1..] {
        let cleaned = token.trim_matches(|c: char| "()<>,;:.\"'@".contains(c));
        if cleaned.is_empty() || HANDLE_STOPWORDS.contains(&cleaned.to_lowercase().as_str()) {
            continue;
        }
        if cleaned.contains('/') {
            return handle_from_url(cleaned);
        }
        if cleaned
            .chars()
            .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
        {
            return Some(cleaned.to_string());
        }
    }

    None
}

/// Last non-empty path segment of a URL-shaped token, query stripped.
fn handle_from_url(token: &str) -> Option<String> {
    let trimmed = token.trim_matches(|c: char| "()<>,;\"'".contains(c));
    let without_query = trimmed.split(['?', '#']).next().unwrap_or(trimmed);
    without_query
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .map(|segment| segment.to_string())
        .filter(|segment| !segment.is_empty() && !segment.contains('.'))
}
