//! Issue identifier extraction from commit messages.

use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

/// Matches Linear issue identifiers like `ENG-123` or `TEAM-456`:
/// 2-10 uppercase letters, a hyphen, and digits, word-bounded.
static ISSUE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b([A-Z]{2,10})-(\d+)\b").unwrap());

/// Extract issue identifiers referenced in `texts`.
///
/// Identifiers come back in first-occurrence order across the whole
/// input, with duplicates removed. When `prefix` is non-empty, only
/// identifiers whose team prefix matches it case-insensitively are
/// kept; emitted identifiers preserve their source casing. Lowercase
/// tokens (e.g., `eng-123`) never match the pattern, regardless of
/// the filter.
#[must_use]
pub fn extract_issue_refs<S: AsRef<str>>(texts: &[S], prefix: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut refs = Vec::new();

    for text in texts {
        for caps in ISSUE_PATTERN.captures_iter(text.as_ref()) {
            if !prefix.is_empty() && !caps[1].eq_ignore_ascii_case(prefix) {
                continue;
            }
            let identifier = caps[0].to_string();
            if seen.insert(identifier.clone()) {
                refs.push(identifier);
            }
        }
    }

    refs
}
