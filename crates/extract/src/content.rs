// ABOUTME: Content extractor walking an ordered fallback chain of pattern rules over a page.
// ABOUTME: The first rule with any match wins; its first capture is sanitized and returned.

use tracing::debug;

use crate::rule::PatternRule;
use crate::sanitize::{sanitize, SanitizerPolicy};
use crate::tag::extract_tags;

/// Sanitized body found by a rule of the fallback chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentMatch {
    /// Position of the winning rule in the chain.
    pub rule_index: usize,
    /// Sanitized, trimmed HTML.
    pub content: String,
}

/// Extracts the full article body from `page_html`.
///
/// Rules are tried strictly in order and evaluation stops at the first rule
/// whose sequence of captures is non-empty, even if that capture is empty
/// text. `None` signals an extraction miss; callers fall back to the feed
/// summary.
pub fn extract_full_content(
    rules: &[PatternRule],
    page_html: &str,
    policy: &SanitizerPolicy,
) -> Option<String> {
    extract_with_rule(rules, page_html, policy).map(|m| m.content)
}

/// Like [`extract_full_content`] but also reports which rule matched.
pub fn extract_with_rule(
    rules: &[PatternRule],
    page_html: &str,
    policy: &SanitizerPolicy,
) -> Option<ContentMatch> {
    for (rule_index, rule) in rules.iter().enumerate() {
        let captures = extract_tags(rule, page_html);
        if let Some(first) = captures.first() {
            debug!(rule_index, rule = %rule, matches = captures.len(), "pattern rule matched");
            let content = sanitize(first, policy).trim().to_string();
            return Some(ContentMatch {
                rule_index,
                content,
            });
        }
    }

    debug!(rules = rules.len(), "no pattern rule matched");
    None
}
