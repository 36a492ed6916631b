// ABOUTME: Process-wide cache of compiled pattern rule matchers.
// ABOUTME: Each rule is turned into an opening-tag regex plus an end-boundary searcher once.

//! Rule compilation and caching.
//!
//! Building the opening-tag regex is far more expensive than running it, and
//! every source evaluates the same handful of rules for each article. Rules
//! are compiled on first use and shared by all callers afterwards.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use aho_corasick::AhoCorasick;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::rule::PatternRule;

/// Where a captured body ends.
#[derive(Debug)]
pub enum Boundary {
    /// A literal marker known when the rule is compiled: either the rule's
    /// explicit end marker or the close tag of its fixed tag name.
    Fixed(AhoCorasick),
    /// The close tag of whichever tag name the opening match captured.
    CloseOfCaptured,
}

/// A pattern rule ready to run against page HTML.
#[derive(Debug)]
pub struct CompiledRule {
    /// Matches an opening tag; group 1 is the tag name.
    pub open: Regex,
    pub end: Boundary,
}

static RULE_CACHE: Lazy<RwLock<HashMap<PatternRule, Option<Arc<CompiledRule>>>>> =
    Lazy::new(|| RwLock::new(HashMap::new()));

/// Gets or compiles a rule, caching the result.
///
/// Returns `None` if the rule cannot be compiled. Failures are cached too.
pub fn get_or_compile(rule: &PatternRule) -> Option<Arc<CompiledRule>> {
    {
        let cache = RULE_CACHE.read().unwrap_or_else(|e| e.into_inner());
        if let Some(cached) = cache.get(rule) {
            return cached.clone();
        }
    }

    let compiled = compile(rule).map(Arc::new);
    let mut cache = RULE_CACHE.write().unwrap_or_else(|e| e.into_inner());
    if let Some(cached) = cache.get(rule) {
        return cached.clone();
    }
    cache.insert(rule.clone(), compiled.clone());
    compiled
}

/// Compiles a batch of rules into the cache.
///
/// Sources call this at construction so extraction never contends on the
/// write lock.
pub fn precompile_rules<'a, I>(rules: I)
where
    I: IntoIterator<Item = &'a PatternRule>,
{
    let mut cache = RULE_CACHE.write().unwrap_or_else(|e| e.into_inner());
    for rule in rules {
        if !cache.contains_key(rule) {
            let compiled = compile(rule).map(Arc::new);
            cache.insert(rule.clone(), compiled);
        }
    }
}

/// Builds a case-insensitive searcher for `</name>`.
pub fn close_tag_matcher(name: &str) -> Option<AhoCorasick> {
    literal_matcher(&format!("</{}>", name))
}

fn literal_matcher(literal: &str) -> Option<AhoCorasick> {
    AhoCorasick::builder()
        .ascii_case_insensitive(true)
        .build([literal])
        .ok()
}

fn compile(rule: &PatternRule) -> Option<CompiledRule> {
    if rule.attr.is_empty() {
        return None;
    }

    let open = Regex::new(&opening_tag_pattern(rule)).ok()?;
    let end = if !rule.ends_at_close_tag() {
        Boundary::Fixed(literal_matcher(&rule.end)?)
    } else if rule.matches_any_tag() {
        Boundary::CloseOfCaptured
    } else {
        Boundary::Fixed(close_tag_matcher(&rule.tag)?)
    };

    Some(CompiledRule { open, end })
}

/// Opening tag with the wanted attribute anywhere among its attributes.
///
/// Tag and attribute names are case-insensitive; the attribute value must
/// match exactly inside single or double quotes.
fn opening_tag_pattern(rule: &PatternRule) -> String {
    let tag = if rule.matches_any_tag() {
        r"\w+".to_string()
    } else {
        regex::escape(&rule.tag)
    };
    let attr = regex::escape(&rule.attr);
    let value = regex::escape(&rule.value);

    format!(
        r#"<((?i:{tag}))\s(?:[^>]*?\s)?(?i:{attr})\s*=\s*(?:"{value}"|'{value}')[^>]*>"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compiled_rule_is_cached() {
        let rule = PatternRule::new("div", "class", "cached", "");
        let first = get_or_compile(&rule).expect("compiles");
        let second = get_or_compile(&rule).expect("cached");
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn rule_without_attribute_does_not_compile() {
        let rule = PatternRule::new("div", "", "x", "");
        assert!(get_or_compile(&rule).is_none());
        assert!(get_or_compile(&rule).is_none());
    }

    #[test]
    fn boundary_kind_follows_rule_shape() {
        let fixed_tag = compile(&PatternRule::new("div", "id", "a", "")).unwrap();
        assert!(matches!(fixed_tag.end, Boundary::Fixed(_)));

        let captured = compile(&PatternRule::new("", "id", "a", "")).unwrap();
        assert!(matches!(captured.end, Boundary::CloseOfCaptured));

        let marker = compile(&PatternRule::new("", "id", "a", "<!-- end")).unwrap();
        assert!(matches!(marker.end, Boundary::Fixed(_)));
    }

    #[test]
    fn opening_pattern_escapes_metacharacters() {
        let rule = PatternRule::new("div", "class", "a.b+c", "");
        let compiled = compile(&rule).unwrap();
        assert!(compiled.open.is_match(r#"<div class="a.b+c">"#));
        assert!(!compiled.open.is_match(r#"<div class="aXb+c">"#));
    }

    #[test]
    fn opening_pattern_requires_whole_tag_name() {
        let rule = PatternRule::new("p", "class", "lead", "");
        let compiled = compile(&rule).unwrap();
        assert!(compiled.open.is_match(r#"<P class="lead">"#));
        assert!(!compiled.open.is_match(r#"<pre class="lead">"#));
    }

    #[test]
    fn precompile_populates_cache() {
        let rules = [
            PatternRule::new("span", "class", "warm-1", ""),
            PatternRule::new("span", "class", "warm-2", "</span>"),
        ];
        precompile_rules(rules.iter());
        for rule in &rules {
            assert!(get_or_compile(rule).is_some());
        }
    }
}
