// ABOUTME: Tag extractor returning every body bounded by a pattern rule, in document order.
// ABOUTME: Matching is a non-greedy scan to the first boundary; nested same-named tags are not balanced.

use std::collections::HashMap;

use aho_corasick::AhoCorasick;

use crate::compiled::{close_tag_matcher, get_or_compile, Boundary};
use crate::rule::PatternRule;

/// Returns the inner text of every region matched by `rule`.
///
/// A region starts right after an opening tag accepted by the rule and ends
/// right before the first boundary that follows it. Neither delimiter is part
/// of the capture. Matches never overlap; scanning resumes after each
/// boundary.
///
/// The scan is not nesting-aware. With a close-tag boundary, a nested element
/// of the same name ends the region early:
///
/// ```
/// use spouts_extract::{extract_tags, PatternRule};
///
/// let rule = PatternRule::new("div", "class", "body", "");
/// let html = r#"<div class="body"><div>inner</div>tail</div>"#;
/// assert_eq!(extract_tags(&rule, html), vec!["<div>inner"]);
/// ```
///
/// An empty vector means the rule did not match; it is never an error.
pub fn extract_tags<'h>(rule: &PatternRule, html: &'h str) -> Vec<&'h str> {
    let compiled = match get_or_compile(rule) {
        Some(c) => c,
        None => return Vec::new(),
    };

    let mut found = Vec::new();
    let mut close_tags: HashMap<String, AhoCorasick> = HashMap::new();
    let mut pos = 0;

    while pos < html.len() {
        let Some(caps) = compiled.open.captures_at(html, pos) else {
            break;
        };
        let Some(open) = caps.get(0) else {
            break;
        };
        let body_start = open.end();
        let rest = &html[body_start..];

        let boundary = match &compiled.end {
            Boundary::Fixed(matcher) => matcher.find(rest),
            Boundary::CloseOfCaptured => {
                let name = caps
                    .get(1)
                    .map(|m| m.as_str().to_ascii_lowercase())
                    .unwrap_or_default();
                if !close_tags.contains_key(&name) {
                    match close_tag_matcher(&name) {
                        Some(matcher) => {
                            close_tags.insert(name.clone(), matcher);
                        }
                        None => {
                            pos = body_start;
                            continue;
                        }
                    }
                }
                close_tags.get(&name).and_then(|matcher| matcher.find(rest))
            }
        };

        match boundary {
            Some(m) => {
                found.push(&rest[..m.start()]);
                pos = body_start + m.end();
            }
            // Unterminated region: try the next opening tag.
            None => pos = body_start,
        }
    }

    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn captures_up_to_explicit_marker() {
        let rule = PatternRule::new(
            "div",
            "class",
            "meldung_wrapper",
            "<!-- AUTHOR-DATA-MARKER-BEGIN",
        );
        let html = r#"<div class="meldung_wrapper">Hello <b>World</b><!-- AUTHOR-DATA-MARKER-BEGIN --></div>"#;
        assert_eq!(extract_tags(&rule, html), vec!["Hello <b>World</b>"]);
    }

    #[test]
    fn accepts_single_quotes_and_extra_attributes() {
        let rule = PatternRule::new("div", "id", "artikel", "");
        let html = r#"<DIV data-x="1" id='artikel' class="wide">text</DIV>"#;
        assert_eq!(extract_tags(&rule, html), vec!["text"]);
    }

    #[test]
    fn attribute_value_is_case_sensitive() {
        let rule = PatternRule::new("div", "class", "Lead", "");
        assert!(extract_tags(&rule, r#"<div class="lead">x</div>"#).is_empty());
        assert_eq!(extract_tags(&rule, r#"<div class="Lead">x</div>"#), vec!["x"]);
    }

    #[test]
    fn attribute_value_must_match_whole_value() {
        let rule = PatternRule::new("div", "class", "lead", "");
        assert!(extract_tags(&rule, r#"<div class="lead big">x</div>"#).is_empty());
    }

    #[test]
    fn attribute_name_needs_word_start() {
        let rule = PatternRule::new("div", "class", "lead", "");
        assert!(extract_tags(&rule, r#"<div data-class="lead">x</div>"#).is_empty());
    }

    #[test]
    fn wildcard_tag_uses_captured_close_tag() {
        let rule = PatternRule::new("", "id", "blocon", "");
        let html = r#"<section id="blocon"><p>a</p></section><p>b</p>"#;
        assert_eq!(extract_tags(&rule, html), vec!["<p>a</p>"]);
    }

    #[test]
    fn close_tag_matches_case_insensitively() {
        let rule = PatternRule::new("span", "class", "date", "");
        assert_eq!(
            extract_tags(&rule, r#"<span class="date">today</SPAN>"#),
            vec!["today"]
        );
    }

    #[test]
    fn returns_all_matches_in_document_order() {
        let rule = PatternRule::new("p", "class", "item", "");
        let html = r#"<p class="item">one</p><p>skip</p><p class="item">two</p>"#;
        assert_eq!(extract_tags(&rule, html), vec!["one", "two"]);
    }

    #[test]
    fn does_not_cross_into_following_sibling() {
        let rule = PatternRule::new("div", "class", "body", "");
        let html = r#"<div class="body">first</div><div class="other">second</div>"#;
        assert_eq!(extract_tags(&rule, html), vec!["first"]);
    }

    #[test]
    fn nested_same_name_ends_region_early() {
        let rule = PatternRule::new("div", "class", "body", "");
        let html = r#"<div class="body">a<div class="inner">b</div>c</div>"#;
        assert_eq!(extract_tags(&rule, html), vec![r#"a<div class="inner">b"#]);
    }

    #[test]
    fn unterminated_region_is_skipped() {
        let rule = PatternRule::new("div", "class", "body", "<!-- end -->");
        let html = r#"<div class="body">never closed</div>"#;
        assert!(extract_tags(&rule, html).is_empty());
    }

    #[test]
    fn body_may_span_lines() {
        let rule = PatternRule::new("div", "id", "artikel", "<div id=\"artikelfuss\">");
        let html = "<div id=\"artikel\">\n<p>one</p>\n<p>two</p>\n<div id=\"artikelfuss\">";
        assert_eq!(extract_tags(&rule, html), vec!["\n<p>one</p>\n<p>two</p>\n"]);
    }

    #[test]
    fn no_match_on_malformed_input() {
        let rule = PatternRule::new("div", "class", "body", "");
        assert!(extract_tags(&rule, "<div class=\"body\"").is_empty());
        assert!(extract_tags(&rule, "<<<>>>").is_empty());
        assert!(extract_tags(&rule, "").is_empty());
    }
}
