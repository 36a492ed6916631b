// ABOUTME: Library entry point for the rule-based full-text extraction engine.
// ABOUTME: Re-exports pattern rules, the tag and content extractors, and the sanitizer.

//! Rule-based article extraction.
//!
//! A source declares an ordered list of [`PatternRule`]s and a
//! [`SanitizerPolicy`]. [`extract_full_content`] tries the rules in order
//! against a raw article page and returns the first match, sanitized.
//!
//! # Example
//!
//! ```
//! use spouts_extract::{extract_full_content, PatternRule, SanitizerPolicy};
//!
//! const RULES: &[PatternRule] = &[PatternRule::new("div", "class", "article", "")];
//! const POLICY: SanitizerPolicy = SanitizerPolicy::new(false, "https://example.com/", true);
//!
//! let page = r#"<div class="article"><a href="/more">more</a></div>"#;
//! let body = extract_full_content(RULES, page, &POLICY);
//! assert_eq!(body.as_deref(), Some(r#"<a href="https://example.com/more">more</a>"#));
//! ```

pub mod compiled;
pub mod content;
pub mod rule;
pub mod sanitize;
pub mod tag;

pub use crate::compiled::precompile_rules;
pub use crate::content::{extract_full_content, extract_with_rule, ContentMatch};
pub use crate::rule::PatternRule;
pub use crate::sanitize::{sanitize, SanitizerPolicy};
pub use crate::tag::extract_tags;
