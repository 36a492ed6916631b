// ABOUTME: Declarative pattern rules locating an article body inside raw page HTML.
// ABOUTME: A rule names a tag, an attribute/value pair on it, and where the captured body ends.

//! Pattern rule definitions.
//!
//! Rules are plain data. Sources declare them as `const` slices, ordered by
//! fallback priority: the first rule with a structural match wins.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;

/// One structural match rule.
///
/// - `tag` empty matches any tag name.
/// - `end` empty means the body ends at the close tag named like the
///   captured opening tag (`</div>` for `<div ...>`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PatternRule {
    #[serde(default)]
    pub tag: Cow<'static, str>,
    pub attr: Cow<'static, str>,
    pub value: Cow<'static, str>,
    #[serde(default)]
    pub end: Cow<'static, str>,
}

impl PatternRule {
    /// Builds a rule from static strings; usable in `const` tables.
    pub const fn new(
        tag: &'static str,
        attr: &'static str,
        value: &'static str,
        end: &'static str,
    ) -> Self {
        Self {
            tag: Cow::Borrowed(tag),
            attr: Cow::Borrowed(attr),
            value: Cow::Borrowed(value),
            end: Cow::Borrowed(end),
        }
    }

    /// Returns true if the rule accepts any tag name.
    pub fn matches_any_tag(&self) -> bool {
        self.tag.is_empty()
    }

    /// Returns true if the body ends at the close tag of the opening tag.
    pub fn ends_at_close_tag(&self) -> bool {
        self.end.is_empty()
    }
}

impl fmt::Display for PatternRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = if self.matches_any_tag() { "*" } else { &self.tag };
        write!(f, "<{} {}=\"{}\">", tag, self.attr, self.value)?;
        if self.ends_at_close_tag() {
            write!(f, " .. </{}>", tag)
        } else {
            write!(f, " .. {}", self.end)
        }
    }
}
