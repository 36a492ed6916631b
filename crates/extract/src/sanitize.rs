// ABOUTME: HTML fragment sanitizer run as a streaming filter pass with lol_html.
// ABOUTME: Drops scripts, handlers and (in safe mode) sandbox escapes; rewrites relative URLs to absolute.

//! Fragment sanitizing.
//!
//! The sanitizer never re-serializes a parsed tree. It streams the fragment
//! through `lol_html`, removing or editing only what the policy rejects, so
//! the output keeps the byte shape of the input everywhere else.
//!
//! Always:
//! - `script` and `style` elements are removed with their content
//! - `on*` event handler attributes are removed
//! - relative `href`, `src`, `poster` and `srcset` values are resolved
//!   against the policy's base URL
//!
//! In safe mode additionally:
//! - embedding and document-level elements (`iframe`, `object`, `base`, ...),
//!   foreign content (`svg`, `math`) and form controls are removed, `form`
//!   itself is unwrapped
//! - URL attributes are removed unless, after character references are
//!   decoded, they are relative or use `http`, `https`, `mailto` or `tel`
//!   (`data:` is tolerated on embedded media, never on links)
//!
//! Comments are kept only when the policy allows them.

use std::borrow::Cow;

use html_escape::decode_html_entities;
use lol_html::html_content::Element;
use lol_html::{doc_comments, element, HtmlRewriter, Settings};
use serde::{Deserialize, Serialize};
use tracing::warn;
use url::Url;

/// Safety and rewriting rules applied to an extracted fragment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SanitizerPolicy {
    #[serde(default)]
    pub allow_comments: bool,
    pub base_url: Cow<'static, str>,
    #[serde(default = "default_safe_mode")]
    pub safe_mode: bool,
}

fn default_safe_mode() -> bool {
    true
}

impl SanitizerPolicy {
    /// Builds a policy from static data; usable in `const` declarations.
    pub const fn new(allow_comments: bool, base_url: &'static str, safe_mode: bool) -> Self {
        Self {
            allow_comments,
            base_url: Cow::Borrowed(base_url),
            safe_mode,
        }
    }

    /// Safe policy resolving against `base_url`, comments stripped.
    pub fn strict(base_url: impl Into<String>) -> Self {
        Self {
            allow_comments: false,
            base_url: Cow::Owned(base_url.into()),
            safe_mode: true,
        }
    }
}

/// Elements removed with their content regardless of mode.
const ALWAYS_REMOVED: &[&str] = &["script", "style"];

/// Elements removed with their content in safe mode.
const UNSAFE_ELEMENTS: &[&str] = &[
    "iframe", "frame", "frameset", "object", "embed", "applet", "base", "meta", "link", "input",
    "button", "select", "textarea", "keygen", "svg", "math",
];

/// Attributes holding a URL, checked for script schemes in safe mode.
const URL_ATTRIBUTES: &[&str] = &[
    "href",
    "src",
    "poster",
    "action",
    "formaction",
    "background",
    "cite",
    "xlink:href",
];

/// URL attributes that navigate when followed.
const LINK_ATTRIBUTES: &[&str] = &["href", "xlink:href", "action", "formaction"];

/// Attributes rewritten to absolute URLs.
const REWRITTEN_ATTRIBUTES: &[&str] = &["href", "src", "poster", "xlink:href"];

const SAFE_SCHEMES: &[&str] = &["http", "https", "mailto", "tel"];

/// Sanitizes an HTML fragment according to `policy`.
///
/// Never fails: malformed markup passes through the filter as the tokenizer
/// sees it. If the rewriter itself errors, the fragment is dropped rather than
/// returned unsanitized.
pub fn sanitize(fragment: &str, policy: &SanitizerPolicy) -> String {
    let base = match Url::parse(&policy.base_url) {
        Ok(url) => Some(url),
        Err(err) => {
            if !policy.base_url.is_empty() {
                warn!(base_url = %policy.base_url, error = %err, "invalid base url, relative links kept");
            }
            None
        }
    };
    let safe_mode = policy.safe_mode;

    let mut element_content_handlers = Vec::new();
    for tag in ALWAYS_REMOVED {
        element_content_handlers.push(element!(tag, |el| {
            el.remove();
            Ok(())
        }));
    }
    if safe_mode {
        for tag in UNSAFE_ELEMENTS {
            element_content_handlers.push(element!(tag, |el| {
                el.remove();
                Ok(())
            }));
        }
        element_content_handlers.push(element!("form", |el| {
            el.remove_and_keep_content();
            Ok(())
        }));
    }
    element_content_handlers.push(element!("*", |el| {
        scrub_attributes(el, safe_mode, base.as_ref());
        Ok(())
    }));

    let document_content_handlers = if policy.allow_comments {
        vec![]
    } else {
        vec![doc_comments!(|c| {
            c.remove();
            Ok(())
        })]
    };

    let mut output = Vec::with_capacity(fragment.len());
    let result = {
        let mut rewriter = HtmlRewriter::new(
            Settings {
                element_content_handlers,
                document_content_handlers,
                ..Default::default()
            },
            |chunk: &[u8]| output.extend_from_slice(chunk),
        );
        match rewriter.write(fragment.as_bytes()) {
            Ok(()) => rewriter.end(),
            Err(err) => Err(err),
        }
    };

    match result {
        Ok(()) => String::from_utf8_lossy(&output).into_owned(),
        Err(err) => {
            warn!(error = %err, "sanitizer rejected fragment");
            String::new()
        }
    }
}

fn scrub_attributes(el: &mut Element<'_, '_>, safe_mode: bool, base: Option<&Url>) {
    let names: Vec<String> = el.attributes().iter().map(|a| a.name()).collect();

    for name in names {
        if name.starts_with("on") {
            el.remove_attribute(&name);
            continue;
        }
        if name == "srcset" {
            scrub_srcset(el, safe_mode, base);
            continue;
        }
        if !URL_ATTRIBUTES.contains(&name.as_str()) {
            continue;
        }
        let Some(value) = el.get_attribute(&name) else {
            continue;
        };

        if safe_mode && !is_safe_url(&value, &name) {
            el.remove_attribute(&name);
            continue;
        }

        if let Some(base) = base {
            if REWRITTEN_ATTRIBUTES.contains(&name.as_str()) {
                if let Some(absolute) = absolutize(base, &value) {
                    let _ = el.set_attribute(&name, &absolute);
                }
            }
        }
    }
}

/// Checks and absolutizes every candidate URL of a `srcset` list.
fn scrub_srcset(el: &mut Element<'_, '_>, safe_mode: bool, base: Option<&Url>) {
    let Some(value) = el.get_attribute("srcset") else {
        return;
    };

    let mut candidates = Vec::new();
    for candidate in value.split(',') {
        let candidate = candidate.trim();
        if candidate.is_empty() {
            continue;
        }
        let (url, descriptor) = match candidate.split_once(char::is_whitespace) {
            Some((url, descriptor)) => (url, descriptor.trim()),
            None => (candidate, ""),
        };
        if safe_mode && !is_safe_url(url, "srcset") {
            el.remove_attribute("srcset");
            return;
        }
        let url = base
            .and_then(|base| absolutize(base, url))
            .unwrap_or_else(|| url.to_string());
        if descriptor.is_empty() {
            candidates.push(url);
        } else {
            candidates.push(format!("{url} {descriptor}"));
        }
    }

    let _ = el.set_attribute("srcset", &candidates.join(", "));
}

/// Resolves a relative reference against `base`.
///
/// Returns `None` when the value should stay as written: empty values,
/// same-page fragments and references that already carry a scheme.
pub fn absolutize(base: &Url, value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return None;
    }
    if Url::parse(trimmed).is_ok() {
        return None;
    }
    base.join(trimmed).ok().map(String::from)
}

/// Returns true when a URL attribute value is relative or uses a safe scheme.
///
/// Character references are decoded and whitespace and control characters
/// dropped first, the way browsers read the scheme.
fn is_safe_url(value: &str, attr: &str) -> bool {
    let normalized: String = decode_html_entities(value)
        .chars()
        .filter(|c| !c.is_whitespace() && !c.is_control())
        .collect::<String>()
        .to_ascii_lowercase()
        .replace("&colon;", ":");

    // References left undecoded ahead of the path may still hide a colon
    let head = &normalized[..normalized.find(['/', '?']).unwrap_or(normalized.len())];
    if head.contains("&#") {
        return false;
    }

    match url_scheme(&normalized) {
        None => true,
        Some("data") => !LINK_ATTRIBUTES.contains(&attr),
        Some(scheme) => SAFE_SCHEMES.contains(&scheme),
    }
}

/// The scheme of `value`, if a colon precedes any path or query.
fn url_scheme(value: &str) -> Option<&str> {
    if value.starts_with('#') {
        return None;
    }
    let end = value.find([':', '/', '?'])?;
    (value.as_bytes()[end] == b':').then(|| &value[..end])
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SAFE: SanitizerPolicy = SanitizerPolicy::new(false, "https://example.com/", true);
    const LOOSE: SanitizerPolicy = SanitizerPolicy::new(true, "https://example.com/", false);

    #[test]
    fn removes_script_and_style_always() {
        let html = r#"<p>ok</p><script>alert(1)</script><style>p{}</style>"#;
        assert_eq!(sanitize(html, &SAFE), "<p>ok</p>");
        assert_eq!(sanitize(html, &LOOSE), "<p>ok</p>");
    }

    #[test]
    fn removes_event_handlers_always() {
        let html = r#"<img src="https://cdn.test/a.png" onerror="x()" alt="a">"#;
        assert_eq!(
            sanitize(html, &LOOSE),
            r#"<img src="https://cdn.test/a.png" alt="a">"#
        );
    }

    #[test]
    fn relative_urls_become_absolute() {
        assert_eq!(
            sanitize(r#"<a href="foo/bar">x</a>"#, &SAFE),
            r#"<a href="https://example.com/foo/bar">x</a>"#
        );
        assert_eq!(
            sanitize(r#"<img src="//cdn.example.org/p.png">"#, &SAFE),
            r#"<img src="https://cdn.example.org/p.png">"#
        );
    }

    #[test]
    fn absolute_urls_are_untouched() {
        let html = r#"<a href="http://other.test/a?b=1&amp;c=2">x</a><a href="mailto:a@b.test">m</a>"#;
        assert_eq!(sanitize(html, &SAFE), html);
    }

    #[test]
    fn fragment_links_stay_relative() {
        let html = r##"<a href="#top">up</a>"##;
        assert_eq!(sanitize(html, &SAFE), html);
    }

    #[test]
    fn comments_follow_policy() {
        let html = "<p>a</p><!-- note --><p>b</p>";
        assert_eq!(sanitize(html, &SAFE), "<p>a</p><p>b</p>");
        assert_eq!(sanitize(html, &LOOSE), html);
    }

    #[test]
    fn safe_mode_strips_embeds_and_controls() {
        let html = r#"<p>a</p><iframe src="https://evil.test"></iframe><form action="/x"><input name="q">text</form>"#;
        assert_eq!(sanitize(html, &SAFE), "<p>a</p>text");
    }

    #[test]
    fn loose_mode_keeps_embeds() {
        let html = r#"<iframe src="https://video.test/e"></iframe>"#;
        assert_eq!(sanitize(html, &LOOSE), html);
    }

    #[test]
    fn safe_mode_strips_script_urls() {
        let html = r#"<a href="javascript&#x3A;alert(1)">a</a><a href=" JavaScript:alert(1)">b</a>"#;
        let out = sanitize(html, &SAFE);
        assert!(!out.to_ascii_lowercase().contains("javascript"), "got: {out}");
        assert!(out.contains(">a</a>"));
        assert!(out.contains(">b</a>"));
    }

    #[test]
    fn safe_mode_strips_foreign_content() {
        let html = r#"<p>a</p><svg><a><animate attributeName="href" values="javascript:alert(1)"/><text>x</text></a></svg><math><mi>y</mi></math>"#;
        assert_eq!(sanitize(html, &SAFE), "<p>a</p>");
    }

    #[test]
    fn safe_mode_decodes_references_before_scheme_check() {
        let html = r#"<a href="&#106;avascript:alert(1)">a</a><a xlink:href="&#x6A;avascript&colon;alert(1)">b</a><a href="java&#x09;script:x">c</a>"#;
        assert_eq!(sanitize(html, &SAFE), "<a>a</a><a>b</a><a>c</a>");
    }

    #[test]
    fn script_urls_dropped_even_without_base() {
        let policy = SanitizerPolicy::new(false, "", true);
        let html = r#"<a href="&#106;avascript:alert(1)">a</a><a href="vbscript:x">b</a><a href="/ok">c</a>"#;
        assert_eq!(sanitize(html, &policy), r#"<a>a</a><a>b</a><a href="/ok">c</a>"#);
    }

    #[test]
    fn data_urls_allowed_on_media_only() {
        let html = r#"<img src="data:image/png;base64,AAAA"><a href="data:text/html,x">d</a>"#;
        assert_eq!(
            sanitize(html, &SAFE),
            r#"<img src="data:image/png;base64,AAAA"><a>d</a>"#
        );
    }

    #[test]
    fn srcset_candidates_become_absolute() {
        let html = r#"<img srcset="small.png 480w, /big.png 2x, https://cdn.test/c.png">"#;
        assert_eq!(
            sanitize(html, &SAFE),
            r#"<img srcset="https://example.com/small.png 480w, https://example.com/big.png 2x, https://cdn.test/c.png">"#
        );
    }

    #[test]
    fn srcset_with_script_url_is_dropped() {
        let html = r#"<img srcset="a.png 1x, javascript:alert(1) 2x" alt="i">"#;
        assert_eq!(sanitize(html, &SAFE), r#"<img alt="i">"#);
    }

    #[test]
    fn url_scheme_detection() {
        assert_eq!(url_scheme("javascript:x"), Some("javascript"));
        assert_eq!(url_scheme("a/b:c"), None);
        assert_eq!(url_scheme("//cdn.test/x"), None);
        assert_eq!(url_scheme("?q=a:b"), None);
        assert_eq!(url_scheme("plain"), None);
        assert_eq!(url_scheme("#sec:2"), None);
        assert!(!is_safe_url("&#106avascript:alert(1)", "href"));
        assert!(!is_safe_url("javascript&#58alert(1)", "href"));
        assert!(is_safe_url("https://a.test/?q=&#38;", "href"));
    }

    #[test]
    fn invalid_base_keeps_relative_links() {
        let policy = SanitizerPolicy::new(false, "not a url", true);
        let html = r#"<img src="/img/x.png">"#;
        assert_eq!(sanitize(html, &policy), html);
    }

    #[test]
    fn unbalanced_input_gains_no_tags() {
        let html = "<div><p>open";
        assert_eq!(sanitize(html, &SAFE), html);
    }

    #[test]
    fn absolutize_skips_schemes() {
        let base = Url::parse("https://www.example.de/news/").unwrap();
        assert_eq!(
            absolutize(&base, "/img/x.png").as_deref(),
            Some("https://www.example.de/img/x.png")
        );
        assert_eq!(
            absolutize(&base, "a.html").as_deref(),
            Some("https://www.example.de/news/a.html")
        );
        assert_eq!(absolutize(&base, "https://a.test/"), None);
        assert_eq!(absolutize(&base, "  "), None);
    }
}
