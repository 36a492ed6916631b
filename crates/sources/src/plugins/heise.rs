// ABOUTME: heise online news plugin with per-section Atom feeds and full article bodies.
// ABOUTME: Holds the section table and the ordered content rules for the site's page layouts.

use async_trait::async_trait;
use spouts_extract::{PatternRule, SanitizerPolicy};

use crate::error::ConfigError;
use crate::params::{ParamKind, ParamSpec, Params};
use crate::source::{ContentRules, Source};

pub const TYPE_ID: &str = "heise";

/// Section keys and labels, in display order.
const SECTION_OPTIONS: &[(&str, &str)] = &[
    ("main", "Hauptseite"),
    ("ct", "c't"),
    ("ix", "iX"),
    ("tr", "Technology Review"),
    ("mac", "Mac & i"),
    ("mobil", "mobil"),
    ("sec", "Security"),
    ("net", "Netze"),
    ("open", "Open Source"),
    ("dev", "Developer"),
    ("tp", "Telepolis"),
    ("resale", "Resale"),
    ("foto", "Foto"),
    ("autos", "Autos"),
    ("hh", "Hardware-Hacks"),
];

/// Feed URL per section key.
const FEED_URLS: &[(&str, &str)] = &[
    ("main", "https://www.heise.de/newsticker/heise-atom.xml"),
    ("ct", "https://www.heise.de/ct/rss/artikel-atom.xml"),
    ("ix", "https://www.heise.de/ix/news/news-atom.xml"),
    ("tr", "https://www.heise.de/tr/news-atom.xml"),
    ("mac", "https://www.heise.de/mac-and-i/news-atom.xml"),
    ("mobil", "https://www.heise.de/mobil/newsticker/heise-atom.xml"),
    ("sec", "https://www.heise.de/security/news/news-atom.xml"),
    ("net", "https://www.heise.de/netze/rss/netze-atom.xml"),
    ("open", "https://www.heise.de/open/news/news-atom.xml"),
    ("dev", "https://www.heise.de/developer/rss/news-atom.xml"),
    ("tp", "https://www.heise.de/tp/news-atom.xml"),
    ("resale", "https://www.heise.de/resale/rss/resale-atom.xml"),
    ("foto", "https://www.heise.de/foto/rss/news-atom.xml"),
    ("autos", "https://www.heise.de/autos/rss/news-atom.xml"),
    ("hh", "https://www.heise.de/hardware-hacks/rss/hardware-hacks-atom.xml"),
];

const PARAMS: &[ParamSpec] = &[ParamSpec {
    key: "section",
    title: "Section",
    kind: ParamKind::Select {
        values: SECTION_OPTIONS,
    },
    default: "main",
    required: true,
    validation: &[],
}];

/// Article layouts, most common first.
pub static RULES: &[PatternRule] = &[
    // main, ix, mac, mobil, sec, net, open, dev, resale, foto, hh
    PatternRule::new("div", "class", "meldung_wrapper", "<!-- AUTHOR-DATA-MARKER-BEGIN"),
    // ct
    PatternRule::new("p", "class", "artikel_datum", "<p class=\"artikel_option\">"),
    // tr
    PatternRule::new("div", "class", "aufmacher", "<!-- AUTHOR-DATA-MARKER-BEGIN"),
    // mac
    PatternRule::new("div", "class", "datum_autor", "<div class=\"artikel_fuss\">"),
    // mobil
    PatternRule::new("p", "class", "vorlauftext", "<div class=\"artikel_fuss\">"),
    // tp
    PatternRule::new("div", "id", "blocon", "</div>"),
    PatternRule::new("div", "class", "mar0", "<div id=\"breadcrumb\">"),
    PatternRule::new("span", "class", "date", "<div xmlns:v=\"http://rdf"),
    // resale
    PatternRule::new("div", "class", "artikel_content", "<div class=\"artikel_fuss\">"),
    // autos
    PatternRule::new("div", "id", "artikel_shortnews", "<p class=\"editor\">"),
    // hh projects, then older hh articles
    PatternRule::new("div", "id", "projekte", "<div id=\"artikelfuss\">"),
    PatternRule::new("div", "id", "artikel", "<div id=\"artikelfuss\">"),
];

pub const POLICY: SanitizerPolicy = SanitizerPolicy::new(false, "https://www.heise.de/", true);

pub struct Heise {
    content: ContentRules,
}

impl Heise {
    pub fn new() -> Self {
        Self {
            content: ContentRules::new(RULES, POLICY),
        }
    }
}

impl Default for Heise {
    fn default() -> Self {
        Self::new()
    }
}

/// Feed URL for a section key, if the key is known.
pub fn section_feed_url(section: &str) -> Option<&'static str> {
    FEED_URLS
        .iter()
        .find(|(key, _)| *key == section)
        .map(|(_, url)| *url)
}

#[async_trait]
impl Source for Heise {
    fn name(&self) -> &'static str {
        "News: Heise"
    }

    fn description(&self) -> &'static str {
        "heise online news with the full article text instead of the teaser"
    }

    fn params(&self) -> &'static [ParamSpec] {
        PARAMS
    }

    fn feed_url(&self, params: &Params) -> Result<String, ConfigError> {
        let section = params.get("section").map(String::as_str).unwrap_or("main");
        section_feed_url(section)
            .map(str::to_string)
            .ok_or_else(|| ConfigError::UnknownSection {
                source_type: TYPE_ID.to_string(),
                section: section.to_string(),
            })
    }

    fn content_rules(&self) -> Option<&ContentRules> {
        Some(&self.content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchError;
    use crate::resource::{FetchResult, Fetcher, StaticFetcher};
    use pretty_assertions::assert_eq;
    use spouts_feed::FeedItem;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct Counting(AtomicUsize);

    #[async_trait]
    impl Fetcher for Counting {
        async fn fetch(&self, url: &str) -> Result<FetchResult, FetchError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Err(FetchError::fetch(url, "Fetch", None))
        }
    }

    fn section(key: &str) -> Params {
        Params::from([("section".to_string(), key.to_string())])
    }

    #[test]
    fn every_section_option_has_a_feed() {
        assert_eq!(SECTION_OPTIONS.len(), 15);
        assert_eq!(FEED_URLS.len(), SECTION_OPTIONS.len());
        for (key, _) in SECTION_OPTIONS {
            assert!(section_feed_url(key).is_some(), "no feed for `{key}`");
        }
        assert_eq!(RULES.len(), 12);
    }

    #[test]
    fn schema_labels_come_from_section_options() {
        let schema = Heise::new().params();
        assert_eq!(schema[0].options(), SECTION_OPTIONS);
        assert_eq!(schema[0].options()[4], ("mac", "Mac & i"));
    }

    #[test]
    fn feed_url_for_known_sections() {
        let heise = Heise::new();
        assert_eq!(
            heise.feed_url(&section("dev")).unwrap(),
            "https://www.heise.de/developer/rss/news-atom.xml"
        );
        assert_eq!(
            heise.feed_url(&Params::new()).unwrap(),
            "https://www.heise.de/newsticker/heise-atom.xml"
        );
    }

    #[tokio::test]
    async fn unknown_section_fails_without_network() {
        let heise = Heise::new();
        let fetcher = Counting::default();

        let err = heise.feed_url(&section("nope")).unwrap_err();
        assert_eq!(err.to_string(), "unknown section `nope` for source `heise`");

        let err = heise
            .fetch_items(&fetcher, &section("nope"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            crate::error::SourceError::Config(ConfigError::UnknownSection { .. })
        ));
        assert_eq!(fetcher.0.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn meldung_wrapper_article() {
        let url = "https://www.heise.de/news/Beispiel-1234.html";
        let page = r#"<html><body>
<div class="meldung_wrapper">Hello <b>World</b><!-- AUTHOR-DATA-MARKER-BEGIN --></div>
</body></html>"#;
        let fetcher = StaticFetcher::new().with_page(url, page);
        let item = FeedItem {
            url: url.into(),
            summary: "teaser".into(),
            ..Default::default()
        };
        let body = Heise::new().full_content(&fetcher, &item).await;
        assert_eq!(body, "Hello <b>World</b>");
    }

    #[tokio::test]
    async fn telepolis_relative_image() {
        let url = "https://www.heise.de/tp/features/x.html";
        let page = r#"<div id="blocon"><img src="/img/a.png"></div>"#;
        let fetcher = StaticFetcher::new().with_page(url, page);
        let item = FeedItem {
            url: url.into(),
            summary: "teaser".into(),
            ..Default::default()
        };
        let body = Heise::new().full_content(&fetcher, &item).await;
        assert_eq!(body, r#"<img src="https://www.heise.de/img/a.png">"#);
    }

    #[tokio::test]
    async fn no_rule_matches_returns_summary() {
        let url = "https://www.heise.de/news/other.html";
        let fetcher =
            StaticFetcher::new().with_page(url, r#"<div class="unrelated">text</div>"#);
        let item = FeedItem {
            url: url.into(),
            summary: "<p>Kurzfassung</p>".into(),
            ..Default::default()
        };
        let body = Heise::new().full_content(&fetcher, &item).await;
        assert_eq!(body, "<p>Kurzfassung</p>");
    }
}
