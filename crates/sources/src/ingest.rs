// ABOUTME: Ingestion pipeline: fetch a configured source's items and resolve their full content.
// ABOUTME: Batch ingestion runs many sources and reports each one's outcome separately.

use futures::stream::{self, StreamExt};
use serde::{Serialize, Serializer};
use spouts_feed::FeedItem;
use tracing::{info, warn};

use crate::config::SourcesFile;
use crate::error::SourceError;
use crate::registry::{ConfiguredSource, SourceRegistry};
use crate::resource::Fetcher;

/// Default number of permalink fetches in flight per source.
pub const DEFAULT_CONCURRENCY: usize = 4;

/// Fetches the feed of `source` and fills in `full_content` for every item.
///
/// At most `concurrency` permalinks are fetched at once; items come back in
/// feed order.
pub async fn ingest(
    source: &ConfiguredSource,
    fetcher: &dyn Fetcher,
    concurrency: usize,
) -> Result<Vec<FeedItem>, SourceError> {
    let items = source.fetch_items(fetcher).await?;
    let total = items.len();

    let resolved: Vec<FeedItem> = stream::iter(items)
        .map(|mut item| async move {
            let content = source.full_content(fetcher, &item).await;
            item.full_content = Some(content);
            item
        })
        .buffered(concurrency.max(1))
        .collect()
        .await;

    info!(
        source = source.type_id(),
        feed_url = source.feed_url(),
        items = total,
        "ingested source"
    );
    Ok(resolved)
}

/// Outcome of ingesting one entry of a sources file.
#[derive(Debug, Serialize)]
pub struct SourceReport {
    pub name: String,
    #[serde(rename = "type")]
    pub type_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feed_url: Option<String>,
    pub items: Vec<FeedItem>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "error_message"
    )]
    pub error: Option<SourceError>,
}

impl SourceReport {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

fn error_message<S>(error: &Option<SourceError>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match error {
        Some(err) => serializer.serialize_str(&err.to_string()),
        None => serializer.serialize_none(),
    }
}

/// Ingests every source listed in `file`, in file order.
///
/// A source that cannot be configured or fetched gets a report carrying its
/// error; the remaining sources still run.
pub async fn ingest_batch(
    registry: &SourceRegistry,
    file: &SourcesFile,
    fetcher: &dyn Fetcher,
) -> Vec<SourceReport> {
    let concurrency = file.concurrency;
    let mut reports = Vec::with_capacity(file.sources.len());

    for entry in &file.sources {
        let name = entry.display_name().to_string();
        let mut report = SourceReport {
            name,
            type_id: entry.type_id.clone(),
            feed_url: None,
            items: Vec::new(),
            error: None,
        };

        match registry.create(&entry.type_id, &entry.params) {
            Ok(source) => {
                report.feed_url = Some(source.feed_url().to_string());
                match ingest(&source, fetcher, concurrency).await {
                    Ok(items) => report.items = items,
                    Err(err) => {
                        warn!(source = %report.name, error = %err, "source failed");
                        report.error = Some(err);
                    }
                }
            }
            Err(err) => {
                warn!(source = %report.name, error = %err, "source misconfigured");
                report.error = Some(err.into());
            }
        }

        reports.push(report);
    }

    reports
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SourceEntry;
    use crate::params::Params;
    use crate::registry::builtin_registry;
    use crate::resource::StaticFetcher;
    use pretty_assertions::assert_eq;

    const FEED: &str = r#"<?xml version="1.0"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>heise online</title>
  <id>urn:heise</id>
  <updated>2024-03-01T12:00:00Z</updated>
  <entry>
    <id>urn:1</id><title>Eins</title><updated>2024-03-01T12:00:00Z</updated>
    <link rel="alternate" href="https://www.heise.de/news/eins.html"/>
    <summary>Teaser eins</summary>
  </entry>
  <entry>
    <id>urn:2</id><title>Zwei</title><updated>2024-03-01T11:00:00Z</updated>
    <link rel="alternate" href="https://www.heise.de/news/zwei.html"/>
    <summary>Teaser zwei</summary>
  </entry>
  <entry>
    <id>urn:3</id><title>Drei</title><updated>2024-03-01T10:00:00Z</updated>
    <link rel="alternate" href="https://www.heise.de/news/drei.html"/>
    <summary>Teaser drei</summary>
  </entry>
</feed>"#;

    fn heise_fetcher() -> StaticFetcher {
        StaticFetcher::new()
            .with_page("https://www.heise.de/newsticker/heise-atom.xml", FEED)
            .with_page(
                "https://www.heise.de/news/eins.html",
                r#"<div class="meldung_wrapper"><p>Voller Text</p><!-- AUTHOR-DATA-MARKER-BEGIN -->"#,
            )
            .with_page(
                "https://www.heise.de/news/drei.html",
                "<html><body>Paywall</body></html>",
            )
    }

    fn entry(type_id: &str, pairs: &[(&str, &str)]) -> SourceEntry {
        SourceEntry {
            name: None,
            type_id: type_id.to_string(),
            params: pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<Params>(),
        }
    }

    #[tokio::test]
    async fn ingest_keeps_order_and_falls_back() {
        let source = builtin_registry().create("heise", &Params::new()).unwrap();
        let items = ingest(&source, &heise_fetcher(), 2).await.unwrap();

        let bodies: Vec<_> = items
            .iter()
            .map(|i| i.full_content.as_deref().unwrap_or_default())
            .collect();
        // zwei.html is not served, drei.html has no matching layout
        assert_eq!(bodies, vec!["<p>Voller Text</p>", "Teaser zwei", "Teaser drei"]);
    }

    #[tokio::test]
    async fn batch_isolates_failures() {
        let file = SourcesFile {
            concurrency: 3,
            sources: vec![
                entry("heise", &[("section", "gone")]),
                entry("nope", &[]),
                entry("feed", &[("url", "https://unreachable.example/rss")]),
                entry("heise", &[]),
            ],
        };

        let reports = ingest_batch(&builtin_registry(), &file, &heise_fetcher()).await;
        assert_eq!(reports.len(), 4);
        assert!(matches!(reports[0].error, Some(SourceError::Config(_))));
        assert!(matches!(reports[1].error, Some(SourceError::Config(_))));
        assert!(matches!(reports[2].error, Some(SourceError::Fetch(_))));
        assert!(reports[3].is_ok());
        assert_eq!(reports[3].items.len(), 3);
        assert_eq!(reports[1].name, "nope");
    }

    #[test]
    fn report_serializes_error_as_message() {
        let report = SourceReport {
            name: "x".into(),
            type_id: "nope".into(),
            feed_url: None,
            items: vec![],
            error: Some(crate::error::ConfigError::UnknownSourceType("nope".into()).into()),
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["error"], "unknown source type `nope`");
        assert_eq!(json["type"], "nope");
        assert!(json.get("feed_url").is_none());
    }
}
