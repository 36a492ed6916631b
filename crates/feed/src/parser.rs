// ABOUTME: Feed parsing implementation using feed-rs.
// ABOUTME: Maps feed-rs types to internal models and sanitizes item summaries against their links.

use crate::error::FeedError;
use crate::models::{Author, Feed, FeedItem};
use chrono::Utc;
use feed_rs::model::{Entry, Link, Person};
use spouts_extract::{sanitize, SanitizerPolicy};
use tracing::debug;

/// Parses feed bytes into a Feed struct.
///
/// # Arguments
/// * `data` - Raw feed bytes (RSS, Atom, or JSON Feed)
/// * `feed_url` - The URL the feed was fetched from (stored as-is)
///
/// # Returns
/// * `Ok(Feed)` - Successfully parsed feed, possibly without items
/// * `Err(FeedError)` - Empty input or parse failure
pub fn parse_feed_bytes(data: &[u8], feed_url: &str) -> Result<Feed, FeedError> {
    if data.iter().all(u8::is_ascii_whitespace) {
        return Err(FeedError::Empty);
    }

    let parsed = feed_rs::parser::parse(data).map_err(FeedError::parse)?;
    debug!(feed_url, entries = parsed.entries.len(), "parsed feed");

    let items: Vec<FeedItem> = parsed
        .entries
        .iter()
        .map(|entry| map_entry(entry, feed_url))
        .collect();

    Ok(Feed {
        title: parsed.title.map(|t| t.content).unwrap_or_default(),
        home_url: extract_home_url(&parsed.links),
        feed_url: feed_url.to_string(),
        description: parsed.description.map(|d| d.content).unwrap_or_default(),
        language: parsed.language,
        updated_ms: parsed
            .updated
            .or(parsed.published)
            .map(|dt| dt.timestamp_millis() as u64)
            .unwrap_or_else(|| Utc::now().timestamp_millis() as u64),
        items,
    })
}

/// Checks if a link is an enclosure link.
fn is_enclosure_link(link: &Link) -> bool {
    link.rel.as_deref() == Some("enclosure")
}

/// Extracts the home URL from feed links.
/// Prefers link with rel="alternate", otherwise uses first link href.
fn extract_home_url(links: &[Link]) -> String {
    for link in links {
        if link.rel.as_deref() == Some("alternate") {
            return link.href.clone();
        }
    }

    links.first().map(|l| l.href.clone()).unwrap_or_default()
}

/// Extracts the item URL from entry links.
/// Prefers link with rel="alternate", otherwise first non-enclosure link, then entry.id.
fn extract_item_url(entry: &Entry) -> String {
    for link in &entry.links {
        if link.rel.as_deref() == Some("alternate") {
            return link.href.clone();
        }
    }

    for link in &entry.links {
        if !is_enclosure_link(link) {
            return link.href.clone();
        }
    }

    entry.id.clone()
}

/// Maps a feed-rs Entry to our FeedItem model.
fn map_entry(entry: &Entry, feed_url: &str) -> FeedItem {
    let item_url = extract_item_url(entry);

    // Summary falls back to the content body when the feed only ships content
    let summary_html = entry
        .summary
        .as_ref()
        .map(|t| t.content.clone())
        .filter(|s| !s.trim().is_empty())
        .or_else(|| entry.content.as_ref().and_then(|c| c.body.clone()))
        .unwrap_or_default();

    let base = if item_url.starts_with("http") {
        item_url.as_str()
    } else {
        feed_url
    };
    let summary = sanitize(&summary_html, &SanitizerPolicy::strict(base))
        .trim()
        .to_string();

    let published_ms = entry
        .published
        .map(|dt| dt.timestamp_millis() as u64)
        .unwrap_or(0);
    let updated_ms = entry
        .updated
        .or(entry.published)
        .map(|dt| dt.timestamp_millis() as u64)
        .unwrap_or(0);

    FeedItem {
        title: entry
            .title
            .as_ref()
            .map(|t| t.content.clone())
            .unwrap_or_default(),
        url: item_url,
        guid: entry.id.clone(),
        summary,
        author: entry.authors.first().map(person_to_author),
        categories: entry.categories.iter().map(|c| c.term.clone()).collect(),
        published_ms,
        updated_ms,
        full_content: None,
    }
}

/// Converts a feed-rs Person to our Author model.
fn person_to_author(person: &Person) -> Author {
    Author {
        name: Some(person.name.clone()),
        email: person.email.clone(),
        uri: person.uri.clone(),
    }
}
