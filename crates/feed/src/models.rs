// ABOUTME: Internal Rust models for parsed feed data.
// ABOUTME: FeedItem carries the feed's own fields plus the full article body resolved later.

use serde::{Deserialize, Serialize};

/// Represents an author with optional name, email, and URI.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Author {
    pub name: Option<String>,
    pub email: Option<String>,
    pub uri: Option<String>,
}

/// Represents a single item/entry within a feed.
///
/// Everything except `full_content` is filled in by the parser. `summary` is
/// already sanitized, so it can be handed downstream as-is when no full
/// article body can be extracted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeedItem {
    pub title: String,
    /// Permalink of the article.
    pub url: String,
    pub guid: String,
    pub summary: String,
    pub author: Option<Author>,
    pub categories: Vec<String>,
    pub published_ms: u64,
    pub updated_ms: u64,
    /// Sanitized full article body, or the summary when extraction missed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_content: Option<String>,
}

/// Represents a parsed feed with metadata and items.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Feed {
    pub title: String,
    pub home_url: String,
    pub feed_url: String,
    pub description: String,
    pub language: Option<String>,
    pub updated_ms: u64,
    pub items: Vec<FeedItem>,
}
