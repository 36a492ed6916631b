// ABOUTME: The Source plugin contract: schema, feed URL resolution, item fetching and full content.
// ABOUTME: Default methods compose the fetcher, feed parser and rule-based content extractor.

use async_trait::async_trait;
use spouts_extract::{extract_with_rule, precompile_rules, PatternRule, SanitizerPolicy};
use spouts_feed::{parse_feed_bytes, FeedItem};
use tracing::{debug, warn};

use crate::error::{ConfigError, SourceError};
use crate::params::{ParamSpec, Params};
use crate::resource::Fetcher;

/// Ordered fallback rules plus the policy their matches are sanitized with.
#[derive(Debug)]
pub struct ContentRules {
    pub rules: &'static [PatternRule],
    pub policy: SanitizerPolicy,
}

impl ContentRules {
    /// Bundles `rules` with `policy` and warms the matcher cache for them.
    pub fn new(rules: &'static [PatternRule], policy: SanitizerPolicy) -> Self {
        precompile_rules(rules);
        Self { rules, policy }
    }
}

/// Items of one fetched feed, in feed order. Consumed once.
#[derive(Debug)]
pub struct FeedItems {
    inner: std::vec::IntoIter<FeedItem>,
}

impl FeedItems {
    pub fn new(items: Vec<FeedItem>) -> Self {
        Self {
            inner: items.into_iter(),
        }
    }
}

impl Iterator for FeedItems {
    type Item = FeedItem;

    fn next(&mut self) -> Option<FeedItem> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl ExactSizeIterator for FeedItems {}

/// A kind of feed source.
///
/// Implementations hold no per-item state, so one instance can serve any
/// number of concurrent `full_content` calls.
#[async_trait]
pub trait Source: Send + Sync {
    /// Human readable name.
    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str;

    /// Configuration schema, in display order.
    fn params(&self) -> &'static [ParamSpec];

    /// Resolves the feed URL for `params` without touching the network.
    fn feed_url(&self, params: &Params) -> Result<String, ConfigError>;

    /// Rules for pulling the article body out of permalink pages.
    fn content_rules(&self) -> Option<&ContentRules> {
        None
    }

    /// Downloads and parses the feed for `params`.
    async fn fetch_items(
        &self,
        fetcher: &dyn Fetcher,
        params: &Params,
    ) -> Result<FeedItems, SourceError> {
        let url = self.feed_url(params)?;
        let response = fetcher.fetch(&url).await?;
        let feed = parse_feed_bytes(&response.body, &url)
            .map_err(|source| SourceError::Feed { url, source })?;
        Ok(FeedItems::new(feed.items))
    }

    /// Full article body for `item`, or its summary when none can be extracted.
    ///
    /// Fetch failures are logged and recovered here; they never reach the
    /// caller.
    async fn full_content(&self, fetcher: &dyn Fetcher, item: &FeedItem) -> String {
        let Some(content) = self.content_rules() else {
            return item.summary.clone();
        };

        let page = match fetcher.fetch(&item.url).await {
            Ok(page) => page.text(),
            Err(err) => {
                warn!(source = self.name(), url = %item.url, error = %err, "permalink fetch failed, using summary");
                return item.summary.clone();
            }
        };

        match extract_with_rule(content.rules, &page, &content.policy) {
            Some(found) => {
                debug!(source = self.name(), url = %item.url, rule_index = found.rule_index, "extracted full content");
                found.content
            }
            None => {
                debug!(source = self.name(), url = %item.url, "no content rule matched, using summary");
                item.summary.clone()
            }
        }
    }
}
