// ABOUTME: Maps source type identifiers to plugin factories and builds configured sources.
// ABOUTME: Configuration errors (unknown type, section or parameter) surface here before any fetch.

use std::collections::HashMap;
use std::fmt;

use spouts_feed::FeedItem;

use crate::error::{ConfigError, SourceError};
use crate::params::{validate_params, with_defaults, Params};
use crate::plugins::{feed, heise, GenericFeed, Heise};
use crate::resource::Fetcher;
use crate::source::{FeedItems, Source};

/// Builds a fresh plugin instance.
pub type SourceFactory = fn() -> Box<dyn Source>;

/// Registry for looking up source plugins by type id.
#[derive(Default, Clone)]
pub struct SourceRegistry {
    map: HashMap<String, SourceFactory>,
}

impl fmt::Debug for SourceRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceRegistry")
            .field("types", &self.type_ids())
            .finish()
    }
}

impl SourceRegistry {
    /// Creates a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `factory` under `type_id`, replacing any earlier entry.
    pub fn register(&mut self, type_id: impl Into<String>, factory: SourceFactory) {
        self.map.insert(type_id.into(), factory);
    }

    /// Instantiates the plugin for `type_id` without configuring it.
    pub fn plugin(&self, type_id: &str) -> Result<Box<dyn Source>, ConfigError> {
        self.map
            .get(type_id)
            .map(|factory| factory())
            .ok_or_else(|| ConfigError::UnknownSourceType(type_id.to_string()))
    }

    /// Instantiates and configures the plugin for `type_id`.
    ///
    /// The feed URL is resolved before the schema is checked, so a bad
    /// section key reports [`ConfigError::UnknownSection`].
    pub fn create(&self, type_id: &str, params: &Params) -> Result<ConfiguredSource, ConfigError> {
        let source = self.plugin(type_id)?;
        let feed_url = source.feed_url(&with_defaults(source.params(), params))?;
        let params = validate_params(type_id, source.params(), params)?;

        Ok(ConfiguredSource {
            type_id: type_id.to_string(),
            source,
            params,
            feed_url,
        })
    }

    /// Registered type ids in sorted order.
    pub fn type_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.map.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    /// Returns the number of registered types.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Returns true if no types are registered.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

/// Registry holding every plugin shipped with this crate.
pub fn builtin_registry() -> SourceRegistry {
    let mut registry = SourceRegistry::new();
    registry.register(heise::TYPE_ID, || Box::new(Heise::new()));
    registry.register(feed::TYPE_ID, || Box::new(GenericFeed));
    registry
}

/// A plugin bound to validated parameters and its resolved feed URL.
pub struct ConfiguredSource {
    type_id: String,
    source: Box<dyn Source>,
    params: Params,
    feed_url: String,
}

impl fmt::Debug for ConfiguredSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfiguredSource")
            .field("type_id", &self.type_id)
            .field("params", &self.params)
            .field("feed_url", &self.feed_url)
            .finish()
    }
}

impl ConfiguredSource {
    pub fn type_id(&self) -> &str {
        &self.type_id
    }

    pub fn source(&self) -> &dyn Source {
        self.source.as_ref()
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn feed_url(&self) -> &str {
        &self.feed_url
    }

    pub async fn fetch_items(&self, fetcher: &dyn Fetcher) -> Result<FeedItems, SourceError> {
        self.source.fetch_items(fetcher, &self.params).await
    }

    pub async fn full_content(&self, fetcher: &dyn Fetcher, item: &FeedItem) -> String {
        self.source.full_content(fetcher, item).await
    }
}
