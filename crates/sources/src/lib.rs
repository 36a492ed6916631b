// ABOUTME: Source plugins for full-text feeds: schema, registry, HTTP fetching and ingestion.
// ABOUTME: Composes the feed parser with the rule-based extractor behind the Source trait.

//! Source plugins.
//!
//! A [`Source`] resolves a feed URL from user [`Params`], downloads and
//! parses the feed, and replaces each item's teaser with the article body
//! extracted from its permalink page. Plugins are looked up by type id in a
//! [`SourceRegistry`]; [`builtin_registry`] knows `heise` and `feed`.

pub mod config;
pub mod error;
pub mod ingest;
pub mod options;
pub mod params;
pub mod plugins;
pub mod registry;
pub mod resource;
pub mod source;

pub use crate::config::{SourceEntry, SourcesFile};
pub use crate::error::{ConfigError, ErrorCode, FetchError, SourceError};
pub use crate::ingest::{ingest, ingest_batch, SourceReport, DEFAULT_CONCURRENCY};
pub use crate::options::{FetchOptions, HttpFetcherBuilder};
pub use crate::params::{validate_params, ParamKind, ParamSpec, Params, Validation};
pub use crate::registry::{builtin_registry, ConfiguredSource, SourceFactory, SourceRegistry};
pub use crate::resource::{FetchResult, Fetcher, HttpFetcher, StaticFetcher};
pub use crate::source::{ContentRules, FeedItems, Source};
