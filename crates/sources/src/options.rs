// ABOUTME: Configuration options for the HTTP fetcher and its fluent builder.
// ABOUTME: HttpFetcherBuilder mirrors a client builder: timeout, user agent, private networks, headers.

use std::collections::HashMap;
use std::time::Duration;

use crate::error::FetchError;
use crate::resource::HttpFetcher;

/// Configuration options for [`HttpFetcher`].
#[derive(Debug, Clone)]
pub struct FetchOptions {
    pub timeout: Duration,
    pub user_agent: String,
    pub allow_private_networks: bool,
    pub headers: HashMap<String, String>,
    pub http_client: Option<reqwest::Client>,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            user_agent: concat!("spouts/", env!("CARGO_PKG_VERSION")).to_string(),
            allow_private_networks: false,
            headers: HashMap::new(),
            http_client: None,
        }
    }
}

/// Builder for constructing [`HttpFetcher`] instances with custom configuration.
#[derive(Debug, Clone, Default)]
pub struct HttpFetcherBuilder {
    opts: FetchOptions,
}

impl HttpFetcherBuilder {
    /// Create a new builder with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.opts.timeout = timeout;
        self
    }

    /// Set the User-Agent header.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.opts.user_agent = user_agent.into();
        self
    }

    /// Allow or disallow requests to private networks.
    pub fn allow_private_networks(mut self, allow: bool) -> Self {
        self.opts.allow_private_networks = allow;
        self
    }

    /// Add a custom header to all requests.
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.opts.headers.insert(key.into(), value.into());
        self
    }

    /// Use a preconfigured HTTP client; timeout and user agent are then its own.
    pub fn http_client(mut self, client: reqwest::Client) -> Self {
        self.opts.http_client = Some(client);
        self
    }

    /// Returns the options collected so far.
    pub fn options(&self) -> &FetchOptions {
        &self.opts
    }

    /// Build the fetcher with the configured options.
    pub fn build(self) -> Result<HttpFetcher, FetchError> {
        HttpFetcher::new(self.opts)
    }
}
