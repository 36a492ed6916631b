// ABOUTME: HTTP transport seam for feeds and article pages, plus the reqwest-backed implementation.
// ABOUTME: Handles SSRF protection, content-length limits, non-2xx rejection and charset decoding.

use std::collections::HashMap;
use std::net::{IpAddr, ToSocketAddrs};

use async_trait::async_trait;
use bytes::Bytes;
use ipnet::{Ipv4Net, Ipv6Net};
use tracing::debug;

use crate::error::FetchError;
use crate::options::{FetchOptions, HttpFetcherBuilder};

/// Maximum allowed content length (10 MB).
pub const MAX_CONTENT_LENGTH: usize = 10 * 1024 * 1024;

/// Result of a successful fetch operation.
#[derive(Debug, Clone)]
pub struct FetchResult {
    pub status: u16,
    pub url: String,
    pub final_url: String,
    pub content_type: Option<String>,
    pub body: Bytes,
}

impl FetchResult {
    /// Builds a 200 response for `url`; used by in-memory fetchers.
    pub fn ok(url: impl Into<String>, body: impl Into<Bytes>) -> Self {
        let url = url.into();
        Self {
            status: 200,
            final_url: url.clone(),
            url,
            content_type: None,
            body: body.into(),
        }
    }

    /// Decode the body as text, using the content-type charset or detection.
    pub fn text(&self) -> String {
        decode_body(&self.body, self.content_type.as_deref())
    }
}

/// Retrieves raw bytes for a URL.
///
/// Implementations fail with [`FetchError`] on network errors, timeouts and
/// non-2xx responses. They own request timeouts.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<FetchResult, FetchError>;
}

/// reqwest-backed [`Fetcher`].
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    opts: FetchOptions,
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Create a new builder for configuring the fetcher.
    pub fn builder() -> HttpFetcherBuilder {
        HttpFetcherBuilder::new()
    }

    /// Create a fetcher with the given options.
    pub fn new(opts: FetchOptions) -> Result<Self, FetchError> {
        let client = match opts.http_client.clone() {
            Some(client) => client,
            None => build_client(&opts)?,
        };
        Ok(Self { opts, client })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchResult, FetchError> {
        fetch(&self.client, url, &self.opts).await
    }
}

fn build_client(opts: &FetchOptions) -> Result<reqwest::Client, FetchError> {
    let allow_private = opts.allow_private_networks;
    let redirect_policy = reqwest::redirect::Policy::custom(move |attempt| {
        if attempt.previous().len() >= 10 {
            return attempt.error("too many redirects");
        }
        if !allow_private {
            let next = attempt.url();
            if let Some(host) = next.host_str() {
                let port = next.port_or_known_default().unwrap_or(80);
                if let Ok(ip) = host.trim_matches(['[', ']']).parse::<IpAddr>() {
                    if is_private_ip(&ip) {
                        return attempt.error("redirect to private IP blocked");
                    }
                } else {
                    // synchronous DNS resolution to avoid async in redirect policy
                    match (host, port).to_socket_addrs() {
                        Ok(addrs) => {
                            for sa in addrs {
                                if is_private_ip(&sa.ip()) {
                                    return attempt.error("redirect to private IP blocked");
                                }
                            }
                        }
                        Err(_) => {
                            return attempt.error("DNS lookup failed during redirect");
                        }
                    }
                }
            }
        }
        attempt.follow()
    });

    reqwest::Client::builder()
        .redirect(redirect_policy)
        .user_agent(&opts.user_agent)
        .timeout(opts.timeout)
        .gzip(true)
        .brotli(true)
        .deflate(true)
        .build()
        .map_err(|e| FetchError::fetch("", "Build", Some(anyhow::Error::new(e))))
}

/// Check if an IP address is in a private/reserved range.
pub(crate) fn is_private_ip(addr: &IpAddr) -> bool {
    match addr {
        IpAddr::V4(ip) => {
            let ranges: [Ipv4Net; 5] = [
                Ipv4Net::new_assert([10, 0, 0, 0].into(), 8),
                Ipv4Net::new_assert([172, 16, 0, 0].into(), 12),
                Ipv4Net::new_assert([192, 168, 0, 0].into(), 16),
                Ipv4Net::new_assert([127, 0, 0, 0].into(), 8),
                Ipv4Net::new_assert([169, 254, 0, 0].into(), 16),
            ];
            ip.is_unspecified() || ranges.iter().any(|net| net.contains(ip))
        }
        IpAddr::V6(ip) => {
            if ip.is_loopback() || ip.is_unspecified() {
                return true;
            }
            if let Some(v4) = ip.to_ipv4_mapped() {
                return is_private_ip(&IpAddr::V4(v4));
            }
            let unique_local = Ipv6Net::new_assert([0xfc00, 0, 0, 0, 0, 0, 0, 0].into(), 7);
            let link_local = Ipv6Net::new_assert([0xfe80, 0, 0, 0, 0, 0, 0, 0].into(), 10);
            unique_local.contains(ip) || link_local.contains(ip)
        }
    }
}

/// Decode body bytes to a String using charset from content-type header or detection.
fn decode_body(body: &[u8], content_type: Option<&str>) -> String {
    if let Some(ct) = content_type {
        if let Some(charset) = extract_charset(ct) {
            if let Some(encoding) = encoding_rs::Encoding::for_label(charset.as_bytes()) {
                let (decoded, _, _) = encoding.decode(body);
                return decoded.into_owned();
            }
        }
    }

    let mut detector = chardetng::EncodingDetector::new();
    detector.feed(body, true);
    let encoding = detector.guess(None, true);
    let (decoded, _, _) = encoding.decode(body);
    decoded.into_owned()
}

/// Extract charset value from Content-Type header.
fn extract_charset(content_type: &str) -> Option<String> {
    let lower = content_type.to_lowercase();
    for part in lower.split(';') {
        let trimmed = part.trim();
        if let Some(charset) = trimmed.strip_prefix("charset=") {
            let charset = charset.trim_matches('"').trim_matches('\'');
            return Some(charset.to_string());
        }
    }
    None
}

/// Rejects hosts that are or resolve to private addresses.
async fn guard_host(url: &url::Url, requested: &str, op: &str) -> Result<(), FetchError> {
    let Some(host) = url.host_str() else {
        return Ok(());
    };

    if let Ok(ip) = host.trim_matches(['[', ']']).parse::<IpAddr>() {
        if is_private_ip(&ip) {
            return Err(FetchError::ssrf(
                requested,
                op,
                Some(anyhow::anyhow!("private IP addresses are not allowed")),
            ));
        }
        return Ok(());
    }

    let port = url.port_or_known_default().unwrap_or(80);
    let addrs = tokio::net::lookup_host((host, port)).await.map_err(|e| {
        FetchError::fetch(
            requested,
            op,
            Some(anyhow::anyhow!("DNS lookup failed: {}", e)),
        )
    })?;

    for socket_addr in addrs {
        if is_private_ip(&socket_addr.ip()) {
            return Err(FetchError::ssrf(
                requested,
                op,
                Some(anyhow::anyhow!("private IP addresses are not allowed")),
            ));
        }
    }
    Ok(())
}

/// Fetch a resource from the given URL.
pub async fn fetch(
    client: &reqwest::Client,
    url: &str,
    opts: &FetchOptions,
) -> Result<FetchResult, FetchError> {
    if url.is_empty() {
        return Err(FetchError::invalid_url(url, "Fetch", None));
    }

    let parsed_url = url::Url::parse(url).map_err(|e| {
        FetchError::invalid_url(url, "Fetch", Some(anyhow::anyhow!("invalid URL: {}", e)))
    })?;

    let scheme = parsed_url.scheme();
    if scheme != "http" && scheme != "https" {
        return Err(FetchError::invalid_url(
            url,
            "Fetch",
            Some(anyhow::anyhow!("scheme must be http or https")),
        ));
    }

    if !opts.allow_private_networks {
        guard_host(&parsed_url, url, "Fetch").await?;
    }

    let mut request = client.get(url);
    for (key, value) in &opts.headers {
        request = request.header(key, value);
    }

    debug!(url, "fetching");
    let response = request.send().await.map_err(|e| {
        if e.is_timeout() {
            FetchError::timeout(url, "Fetch", Some(anyhow::Error::new(e)))
        } else {
            FetchError::fetch(url, "Fetch", Some(anyhow::anyhow!("request failed: {}", e)))
        }
    })?;

    // Redirects may land somewhere the initial check never saw
    if !opts.allow_private_networks {
        guard_host(response.url(), url, "Fetch").await?;
    }

    if let Some(len) = response.content_length() {
        if len as usize > MAX_CONTENT_LENGTH {
            return Err(FetchError::fetch(
                url,
                "Fetch",
                Some(anyhow::anyhow!("content too large")),
            ));
        }
    }

    let status = response.status().as_u16();
    let final_url = response.url().to_string();
    let content_type = response
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_lowercase());

    if !response.status().is_success() {
        return Err(FetchError::fetch(
            url,
            "Fetch",
            Some(anyhow::anyhow!("HTTP status {}", status)),
        ));
    }

    let body = response.bytes().await.map_err(|e| {
        if e.is_timeout() {
            FetchError::timeout(url, "Fetch", Some(anyhow::Error::new(e)))
        } else {
            FetchError::fetch(
                url,
                "Fetch",
                Some(anyhow::anyhow!("failed to read body: {}", e)),
            )
        }
    })?;

    if body.len() > MAX_CONTENT_LENGTH {
        return Err(FetchError::fetch(
            url,
            "Fetch",
            Some(anyhow::anyhow!("content too large")),
        ));
    }

    Ok(FetchResult {
        status,
        url: url.to_string(),
        final_url,
        content_type,
        body,
    })
}

/// In-memory [`Fetcher`] serving canned bodies; unknown URLs fail with a fetch error.
#[derive(Debug, Default, Clone)]
pub struct StaticFetcher {
    pages: HashMap<String, Bytes>,
}

impl StaticFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `body` for `url`.
    pub fn with_page(mut self, url: impl Into<String>, body: impl Into<Bytes>) -> Self {
        self.pages.insert(url.into(), body.into());
        self
    }
}

#[async_trait]
impl Fetcher for StaticFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchResult, FetchError> {
        match self.pages.get(url) {
            Some(body) => Ok(FetchResult::ok(url, body.clone())),
            None => Err(FetchError::fetch(
                url,
                "Fetch",
                Some(anyhow::anyhow!("HTTP status 404")),
            )),
        }
    }
}
