// ABOUTME: Error types for source configuration, permalink/feed fetching and ingestion.
// ABOUTME: FetchError carries a categorized ErrorCode; ConfigError covers invalid source setups.

use std::fmt;

use spouts_feed::FeedError;
use thiserror::Error;

/// Error codes representing different categories of fetch failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    InvalidUrl,
    Fetch,
    Timeout,
    Ssrf,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorCode::InvalidUrl => "invalid URL",
            ErrorCode::Fetch => "fetch error",
            ErrorCode::Timeout => "timeout",
            ErrorCode::Ssrf => "SSRF blocked",
        };
        write!(f, "{}", s)
    }
}

/// Failure to retrieve a feed or an article page.
#[derive(Debug, thiserror::Error)]
pub struct FetchError {
    pub code: ErrorCode,
    pub url: String,
    pub op: String,
    #[source]
    pub source: Option<anyhow::Error>,
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "spouts: {} {}: {}", self.op, self.url, self.code)?;
        if let Some(ref src) = self.source {
            write!(f, ": {}", src)?;
        }
        Ok(())
    }
}

impl FetchError {
    fn with_code(
        code: ErrorCode,
        url: impl Into<String>,
        op: impl Into<String>,
        source: Option<anyhow::Error>,
    ) -> Self {
        Self {
            code,
            url: url.into(),
            op: op.into(),
            source,
        }
    }

    /// Create an InvalidUrl error.
    pub fn invalid_url(
        url: impl Into<String>,
        op: impl Into<String>,
        source: Option<anyhow::Error>,
    ) -> Self {
        Self::with_code(ErrorCode::InvalidUrl, url, op, source)
    }

    /// Create a Fetch error.
    pub fn fetch(
        url: impl Into<String>,
        op: impl Into<String>,
        source: Option<anyhow::Error>,
    ) -> Self {
        Self::with_code(ErrorCode::Fetch, url, op, source)
    }

    /// Create a Timeout error.
    pub fn timeout(
        url: impl Into<String>,
        op: impl Into<String>,
        source: Option<anyhow::Error>,
    ) -> Self {
        Self::with_code(ErrorCode::Timeout, url, op, source)
    }

    /// Create an SSRF error.
    pub fn ssrf(
        url: impl Into<String>,
        op: impl Into<String>,
        source: Option<anyhow::Error>,
    ) -> Self {
        Self::with_code(ErrorCode::Ssrf, url, op, source)
    }

    /// Returns true if this is a Timeout error.
    pub fn is_timeout(&self) -> bool {
        self.code == ErrorCode::Timeout
    }

    /// Returns true if this is an SSRF error.
    pub fn is_ssrf(&self) -> bool {
        self.code == ErrorCode::Ssrf
    }

    /// Returns true if this is a Fetch error.
    pub fn is_fetch(&self) -> bool {
        self.code == ErrorCode::Fetch
    }

    /// Returns true if this is an InvalidUrl error.
    pub fn is_invalid_url(&self) -> bool {
        self.code == ErrorCode::InvalidUrl
    }
}

/// A source cannot be set up with the given type or parameters.
///
/// Fatal to one configuration attempt; never retried.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("unknown source type `{0}`")]
    UnknownSourceType(String),

    #[error("unknown section `{section}` for source `{source_type}`")]
    UnknownSection { source_type: String, section: String },

    #[error("missing required parameter `{param}` for source `{source_type}`")]
    MissingParam { source_type: String, param: String },

    #[error("invalid value for parameter `{param}` of source `{source_type}`: {reason}")]
    InvalidParam {
        source_type: String,
        param: String,
        reason: String,
    },

    #[error("invalid sources file: {0}")]
    SourcesFile(String),
}

impl ConfigError {
    pub fn missing(source_type: &str, param: &str) -> Self {
        ConfigError::MissingParam {
            source_type: source_type.to_string(),
            param: param.to_string(),
        }
    }

    pub fn invalid(source_type: &str, param: &str, reason: impl Into<String>) -> Self {
        ConfigError::InvalidParam {
            source_type: source_type.to_string(),
            param: param.to_string(),
            reason: reason.into(),
        }
    }
}

/// Anything that stops a configured source from yielding items.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("feed {url}: {source}")]
    Feed {
        url: String,
        #[source]
        source: FeedError,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fetch_error_display_includes_source() {
        let err = FetchError::timeout(
            "https://example.com/a",
            "Fetch",
            Some(anyhow::anyhow!("30s elapsed")),
        );
        assert!(err.is_timeout());
        assert_eq!(
            err.to_string(),
            "spouts: Fetch https://example.com/a: timeout: 30s elapsed"
        );
    }

    #[test]
    fn unknown_section_message_is_explicit() {
        let err = ConfigError::UnknownSection {
            source_type: "heise".into(),
            section: "nope".into(),
        };
        assert_eq!(err.to_string(), "unknown section `nope` for source `heise`");
    }

    #[test]
    fn source_error_wraps_config() {
        let err: SourceError = ConfigError::UnknownSourceType("x".into()).into();
        assert!(matches!(err, SourceError::Config(_)));
        assert_eq!(err.to_string(), "unknown source type `x`");
    }
}
