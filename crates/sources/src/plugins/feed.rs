// ABOUTME: Generic feed plugin: any RSS, Atom or JSON Feed addressed by a `url` parameter.
// ABOUTME: Has no content rules, so items keep their feed summary as full content.

use async_trait::async_trait;

use crate::error::ConfigError;
use crate::params::{ParamKind, ParamSpec, Params, Validation};
use crate::source::Source;

pub const TYPE_ID: &str = "feed";

const PARAMS: &[ParamSpec] = &[ParamSpec {
    key: "url",
    title: "URL",
    kind: ParamKind::Text,
    default: "",
    required: true,
    validation: &[Validation::NotEmpty],
}];

#[derive(Debug, Default)]
pub struct GenericFeed;

#[async_trait]
impl Source for GenericFeed {
    fn name(&self) -> &'static str {
        "RSS Feed"
    }

    fn description(&self) -> &'static str {
        "Any RSS, Atom or JSON feed"
    }

    fn params(&self) -> &'static [ParamSpec] {
        PARAMS
    }

    fn feed_url(&self, params: &Params) -> Result<String, ConfigError> {
        let raw = params
            .get("url")
            .map(|u| u.trim())
            .filter(|u| !u.is_empty())
            .ok_or_else(|| ConfigError::missing(TYPE_ID, "url"))?;

        let parsed = url::Url::parse(raw)
            .map_err(|e| ConfigError::invalid(TYPE_ID, "url", e.to_string()))?;
        match parsed.scheme() {
            "http" | "https" => Ok(parsed.to_string()),
            other => Err(ConfigError::invalid(
                TYPE_ID,
                "url",
                format!("unsupported scheme `{other}`"),
            )),
        }
    }
}
