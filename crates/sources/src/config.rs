// ABOUTME: TOML sources file listing the configured sources for batch ingestion.
// ABOUTME: Each [[source]] table names a source type plus its string parameters.

use std::path::Path;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::ingest::DEFAULT_CONCURRENCY;
use crate::params::Params;

/// Parsed sources file.
///
/// ```toml
/// concurrency = 4
///
/// [[source]]
/// name = "heise developer"
/// type = "heise"
/// params = { section = "dev" }
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SourcesFile {
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    #[serde(default, rename = "source")]
    pub sources: Vec<SourceEntry>,
}

fn default_concurrency() -> usize {
    DEFAULT_CONCURRENCY
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SourceEntry {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub type_id: String,
    #[serde(default)]
    pub params: Params,
}

impl SourceEntry {
    /// The entry's name, or its type when unnamed.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.type_id)
    }
}

impl SourcesFile {
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let file: SourcesFile =
            toml::from_str(input).map_err(|e| ConfigError::SourcesFile(e.to_string()))?;
        if file.concurrency == 0 {
            return Err(ConfigError::SourcesFile(
                "concurrency must be at least 1".to_string(),
            ));
        }
        Ok(file)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let input = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::SourcesFile(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&input)
    }
}
