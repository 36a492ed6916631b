// ABOUTME: Configuration schema for source plugins: parameter specs, kinds and validation rules.
// ABOUTME: validate_params applies defaults and checks user parameters against a schema.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Serialize, Serializer};

use crate::error::ConfigError;

/// User parameters for one configured source.
pub type Params = HashMap<String, String>;

/// One entry of a source's configuration schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ParamSpec {
    pub key: &'static str,
    pub title: &'static str,
    #[serde(flatten)]
    pub kind: ParamKind,
    pub default: &'static str,
    pub required: bool,
    pub validation: &'static [Validation],
}

/// Input widget kind of a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ParamKind {
    Text,
    Password,
    Checkbox,
    /// Closed choice; `(key, label)` pairs in display order.
    Select {
        #[serde(serialize_with = "ordered_pairs")]
        values: &'static [(&'static str, &'static str)],
    },
}

fn ordered_pairs<S>(values: &[(&str, &str)], serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.collect_map(values.iter().copied())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Validation {
    Alpha,
    Email,
    Numeric,
    Int,
    Alnum,
    NotEmpty,
}

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap_or_else(|e| panic!("email regex: {e}"))
});

impl Validation {
    /// Returns true when `value` satisfies the rule.
    ///
    /// Only `NotEmpty` rejects an empty value; the other rules apply to
    /// whatever was entered.
    pub fn check(self, value: &str) -> bool {
        if value.is_empty() {
            return self != Validation::NotEmpty;
        }
        match self {
            Validation::Alpha => value.chars().all(char::is_alphabetic),
            Validation::Email => EMAIL_RE.is_match(value),
            Validation::Numeric => value.trim().parse::<f64>().is_ok_and(f64::is_finite),
            Validation::Int => value.trim().parse::<i64>().is_ok(),
            Validation::Alnum => value.chars().all(char::is_alphanumeric),
            Validation::NotEmpty => !value.trim().is_empty(),
        }
    }

    fn describe(self) -> &'static str {
        match self {
            Validation::Alpha => "must contain letters only",
            Validation::Email => "must be an email address",
            Validation::Numeric => "must be a number",
            Validation::Int => "must be an integer",
            Validation::Alnum => "must contain letters and digits only",
            Validation::NotEmpty => "must not be empty",
        }
    }
}

impl ParamSpec {
    /// Select options as `(key, label)` pairs; empty for other kinds.
    pub fn options(&self) -> &'static [(&'static str, &'static str)] {
        match self.kind {
            ParamKind::Select { values } => values,
            _ => &[],
        }
    }
}

const CHECKBOX_VALUES: &[&str] = &["", "0", "1", "true", "false", "on", "off"];

/// Fills in schema defaults for keys the user left out.
pub fn with_defaults(schema: &[ParamSpec], params: &Params) -> Params {
    let mut merged = params.clone();
    for spec in schema {
        if !spec.default.is_empty() {
            merged
                .entry(spec.key.to_string())
                .or_insert_with(|| spec.default.to_string());
        }
    }
    merged
}

/// Checks `params` against `schema` after applying defaults.
///
/// Keys the schema does not mention are passed through untouched. A select
/// value outside its option list reports [`ConfigError::UnknownSection`].
pub fn validate_params(
    source_type: &str,
    schema: &[ParamSpec],
    params: &Params,
) -> Result<Params, ConfigError> {
    let params = with_defaults(schema, params);

    for spec in schema {
        let value = params.get(spec.key).map(String::as_str).unwrap_or("");

        if value.trim().is_empty() {
            if spec.required {
                return Err(ConfigError::missing(source_type, spec.key));
            }
            continue;
        }

        match spec.kind {
            ParamKind::Select { values } => {
                if !values.iter().any(|(key, _)| *key == value) {
                    return Err(ConfigError::UnknownSection {
                        source_type: source_type.to_string(),
                        section: value.to_string(),
                    });
                }
            }
            ParamKind::Checkbox => {
                if !CHECKBOX_VALUES.contains(&value.to_ascii_lowercase().as_str()) {
                    return Err(ConfigError::invalid(
                        source_type,
                        spec.key,
                        "must be a checkbox value",
                    ));
                }
            }
            ParamKind::Text | ParamKind::Password => {}
        }

        if let Some(rule) = spec.validation.iter().find(|rule| !rule.check(value)) {
            return Err(ConfigError::invalid(source_type, spec.key, rule.describe()));
        }
    }

    Ok(params)
}
